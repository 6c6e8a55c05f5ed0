use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// 8-bit RGB color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseColorError {
    #[error("expected #rrggbb, got {0:?}")]
    Length(String),
    #[error("invalid hex digits in {0:?}")]
    Digits(String),
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Multiply each channel by `factor`, rounding and clamping to [0, 255]
    pub fn darken(self, factor: f64) -> Self {
        let channel = |v: u8| (v as f64 * factor).round().clamp(0.0, 255.0) as u8;
        Self::new(channel(self.r), channel(self.g), channel(self.b))
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().trim_start_matches('#');
        if raw.len() != 6 || !raw.is_ascii() {
            return Err(ParseColorError::Length(s.to_string()));
        }
        let channel = |idx: usize| {
            u8::from_str_radix(&raw[idx..idx + 2], 16).map_err(|_| ParseColorError::Digits(s.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<Rgb> for ratatui::style::Color {
    fn from(c: Rgb) -> Self {
        ratatui::style::Color::Rgb(c.r, c.g, c.b)
    }
}
