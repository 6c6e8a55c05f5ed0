use std::path::PathBuf;

use clap::Parser;

use crate::style::{Palette, Rgb};
use crate::visit::VisitedSets;

/// Allowed flat-map scale range
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomBounds {
    pub min: f64,
    pub max: f64,
}

/// Diagonal stripe pattern, in canvas pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StripeConfig {
    pub tile_size: u32,
    pub spacing: u32,
    pub width: f64,
}

/// Per-region globe altitude: `base + (hash % jitter_modulus) * step`, in sphere radii
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AltitudeConfig {
    pub base: f64,
    pub jitter_modulus: u32,
    pub step: f64,
}

/// Recognized view options
#[derive(Clone, Debug, PartialEq)]
pub struct MapConfig {
    pub zoom: ZoomBounds,
    pub stripes: StripeConfig,
    /// Stripe pattern on the globe, coarser than the flat map's
    pub globe_stripes: StripeConfig,
    pub darken_factor: f64,
    pub altitude: AltitudeConfig,
    /// Region left out of both projections (the polar landmass)
    pub excluded_region: String,
    pub horizontal_padding: f64,
    pub polar_stretch_x: f64,
    pub polar_stretch_y: f64,
    /// Uniform vertical compression applied after the polar stretch
    pub vertical_stretch: f64,
    /// Exponential rate for drag-to-zoom at minimum scale
    pub drag_zoom_rate: f64,
    /// Scale factor per scroll notch
    pub scroll_zoom_step: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom: ZoomBounds { min: 1.0, max: 14.0 },
            stripes: StripeConfig {
                tile_size: 32,
                spacing: 8,
                width: 4.0,
            },
            globe_stripes: StripeConfig {
                tile_size: 64,
                spacing: 16,
                width: 8.0,
            },
            darken_factor: Palette::DEFAULT_DARKEN,
            altitude: AltitudeConfig {
                base: 0.006,
                jitter_modulus: 11,
                step: 0.00002,
            },
            excluded_region: "Antarctica".to_string(),
            horizontal_padding: 10.0,
            polar_stretch_x: 0.5,
            polar_stretch_y: 0.5,
            vertical_stretch: 1.0,
            drag_zoom_rate: 0.01,
            scroll_zoom_step: 1.5,
        }
    }
}

const SAMPLE_VISITED: [&str; 6] = ["Norway", "Sweden", "Denmark", "Germany", "Spain", "Japan"];

/// Command line options
#[derive(Parser, Debug)]
#[command(author, version, about = "Compare visited countries on a flat map and a globe")]
pub struct Args {
    /// GeoJSON FeatureCollection of country polygons
    #[arg(long, default_value = "data/world.json")]
    pub world: PathBuf,

    /// Countries you have visited (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub visited: Option<Vec<String>>,

    /// Countries the first friend has visited
    #[arg(long, value_delimiter = ',')]
    pub friend_one: Option<Vec<String>>,

    /// Countries the second friend has visited
    #[arg(long, value_delimiter = ',')]
    pub friend_two: Option<Vec<String>>,

    /// Start on the globe instead of the flat map
    #[arg(long)]
    pub globe: bool,

    /// Write logs to this file (the terminal is used by the map)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Darkening factor for the selected region
    #[arg(long, default_value_t = Palette::DEFAULT_DARKEN)]
    pub darken: f64,

    /// Maximum flat-map zoom
    #[arg(long, default_value_t = 14.0)]
    pub max_zoom: f64,

    /// Horizontal padding around the flat map, in pixels
    #[arg(long, default_value_t = 10.0)]
    pub padding: f64,

    /// Region excluded from both projections
    #[arg(long, default_value = "Antarctica")]
    pub exclude: String,

    /// Color for your visits
    #[arg(long)]
    pub my_color: Option<Rgb>,

    /// Color for the first friend's visits
    #[arg(long)]
    pub friend_one_color: Option<Rgb>,

    /// Color for the second friend's visits
    #[arg(long)]
    pub friend_two_color: Option<Rgb>,
}

impl Args {
    pub fn map_config(&self) -> MapConfig {
        let defaults = MapConfig::default();
        MapConfig {
            zoom: ZoomBounds {
                min: defaults.zoom.min,
                max: self.max_zoom.max(defaults.zoom.min),
            },
            darken_factor: self.darken,
            horizontal_padding: self.padding.max(0.0),
            excluded_region: self.exclude.clone(),
            ..defaults
        }
    }

    pub fn visited_sets(&self) -> VisitedSets {
        let me = self
            .visited
            .clone()
            .unwrap_or_else(|| SAMPLE_VISITED.iter().map(|s| s.to_string()).collect());
        VisitedSets {
            me,
            friend_one: self.friend_one.clone(),
            friend_two: self.friend_two.clone(),
        }
    }

    /// Apply color overrides to a base palette
    pub fn palette(&self, base: Palette) -> Palette {
        Palette {
            me: self.my_color.unwrap_or(base.me),
            friend_one: self.friend_one_color.unwrap_or(base.friend_one),
            friend_two: self.friend_two_color.unwrap_or(base.friend_two),
            ..base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["visit-map"]).unwrap();
        let config = args.map_config();
        assert_eq!(config, MapConfig::default());
        let sets = args.visited_sets();
        assert_eq!(sets.me.len(), 6);
        assert!(sets.friend_one.is_none());
        assert!(!sets.has_friend_two());
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "visit-map",
            "--visited",
            "Norway,Japan",
            "--friend-one",
            "Japan,Brazil",
            "--max-zoom",
            "0.5",
            "--darken",
            "0.5",
            "--my-color",
            "#000000",
        ])
        .unwrap();
        let sets = args.visited_sets();
        assert_eq!(sets.me, vec!["Norway", "Japan"]);
        assert_eq!(sets.friend_one.as_deref(), Some(&["Japan".to_string(), "Brazil".to_string()][..]));

        let config = args.map_config();
        assert_eq!(config.zoom.max, 1.0);
        assert_eq!(config.darken_factor, 0.5);

        let palette = args.palette(Palette::flat());
        assert_eq!(palette.me, Rgb::new(0, 0, 0));
        assert_eq!(palette.friend_one, Palette::flat().friend_one);
    }

    #[test]
    fn test_bad_color_rejected() {
        assert!(Args::try_parse_from(["visit-map", "--my-color", "blue"]).is_err());
    }
}
