//! Membership-to-style resolution with a per-view cache.
//!
//! Every (membership, selected) pair maps to one shared [`StyleDescriptor`].
//! Renderers may compare descriptors with [`Rc::ptr_eq`] to skip redundant
//! style application.

mod color;

pub use color::{ParseColorError, Rgb};

use std::rc::Rc;

use crate::visit::{Membership, Visitors};

/// Colors used for fills and strokes
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    pub me: Rgb,
    pub friend_one: Rgb,
    pub friend_two: Rgb,
    pub everyone: Rgb,
    pub unvisited: Rgb,
    pub stroke: Rgb,
    /// Multiplicative per-channel factor for the selected variant
    pub darken_factor: f64,
}

impl Palette {
    pub const DEFAULT_DARKEN: f64 = 0.72;

    /// Palette for the flat map
    pub fn flat() -> Self {
        Self {
            me: Rgb::new(0x25, 0x63, 0xeb),
            friend_one: Rgb::new(0xef, 0x44, 0x44),
            friend_two: Rgb::new(0x10, 0xb9, 0x81),
            everyone: Rgb::new(0x7c, 0x3a, 0xed),
            unvisited: Rgb::new(0xb3, 0xba, 0xc6),
            stroke: Rgb::new(0xe5, 0xe7, 0xeb),
            darken_factor: Self::DEFAULT_DARKEN,
        }
    }

    /// Palette for the globe, with a darker unvisited tone against the water
    pub fn globe() -> Self {
        Self {
            unvisited: Rgb::new(0x9c, 0xa3, 0xaf),
            ..Self::flat()
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::flat()
    }
}

/// How a region's interior is painted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fill {
    Solid(Rgb),
    /// Diagonal two-tone stripes: `stripe` lines over a `base` background
    Stripes { base: Rgb, stripe: Rgb },
}

impl Fill {
    fn map(self, f: impl Fn(Rgb) -> Rgb) -> Self {
        match self {
            Fill::Solid(c) => Fill::Solid(f(c)),
            Fill::Stripes { base, stripe } => Fill::Stripes {
                base: f(base),
                stripe: f(stripe),
            },
        }
    }
}

/// Border weight
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stroke {
    Thin,
    Heavy,
}

/// Renderable style for one (membership, selected) state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleDescriptor {
    pub fill: Fill,
    pub stroke_color: Rgb,
    pub stroke: Stroke,
    pub selected: bool,
}

/// Cache key derived from membership code and selection flag: `code * 2 + selected`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StyleKey(u8);

impl StyleKey {
    pub fn new(membership: Membership, selected: bool) -> Self {
        StyleKey(membership.code() * 2 + selected as u8)
    }

    #[inline(always)]
    fn index(self) -> usize {
        self.0 as usize
    }
}

const SLOTS: usize = 16;

/// Lazily built style descriptors, bounded to 16 entries and never evicted
pub struct StyleCache {
    palette: Palette,
    slots: [Option<Rc<StyleDescriptor>>; SLOTS],
}

impl StyleCache {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            slots: Default::default(),
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Style for a region state; identical inputs return the same `Rc`
    pub fn resolve(&mut self, membership: Membership, selected: bool) -> Rc<StyleDescriptor> {
        let key = StyleKey::new(membership, selected);
        let palette = &self.palette;
        self.slots[key.index()]
            .get_or_insert_with(|| Rc::new(build_style(palette, membership, selected)))
            .clone()
    }

    /// Number of descriptors built so far
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn build_style(palette: &Palette, membership: Membership, selected: bool) -> StyleDescriptor {
    let fill = match membership.visitors() {
        Visitors::Nobody => Fill::Solid(palette.unvisited),
        Visitors::MeOnly => Fill::Solid(palette.me),
        Visitors::FriendOneOnly => Fill::Solid(palette.friend_one),
        Visitors::FriendTwoOnly => Fill::Solid(palette.friend_two),
        Visitors::MeAndFriendOne => Fill::Stripes {
            base: palette.me,
            stripe: palette.friend_one,
        },
        Visitors::MeAndFriendTwo => Fill::Stripes {
            base: palette.me,
            stripe: palette.friend_two,
        },
        Visitors::BothFriends => Fill::Stripes {
            base: palette.friend_one,
            stripe: palette.friend_two,
        },
        Visitors::Everyone => Fill::Solid(palette.everyone),
    };

    if selected {
        let factor = palette.darken_factor;
        StyleDescriptor {
            fill: fill.map(|c| c.darken(factor)),
            stroke_color: palette.stroke,
            stroke: Stroke::Heavy,
            selected,
        }
    } else {
        StyleDescriptor {
            fill,
            stroke_color: palette.stroke,
            stroke: Stroke::Thin,
            selected,
        }
    }
}
