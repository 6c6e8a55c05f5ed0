use crate::config::ZoomBounds;
use crate::map::projection::ContentBounds;

/// Scales at or below `min + IDENTITY_EPSILON` collapse to the identity transform
const IDENTITY_EPSILON: f64 = 1e-4;

/// Pan/zoom of the flat map: screen = content * k + (x, y)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform { x: 0.0, y: 0.0, k: 1.0 };

    pub fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    #[inline(always)]
    pub fn apply(&self, (px, py): (f64, f64)) -> (f64, f64) {
        (px * self.k + self.x, py * self.k + self.y)
    }

    #[inline(always)]
    pub fn invert(&self, (sx, sy): (f64, f64)) -> (f64, f64) {
        ((sx - self.x) / self.k, (sy - self.y) / self.k)
    }

    pub fn translate_by(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.k)
    }

    /// Scale by `factor` keeping the screen point `anchor` fixed
    pub fn scale_about(&self, factor: f64, anchor: (f64, f64)) -> Self {
        let k = self.k * factor;
        let (cx, cy) = self.invert(anchor);
        Self::new(anchor.0 - cx * k, anchor.1 - cy * k, k)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Keeps the flat map transform inside the zoom range and the content box
#[derive(Clone, Copy, Debug)]
pub struct ViewportClamp {
    pub zoom: ZoomBounds,
    pub width: f64,
    pub height: f64,
    pub content: ContentBounds,
}

impl ViewportClamp {
    pub fn new(zoom: ZoomBounds, width: f64, height: f64, content: ContentBounds) -> Self {
        Self {
            zoom,
            width,
            height,
            content,
        }
    }

    /// Whether the scale is at its minimum, where drags zoom instead of pan
    pub fn at_min_scale(&self, t: &ViewTransform, tolerance: f64) -> bool {
        t.k <= self.zoom.min + tolerance
    }

    /// Clamp a proposed transform. Closed-form, no search; never fails.
    /// A zero-sized viewport returns the proposal unchanged.
    pub fn clamp(&self, proposed: ViewTransform) -> ViewTransform {
        if self.width <= 0.0 || self.height <= 0.0 {
            return proposed;
        }

        let k = proposed.k.clamp(self.zoom.min, self.zoom.max.max(self.zoom.min));
        if k <= self.zoom.min + IDENTITY_EPSILON {
            return ViewTransform::IDENTITY;
        }

        let c = &self.content;
        let x = clamp_axis(proposed.x, self.width - k * c.right, -k * c.left);
        let y = clamp_axis(proposed.y, self.height - k * c.bottom, -k * c.top);
        ViewTransform::new(x, y, k)
    }
}

/// Clamp into [min, max]; an empty range means the content is smaller than
/// the viewport on this axis, so center it
#[inline(always)]
fn clamp_axis(value: f64, min: f64, max: f64) -> f64 {
    if min > max {
        return (min + max) / 2.0;
    }
    value.clamp(min, max)
}
