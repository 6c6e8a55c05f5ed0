use std::rc::Rc;

use crate::braille::PixelCanvas;
use crate::config::StripeConfig;
use crate::map::clamp::ViewTransform;
use crate::map::geometry::{fill_circle, fill_rings, stroke_rings};
use crate::map::globe::{DepthSorter, DrawKind, GlobeCamera, GlobePatch};
use crate::map::projection::FlatLayout;
use crate::style::{Rgb, Stroke, StyleDescriptor};

/// Ocean disk behind the globe
pub const WATER: Rgb = Rgb::new(0xd1, 0xd5, 0xdb);

/// Region rings projected to canvas pixels, ready to fill and stroke
struct Projected {
    region: usize,
    rings: Vec<Vec<(f64, f64)>>,
}

/// Paints styled regions onto a pixel canvas in flat or globe mode.
/// `styles` is indexed by region, parallel to the region collection.
pub struct MapRenderer {
    pub stripes: StripeConfig,
    pub globe_stripes: StripeConfig,
    pub water: Rgb,
    projected: Vec<Projected>,
}

impl MapRenderer {
    pub fn new(stripes: StripeConfig, globe_stripes: StripeConfig) -> Self {
        Self {
            stripes,
            globe_stripes,
            water: WATER,
            projected: Vec::new(),
        }
    }

    /// Draw the flat layout under a pan/zoom transform.
    /// Fills first, then borders, with the selected border last so it sits on top.
    pub fn render_flat(
        &mut self,
        canvas: &mut PixelCanvas,
        layout: &FlatLayout,
        transform: &ViewTransform,
        styles: &[Rc<StyleDescriptor>],
    ) {
        let w = canvas.pixel_width() as f64;
        let h = canvas.pixel_height() as f64;
        self.projected.clear();

        for path in &layout.paths {
            let (left, top) = transform.apply((path.bounds.left, path.bounds.top));
            let (right, bottom) = transform.apply((path.bounds.right, path.bounds.bottom));
            if right < 0.0 || bottom < 0.0 || left > w || top > h {
                continue;
            }
            let rings = path
                .rings()
                .map(|ring| ring.iter().map(|&p| transform.apply(p)).collect())
                .collect();
            self.projected.push(Projected {
                region: path.region,
                rings,
            });
        }

        for item in &self.projected {
            if let Some(style) = styles.get(item.region) {
                fill_rings(canvas, &item.rings, style.fill, &self.stripes);
            }
        }
        self.stroke_all(canvas, styles);
    }

    /// Draw the globe: water disk, then patches back-to-front
    pub fn render_globe(
        &mut self,
        canvas: &mut PixelCanvas,
        patches: &[GlobePatch],
        camera: &GlobeCamera,
        sorter: &mut DepthSorter,
        styles: &[Rc<StyleDescriptor>],
    ) {
        let (cx, cy) = camera.screen_center();
        fill_circle(canvas, cx, cy, camera.screen_radius(), self.water);

        sorter.sort(patches, camera);
        self.projected.clear();
        for &idx in sorter.order() {
            let Some(patch) = patches.get(idx) else {
                continue;
            };
            if let Some(rings) = project_patch(patch, camera) {
                self.projected.push(Projected {
                    region: patch.region,
                    rings,
                });
            }
        }

        let two_pass = sorter.render_order(DrawKind::Fill) < sorter.render_order(DrawKind::Stroke);
        if two_pass {
            for item in &self.projected {
                if let Some(style) = styles.get(item.region) {
                    fill_rings(canvas, &item.rings, style.fill, &self.globe_stripes);
                }
            }
            self.stroke_all(canvas, styles);
        } else {
            for item in &self.projected {
                if let Some(style) = styles.get(item.region) {
                    fill_rings(canvas, &item.rings, style.fill, &self.globe_stripes);
                    stroke_rings(canvas, &item.rings, style.stroke_color, style.stroke == Stroke::Heavy);
                }
            }
        }
    }

    fn stroke_all(&self, canvas: &mut PixelCanvas, styles: &[Rc<StyleDescriptor>]) {
        let mut selected: Vec<&Projected> = Vec::new();
        for item in &self.projected {
            let Some(style) = styles.get(item.region) else {
                continue;
            };
            if style.stroke == Stroke::Heavy {
                selected.push(item);
            } else {
                stroke_rings(canvas, &item.rings, style.stroke_color, false);
            }
        }
        for item in selected {
            if let Some(style) = styles.get(item.region) {
                stroke_rings(canvas, &item.rings, style.stroke_color, true);
            }
        }
    }
}

/// Project a patch to screen pixels, pulling hidden points onto the limb.
/// `None` when no point of the patch faces the camera.
fn project_patch(patch: &GlobePatch, camera: &GlobeCamera) -> Option<Vec<Vec<(f64, f64)>>> {
    let mut any_visible = false;
    let mut rings = Vec::with_capacity(patch.rings.len());
    for ring in &patch.rings {
        let mut out = Vec::with_capacity(ring.len());
        for &p in ring {
            let point = if camera.is_front_facing(p) {
                any_visible = true;
                p
            } else {
                match camera.clamp_to_limb(p) {
                    Some(limb) => limb,
                    None => continue,
                }
            };
            if let Some(screen) = camera.project(point) {
                out.push(screen);
            }
        }
        if out.len() >= 2 {
            rings.push(out);
        }
    }
    (any_visible && !rings.is_empty()).then_some(rings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::map::geometry::fill_color_at;
    use crate::map::globe::build_patches;
    use crate::map::region::Region;
    use crate::style::{Palette, StyleCache};
    use crate::visit::Membership;

    fn renderer() -> MapRenderer {
        let config = MapConfig::default();
        MapRenderer::new(config.stripes, config.globe_stripes)
    }

    fn styles(n: usize, selected: Option<usize>) -> Vec<Rc<StyleDescriptor>> {
        let mut cache = StyleCache::new(Palette::flat());
        (0..n)
            .map(|i| cache.resolve(Membership::from_code(1), selected == Some(i)))
            .collect()
    }

    #[test]
    fn test_flat_render_paints_region_color() {
        let regions = vec![Region::square("Brazil", -60.0, -20.0, 40.0)];
        let layout = FlatLayout::build(&regions, &MapConfig::default(), 120.0, 80.0);
        let mut canvas = PixelCanvas::new(60, 20);
        let mut renderer = renderer();
        renderer.render_flat(&mut canvas, &layout, &ViewTransform::IDENTITY, &styles(1, None));
        assert_eq!(canvas.get_pixel(60, 40), Some(Palette::flat().me));
    }

    #[test]
    fn test_flat_render_offscreen_path_skipped() {
        let regions = vec![Region::square("Brazil", -60.0, -20.0, 40.0)];
        let layout = FlatLayout::build(&regions, &MapConfig::default(), 120.0, 80.0);
        let mut canvas = PixelCanvas::new(60, 20);
        let mut renderer = renderer();
        let far = ViewTransform::new(-10_000.0, 0.0, 2.0);
        renderer.render_flat(&mut canvas, &layout, &far, &styles(1, None));
        assert!(canvas.cells().next().is_none());
    }

    #[test]
    fn test_globe_render_draws_water_and_front_patch() {
        let regions = vec![Region::square("Front", -10.0, -10.0, 20.0), Region::square("Back", 170.0, 0.0, 5.0)];
        let patches = build_patches(&regions, &MapConfig::default());
        let camera = GlobeCamera::new(0.0, 0.0, 2.0, 200, 200);
        let mut canvas = PixelCanvas::new(100, 50);
        let mut sorter = DepthSorter::new();
        let mut renderer = renderer();
        renderer.render_globe(&mut canvas, &patches, &camera, &mut sorter, &styles(2, Some(0)));
        assert_eq!(renderer.projected.len(), 1);
        assert_eq!(renderer.projected[0].region, 0);
        // Center of the disk is land, edge of the disk is water
        assert_ne!(canvas.get_pixel(100, 100), Some(WATER));
        let r = camera.screen_radius();
        assert_eq!(canvas.get_pixel((100.0 + r - 2.0) as usize, 100), Some(WATER));
    }

    #[test]
    fn test_globe_uses_coarser_stripes() {
        let regions = vec![Region::square("Front", -10.0, -10.0, 20.0)];
        let patches = build_patches(&regions, &MapConfig::default());
        let camera = GlobeCamera::new(0.0, 0.0, 2.0, 200, 200);
        let mut canvas = PixelCanvas::new(100, 50);
        let mut sorter = DepthSorter::new();
        let shared = StyleCache::new(Palette::flat()).resolve(Membership::from_code(3), false);
        let mut renderer = renderer();
        renderer.render_globe(&mut canvas, &patches, &camera, &mut sorter, &[shared.clone()]);

        let palette = Palette::flat();
        // On the globe stripe but between flat stripes
        assert_eq!(fill_color_at(shared.fill, &renderer.globe_stripes, 100, 104), palette.friend_one);
        assert_eq!(fill_color_at(shared.fill, &renderer.stripes, 100, 104), palette.me);
        assert_eq!(canvas.get_pixel(100, 104), Some(palette.friend_one));
    }
}
