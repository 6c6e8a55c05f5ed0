use crate::config::MapConfig;
use crate::map::region::{ring_crosses, Region};
use crate::map::spatial::FeatureGrid;
use crate::visit::normalize;

/// Hit-test grid cell size in pixels
const HIT_CELL_PX: f64 = 16.0;

/// Axis-aligned rectangle in viewport pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContentBounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl ContentBounds {
    const EMPTY: ContentBounds = ContentBounds {
        left: f64::INFINITY,
        top: f64::INFINITY,
        right: f64::NEG_INFINITY,
        bottom: f64::NEG_INFINITY,
    };

    fn include(&mut self, (x, y): (f64, f64)) {
        self.left = self.left.min(x);
        self.top = self.top.min(y);
        self.right = self.right.max(x);
        self.bottom = self.bottom.max(y);
    }

    fn is_valid(&self) -> bool {
        self.left.is_finite() && self.right.is_finite() && self.top.is_finite() && self.bottom.is_finite()
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Unit square centered in a viewport, used when there is nothing to fit
    fn unit(width: f64, height: f64) -> Self {
        let left = (width - 1.0) / 2.0;
        let top = (height - 1.0) / 2.0;
        ContentBounds {
            left,
            top,
            right: left + 1.0,
            bottom: top + 1.0,
        }
    }
}

/// Natural Earth I projection of degrees to unit plane coordinates, y down
#[inline(always)]
pub fn natural_earth(lon: f64, lat: f64) -> (f64, f64) {
    let lambda = lon.to_radians();
    let phi = lat.clamp(-90.0, 90.0).to_radians();
    let phi2 = phi * phi;
    let phi4 = phi2 * phi2;
    let x = lambda
        * (0.8707 - 0.131979 * phi2 + phi4 * (-0.013791 + phi4 * (0.003971 * phi2 - 0.001529 * phi4)));
    let y = phi * (1.007226 + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4)));
    (x, -y)
}

/// Latitude-dependent scale factors `(1 + kx·n², 1 + ky·n²)` with n = min(1, |lat|/90)
#[inline(always)]
pub fn polar_stretch(lat: f64, kx: f64, ky: f64) -> (f64, f64) {
    let n = (lat.abs() / 90.0).min(1.0);
    let n2 = n * n;
    (1.0 + kx * n2, 1.0 + ky * n2)
}

/// One region's geometry in content pixels (viewport space at scale 1)
#[derive(Clone, Debug)]
pub struct RegionPath {
    /// Index into the region collection the layout was built from
    pub region: usize,
    /// Polygons, each outer ring then holes
    pub polygons: Vec<Vec<Vec<(f64, f64)>>>,
    pub bounds: ContentBounds,
}

impl RegionPath {
    pub fn rings(&self) -> impl Iterator<Item = &Vec<(f64, f64)>> {
        self.polygons.iter().flatten()
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        if x < self.bounds.left || x > self.bounds.right || y < self.bounds.top || y > self.bounds.bottom {
            return false;
        }
        self.polygons
            .iter()
            .any(|polygon| polygon.iter().filter(|ring| ring_crosses(ring, x, y)).count() % 2 == 1)
    }
}

/// Flat-map placement of every visible region for one viewport size
pub struct FlatLayout {
    pub width: f64,
    pub height: f64,
    pub paths: Vec<RegionPath>,
    /// Content rectangle at scale 1, consumed by the viewport clamp
    pub bounds: ContentBounds,
    grid: FeatureGrid,
}

impl FlatLayout {
    /// Project, polar-stretch and fit all regions except the excluded one into
    /// a `width` x `height` viewport. Recompute on every resize.
    pub fn build(regions: &[Region], config: &MapConfig, width: f64, height: f64) -> Self {
        let excluded = normalize(&config.excluded_region);
        let pad = config.horizontal_padding;
        let extent_w = (width - pad).max(pad + 1.0) - pad;
        let extent_h = height.max(1.0);

        // Raw projection, keeping latitude for the stretch
        let raw: Vec<(usize, Vec<Vec<Vec<(f64, f64, f64)>>>)> = regions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.key != excluded)
            .map(|(idx, r)| {
                let polygons = r
                    .polygons
                    .iter()
                    .map(|p| {
                        p.iter()
                            .map(|ring| {
                                ring.iter()
                                    .map(|&(lon, lat)| {
                                        let (x, y) = natural_earth(lon, lat);
                                        (x, y, lat)
                                    })
                                    .collect()
                            })
                            .collect()
                    })
                    .collect();
                (idx, polygons)
            })
            .collect();

        let mut raw_bounds = ContentBounds::EMPTY;
        for point in raw.iter().flat_map(|(_, p)| p.iter().flatten().flatten()) {
            raw_bounds.include((point.0, point.1));
        }
        if !raw_bounds.is_valid() {
            tracing::debug!(width, height, "flat layout has no geometry, using unit content");
            return Self::empty(width, height);
        }

        // Fit the unstretched projection into the padded extent
        let k = fit_scale(raw_bounds.width(), raw_bounds.height(), extent_w, extent_h);
        let tx = pad + (extent_w - k * raw_bounds.width()) / 2.0 - k * raw_bounds.left;
        let ty = (extent_h - k * raw_bounds.height()) / 2.0 - k * raw_bounds.top;
        let (cx, cy) = (width / 2.0, height / 2.0);

        // Polar stretch about the viewport center
        let stretched: Vec<(usize, Vec<Vec<Vec<(f64, f64)>>>)> = raw
            .into_iter()
            .map(|(idx, polygons)| {
                let polygons = polygons
                    .into_iter()
                    .map(|p| {
                        p.into_iter()
                            .map(|ring| {
                                ring.into_iter()
                                    .map(|(x, y, lat)| {
                                        let (sx, sy) =
                                            polar_stretch(lat, config.polar_stretch_x, config.polar_stretch_y);
                                        let px = tx + k * x;
                                        let py = ty + k * y;
                                        (cx + (px - cx) * sx, cy + (py - cy) * sy)
                                    })
                                    .collect()
                            })
                            .collect()
                    })
                    .collect();
                (idx, polygons)
            })
            .collect();

        let mut stretched_bounds = ContentBounds::EMPTY;
        for &point in stretched.iter().flat_map(|(_, p)| p.iter().flatten().flatten()) {
            stretched_bounds.include(point);
        }

        // Re-fit so the stretched content stays fully visible, then compress vertically
        let vs = config.vertical_stretch.max(f64::EPSILON);
        let base_w = stretched_bounds.width().max(1.0);
        let base_h = stretched_bounds.height().max(1.0);
        let s = fit_scale(base_w, base_h * vs, extent_w, extent_h);
        let left = pad + (extent_w - s * base_w) / 2.0;
        let top = (extent_h - s * base_h * vs) / 2.0;
        let place = |(x, y): (f64, f64)| {
            (
                left + s * (x - stretched_bounds.left),
                top + s * vs * (y - stretched_bounds.top),
            )
        };

        let mut bounds = ContentBounds::EMPTY;
        let paths: Vec<RegionPath> = stretched
            .into_iter()
            .map(|(region, polygons)| {
                let mut path_bounds = ContentBounds::EMPTY;
                let polygons: Vec<Vec<Vec<(f64, f64)>>> = polygons
                    .into_iter()
                    .map(|p| {
                        p.into_iter()
                            .map(|ring| {
                                ring.into_iter()
                                    .map(|pt| {
                                        let placed = place(pt);
                                        path_bounds.include(placed);
                                        placed
                                    })
                                    .collect()
                            })
                            .collect()
                    })
                    .collect();
                if path_bounds.is_valid() {
                    bounds.include((path_bounds.left, path_bounds.top));
                    bounds.include((path_bounds.right, path_bounds.bottom));
                }
                RegionPath {
                    region,
                    polygons,
                    bounds: path_bounds,
                }
            })
            .collect();

        let grid = FeatureGrid::build(
            paths
                .iter()
                .map(|p| (p.bounds.left, p.bounds.top, p.bounds.right, p.bounds.bottom)),
            HIT_CELL_PX,
        );

        tracing::debug!(
            width,
            height,
            regions = paths.len(),
            left = bounds.left,
            top = bounds.top,
            right = bounds.right,
            bottom = bounds.bottom,
            "flat layout rebuilt"
        );

        Self {
            width,
            height,
            paths,
            bounds,
            grid,
        }
    }

    fn empty(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            paths: Vec::new(),
            bounds: ContentBounds::unit(width, height),
            grid: FeatureGrid::new(HIT_CELL_PX),
        }
    }

    /// Region under a point in content coordinates
    pub fn hit_test(&self, x: f64, y: f64) -> Option<usize> {
        let mut candidates = Vec::new();
        self.grid.query_into(x, y, x, y, &mut candidates);
        candidates.sort_unstable();
        candidates.dedup();
        // Later paths paint on top, so prefer them
        candidates
            .into_iter()
            .rev()
            .filter_map(|idx| self.paths.get(idx))
            .find(|path| path.contains(x, y))
            .map(|path| path.region)
    }
}

/// Largest scale fitting a `w` x `h` box into `avail_w` x `avail_h`
fn fit_scale(w: f64, h: f64, avail_w: f64, avail_h: f64) -> f64 {
    let sx = if w > 0.0 { avail_w / w } else { f64::INFINITY };
    let sy = if h > 0.0 { avail_h / h } else { f64::INFINITY };
    let k = sx.min(sy);
    if k.is_finite() {
        k
    } else {
        1.0
    }
}
