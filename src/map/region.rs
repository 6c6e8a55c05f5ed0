use crate::visit::{normalize, RegionKey};

/// A closed ring of (lon, lat) coordinates
pub type Ring = Vec<(f64, f64)>;

/// Outer ring first, holes after
pub type Polygon = Vec<Ring>;

/// Rotational order of a ring in lon/lat space
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
    /// Malformed or degenerate ring (too short, open, or zero area)
    Indeterminate,
}

/// Lon/lat bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    const EMPTY: GeoBounds = GeoBounds {
        min_lon: f64::INFINITY,
        min_lat: f64::INFINITY,
        max_lon: f64::NEG_INFINITY,
        max_lat: f64::NEG_INFINITY,
    };

    fn of<'a>(points: impl Iterator<Item = &'a (f64, f64)>) -> Self {
        points.fold(Self::EMPTY, |b, &(lon, lat)| GeoBounds {
            min_lon: b.min_lon.min(lon),
            min_lat: b.min_lat.min(lat),
            max_lon: b.max_lon.max(lon),
            max_lat: b.max_lat.max(lat),
        })
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    pub fn is_empty(&self) -> bool {
        self.min_lon > self.max_lon || self.min_lat > self.max_lat
    }

    pub fn center(&self) -> (f64, f64) {
        if self.is_empty() {
            return (0.0, 0.0);
        }
        ((self.min_lon + self.max_lon) / 2.0, (self.min_lat + self.max_lat) / 2.0)
    }
}

/// A named country with its geometry. Immutable once loaded.
#[derive(Clone, Debug)]
pub struct Region {
    pub key: RegionKey,
    /// Display name as found in the source data
    pub name: String,
    pub polygons: Vec<Polygon>,
    pub bounds: GeoBounds,
}

impl Region {
    /// Build a region; `None` when the name normalizes to nothing
    pub fn new(name: &str, polygons: Vec<Polygon>) -> Option<Self> {
        let key = normalize(name);
        if key.is_empty() {
            return None;
        }
        let bounds = GeoBounds::of(polygons.iter().flatten().flatten());
        Some(Self {
            key,
            name: name.trim().to_string(),
            polygons,
            bounds,
        })
    }

    /// All rings of all polygons
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        self.polygons.iter().flatten()
    }

    /// Winding of each polygon's outer ring
    pub fn outer_windings(&self) -> impl Iterator<Item = Winding> + '_ {
        self.polygons
            .iter()
            .map(|p| p.first().map(|r| ring_winding(r)).unwrap_or(Winding::Indeterminate))
    }

    /// Even-odd containment over every ring, so holes are excluded
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        if !self.bounds.contains(lon, lat) {
            return false;
        }
        self.polygons
            .iter()
            .any(|polygon| polygon.iter().filter(|ring| ring_crosses(ring, lon, lat)).count() % 2 == 1)
    }

    /// Area-weighted centroid of the outer rings. Rings with no usable area
    /// are skipped; falls back to the bounding box center.
    pub fn centroid(&self) -> (f64, f64) {
        let mut weight = 0.0;
        let mut sum = (0.0, 0.0);
        for ring in self.polygons.iter().filter_map(|p| p.first()) {
            if let Some((cx, cy, area)) = ring_centroid(ring) {
                let w = area.abs();
                sum.0 += cx * w;
                sum.1 += cy * w;
                weight += w;
            }
        }
        if weight > 0.0 {
            (sum.0 / weight, sum.1 / weight)
        } else {
            self.bounds.center()
        }
    }

    #[cfg(test)]
    pub(crate) fn square(name: &str, lon: f64, lat: f64, size: f64) -> Self {
        let ring = vec![
            (lon, lat),
            (lon + size, lat),
            (lon + size, lat + size),
            (lon, lat + size),
            (lon, lat),
        ];
        Self::new(name, vec![vec![ring]]).expect("test region name")
    }
}

/// Shoelace signed area. Rings with fewer than 4 points or that are not
/// closed count as zero.
pub fn signed_ring_area(ring: &[(f64, f64)]) -> f64 {
    if ring.len() < 4 || ring.first() != ring.last() {
        return 0.0;
    }
    ring.windows(2)
        .map(|w| w[0].0 * w[1].1 - w[1].0 * w[0].1)
        .sum::<f64>()
        / 2.0
}

pub fn ring_winding(ring: &[(f64, f64)]) -> Winding {
    let area = signed_ring_area(ring);
    if area > 0.0 {
        Winding::CounterClockwise
    } else if area < 0.0 {
        Winding::Clockwise
    } else {
        Winding::Indeterminate
    }
}

/// Centroid and signed area of a closed ring, `None` when the area is zero
fn ring_centroid(ring: &[(f64, f64)]) -> Option<(f64, f64, f64)> {
    let area = signed_ring_area(ring);
    if area == 0.0 {
        return None;
    }
    let (mut cx, mut cy) = (0.0, 0.0);
    for w in ring.windows(2) {
        let cross = w[0].0 * w[1].1 - w[1].0 * w[0].1;
        cx += (w[0].0 + w[1].0) * cross;
        cy += (w[0].1 + w[1].1) * cross;
    }
    Some((cx / (6.0 * area), cy / (6.0 * area), area))
}

/// Ray-cast crossing test for one ring (odd = inside)
pub(crate) fn ring_crosses(ring: &[(f64, f64)], x: f64, y: f64) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Outer-ring winding tally across a region collection
#[derive(Clone, Debug, Default)]
pub struct WindingReport {
    pub clockwise: usize,
    pub counter_clockwise: usize,
    /// Regions with at least one outer ring whose sign cannot be determined
    pub indeterminate: Vec<RegionKey>,
}

impl WindingReport {
    pub fn build(regions: &[Region]) -> Self {
        let mut report = Self::default();
        for region in regions {
            let mut flagged = false;
            for winding in region.outer_windings() {
                match winding {
                    Winding::Clockwise => report.clockwise += 1,
                    Winding::CounterClockwise => report.counter_clockwise += 1,
                    Winding::Indeterminate => flagged = true,
                }
            }
            if flagged {
                report.indeterminate.push(region.key.clone());
            }
        }
        report
    }

    /// Majority outer winding; ties go to clockwise, `None` with no usable rings
    pub fn dominant(&self) -> Option<Winding> {
        match (self.clockwise, self.counter_clockwise) {
            (0, 0) => None,
            (cw, ccw) if cw >= ccw => Some(Winding::Clockwise),
            _ => Some(Winding::CounterClockwise),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ccw_square() -> Ring {
        vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0), (0.0, 0.0)]
    }

    #[test]
    fn test_signed_area_and_winding() {
        let ring = ccw_square();
        assert_relative_eq!(signed_ring_area(&ring), 4.0);
        assert_eq!(ring_winding(&ring), Winding::CounterClockwise);

        let reversed: Ring = ring.iter().rev().copied().collect();
        assert_relative_eq!(signed_ring_area(&reversed), -4.0);
        assert_eq!(ring_winding(&reversed), Winding::Clockwise);
    }

    #[test]
    fn test_malformed_rings_have_zero_area() {
        let short = vec![(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)];
        assert_eq!(signed_ring_area(&short), 0.0);

        let open = vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)];
        assert_eq!(signed_ring_area(&open), 0.0);
        assert_eq!(ring_winding(&open), Winding::Indeterminate);
    }

    #[test]
    fn test_contains_respects_holes() {
        let outer = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)];
        let hole = vec![(4.0, 4.0), (4.0, 6.0), (6.0, 6.0), (6.0, 4.0), (4.0, 4.0)];
        let region = Region::new("Donut", vec![vec![outer, hole]]).unwrap();
        assert!(region.contains(2.0, 2.0));
        assert!(!region.contains(5.0, 5.0));
        assert!(!region.contains(11.0, 5.0));
    }

    #[test]
    fn test_unresolvable_name() {
        assert!(Region::new("   ", vec![vec![ccw_square()]]).is_none());
    }

    #[test]
    fn test_centroid_skips_degenerate_rings() {
        let degenerate = vec![(50.0, 50.0), (51.0, 50.0), (50.0, 50.0)];
        let region = Region::new("Mixed", vec![vec![ccw_square()], vec![degenerate]]).unwrap();
        let (cx, cy) = region.centroid();
        assert_relative_eq!(cx, 1.0);
        assert_relative_eq!(cy, 1.0);

        let only_bad = Region::new("Bad", vec![vec![vec![(4.0, 4.0), (6.0, 8.0)]]]).unwrap();
        assert_eq!(only_bad.centroid(), (5.0, 6.0));
    }

    #[test]
    fn test_winding_report() {
        let cw: Ring = ccw_square().into_iter().rev().collect();
        let regions = vec![
            Region::new("A", vec![vec![cw.clone()]]).unwrap(),
            Region::new("B", vec![vec![cw]]).unwrap(),
            Region::new("C", vec![vec![ccw_square()]]).unwrap(),
            Region::new("D", vec![vec![vec![(0.0, 0.0), (1.0, 1.0)]]]).unwrap(),
        ];
        let report = WindingReport::build(&regions);
        assert_eq!(report.clockwise, 2);
        assert_eq!(report.counter_clockwise, 1);
        assert_eq!(report.indeterminate, vec![normalize("D")]);
        assert_eq!(report.dominant(), Some(Winding::Clockwise));
        assert_eq!(WindingReport::default().dominant(), None);
    }
}
