use crate::map::region::{ring_winding, Polygon, Region, Ring, Winding, WindingReport};
use crate::visit::display_name;
use anyhow::{bail, Context, Result};
use geojson::{Feature, GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;

/// Load regions from a GeoJSON file of Polygon/MultiPolygon features
pub fn load_regions(path: &Path) -> Result<Vec<Region>> {
    let mut bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let regions = parse_regions(&mut bytes).with_context(|| format!("parsing {}", path.display()))?;
    tracing::info!(path = %path.display(), regions = regions.len(), "loaded regions");
    Ok(regions)
}

/// Load regions from `path`, falling back to the built-in coarse world when the
/// file is missing, unreadable or holds no usable regions
pub fn load_or_builtin(path: &Path) -> Vec<Region> {
    let regions = match load_regions(path) {
        Ok(regions) if !regions.is_empty() => regions,
        Ok(_) => {
            tracing::warn!(path = %path.display(), "no usable regions in file, using built-in world");
            builtin_world()
        }
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "failed to load regions, using built-in world");
            builtin_world()
        }
    };
    report_windings(&regions);
    regions
}

/// Parse GeoJSON bytes in place (simd-json mutates its input)
pub fn parse_regions(bytes: &mut [u8]) -> Result<Vec<Region>> {
    let geojson: GeoJson = simd_json::serde::from_slice(bytes)?;
    regions_from_geojson(geojson)
}

/// Turn features into regions. Features without a resolvable name or without
/// polygon geometry are dropped.
pub fn regions_from_geojson(geojson: GeoJson) -> Result<Vec<Region>> {
    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => bail!("expected a Feature or FeatureCollection, found a bare geometry"),
    };

    let total = features.len();
    let regions: Vec<Region> = features.iter().filter_map(region_from_feature).collect();
    if regions.len() < total {
        tracing::debug!(dropped = total - regions.len(), "features without name or polygon geometry");
    }
    Ok(regions)
}

fn region_from_feature(feature: &Feature) -> Option<Region> {
    let props = feature.properties.as_ref()?;
    let name = display_name(|key| props.get(key).and_then(|v| v.as_str()))?;
    let mut polygons = Vec::new();
    collect_polygons(feature.geometry.as_ref()?, &mut polygons);
    if polygons.is_empty() {
        return None;
    }
    Region::new(name, polygons)
}

fn collect_polygons(geometry: &Geometry, out: &mut Vec<Polygon>) {
    match &geometry.value {
        Value::Polygon(rings) => out.push(convert_polygon(rings)),
        Value::MultiPolygon(polygons) => out.extend(polygons.iter().map(|p| convert_polygon(p))),
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

fn convert_polygon(rings: &[Vec<Vec<f64>>]) -> Polygon {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .filter(|c| c.len() >= 2)
                .map(|c| (c[0], c[1]))
                .collect()
        })
        .collect()
}

/// Log the outer-ring winding picture. Regions whose winding cannot be
/// determined are still rendered; they only drop out of centroid weighting.
pub fn report_windings(regions: &[Region]) -> WindingReport {
    let report = WindingReport::build(regions);
    for key in &report.indeterminate {
        tracing::warn!(region = %key, "outer ring winding is indeterminate (degenerate or unclosed ring)");
    }
    tracing::debug!(
        clockwise = report.clockwise,
        counter_clockwise = report.counter_clockwise,
        dominant = ?report.dominant(),
        "outer ring windings"
    );
    report
}

/// Close a ring and orient it counter-clockwise
fn outline(points: &[(f64, f64)]) -> Ring {
    let mut ring: Ring = points.to_vec();
    if ring.first() != ring.last() {
        if let Some(&first) = ring.first() {
            ring.push(first);
        }
    }
    if ring_winding(&ring) == Winding::Clockwise {
        ring.reverse();
    }
    ring
}

fn builtin(name: &str, outlines: &[&[(f64, f64)]]) -> Option<Region> {
    let polygons = outlines.iter().map(|o| vec![outline(o)]).collect();
    Region::new(name, polygons)
}

/// Coarse country outlines for when no data file is available
pub fn builtin_world() -> Vec<Region> {
    let shapes: [(&str, &[&[(f64, f64)]]); 20] = [
        ("Canada", &[&[
            (-141.0, 60.0), (-123.0, 49.0), (-95.0, 49.0), (-83.0, 42.0), (-67.0, 45.0),
            (-53.0, 47.0), (-64.0, 60.0), (-80.0, 63.0), (-95.0, 72.0), (-125.0, 72.0),
            (-141.0, 70.0),
        ]]),
        ("United States of America", &[
            &[
                (-124.0, 48.0), (-124.0, 40.0), (-117.0, 32.0), (-110.0, 31.0), (-97.0, 26.0),
                (-82.0, 25.0), (-80.0, 26.0), (-81.0, 31.0), (-75.0, 35.0), (-70.0, 41.0),
                (-67.0, 45.0), (-83.0, 42.0), (-95.0, 49.0), (-123.0, 49.0),
            ],
            &[
                (-168.0, 65.0), (-166.0, 60.0), (-141.0, 60.0), (-141.0, 70.0), (-156.0, 71.0),
            ],
        ]),
        ("Mexico", &[&[
            (-117.0, 32.0), (-110.0, 23.0), (-105.0, 20.0), (-95.0, 16.0), (-92.0, 15.0),
            (-87.0, 21.0), (-90.0, 21.0), (-97.0, 26.0), (-110.0, 31.0),
        ]]),
        ("Brazil", &[&[
            (-73.0, -8.0), (-70.0, -11.0), (-60.0, -13.0), (-58.0, -20.0), (-55.0, -25.0),
            (-53.0, -34.0), (-48.0, -26.0), (-41.0, -22.0), (-39.0, -15.0), (-35.0, -8.0),
            (-35.0, -5.0), (-50.0, 0.0), (-60.0, 5.0), (-70.0, 2.0),
        ]]),
        ("Argentina", &[&[
            (-66.0, -22.0), (-58.0, -27.0), (-58.0, -38.0), (-65.0, -42.0), (-68.0, -52.0),
            (-73.0, -50.0), (-72.0, -40.0), (-70.0, -30.0), (-68.0, -22.0),
        ]]),
        ("Iceland", &[&[
            (-24.0, 64.0), (-14.0, 64.0), (-13.0, 66.0), (-22.0, 66.5),
        ]]),
        ("Norway", &[&[
            (5.0, 58.0), (11.0, 59.0), (12.0, 63.0), (18.0, 68.0), (30.0, 70.0),
            (26.0, 71.0), (15.0, 69.0), (5.0, 62.0),
        ]]),
        ("Sweden", &[&[
            (11.0, 59.0), (13.0, 55.5), (16.0, 56.0), (19.0, 60.0), (24.0, 66.0),
            (20.0, 69.0), (18.0, 68.0), (12.0, 63.0),
        ]]),
        ("Denmark", &[&[
            (8.0, 55.0), (12.5, 55.0), (12.5, 56.0), (10.5, 57.7), (8.0, 57.0),
        ]]),
        ("Germany", &[&[
            (6.0, 51.0), (7.5, 47.6), (13.0, 47.5), (12.0, 50.3), (15.0, 51.0),
            (14.0, 54.0), (9.0, 54.8), (7.0, 53.5),
        ]]),
        ("France", &[&[
            (-4.5, 48.5), (-1.5, 46.0), (-1.5, 43.5), (3.0, 42.5), (7.5, 43.8),
            (7.5, 47.6), (6.0, 51.0), (2.5, 51.0),
        ]]),
        ("Spain", &[&[
            (-9.0, 43.0), (-9.0, 37.0), (-5.5, 36.0), (-2.0, 36.7), (0.5, 38.5),
            (3.0, 42.5), (-1.5, 43.5),
        ]]),
        ("Cabo Verde", &[&[
            (-25.3, 14.8), (-22.7, 14.8), (-22.7, 17.2), (-25.3, 17.2),
        ]]),
        ("Egypt", &[&[
            (25.0, 22.0), (36.9, 22.0), (34.2, 27.8), (32.3, 31.3), (25.0, 31.6),
        ]]),
        ("South Africa", &[&[
            (17.0, -29.0), (20.0, -35.0), (27.0, -34.0), (32.9, -27.0), (31.0, -22.3),
            (25.0, -25.5), (20.0, -25.0), (20.0, -28.5),
        ]]),
        ("India", &[&[
            (68.0, 23.5), (73.0, 17.0), (77.5, 8.0), (80.0, 15.0), (87.0, 21.5),
            (92.0, 22.0), (88.0, 27.5), (80.0, 30.0), (75.0, 32.5), (71.0, 28.0),
        ]]),
        ("China", &[&[
            (74.0, 39.0), (80.0, 30.0), (88.0, 27.5), (98.0, 24.0), (108.0, 21.5),
            (115.0, 22.5), (122.0, 30.0), (122.0, 40.0), (130.0, 43.0), (128.0, 49.0),
            (120.0, 53.0), (116.0, 46.0), (105.0, 41.5), (96.0, 42.5), (87.0, 49.0),
            (80.0, 45.0),
        ]]),
        ("Japan", &[
            &[(130.0, 31.0), (132.0, 33.5), (136.0, 33.5), (140.0, 35.0), (141.5, 40.5), (140.0, 41.5), (139.0, 38.0), (135.0, 35.7), (131.0, 34.4)],
            &[(140.0, 41.8), (145.5, 43.3), (144.0, 44.2), (141.7, 45.5), (140.0, 43.3)],
        ]),
        ("Australia", &[&[
            (115.0, -20.0), (120.0, -18.0), (130.0, -12.0), (140.0, -12.0), (145.0, -15.0),
            (150.0, -25.0), (153.0, -30.0), (150.0, -35.0), (145.0, -38.0), (140.0, -38.0),
            (135.0, -35.0), (130.0, -32.0), (125.0, -32.0), (115.0, -35.0), (115.0, -25.0),
        ]]),
        ("Antarctica", &[&[
            (-180.0, -90.0), (180.0, -90.0), (180.0, -70.0), (90.0, -66.0), (0.0, -70.0),
            (-90.0, -72.0), (-180.0, -70.0),
        ]]),
    ];

    shapes
        .iter()
        .filter_map(|(name, outlines)| builtin(name, outlines))
        .collect()
}
