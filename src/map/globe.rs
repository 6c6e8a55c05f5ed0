use glam::DVec3;

use crate::config::{AltitudeConfig, MapConfig};
use crate::hash::name_hash;
use crate::map::region::Region;
use crate::visit::normalize;

/// Sphere radius in world units
pub const GLOBE_RADIUS: f64 = 100.0;

/// Perspective camera orbiting the globe center.
/// Orientation is kept as an orthonormal basis (forward, right, up).
#[derive(Clone, Debug)]
pub struct GlobeCamera {
    /// Direction from the globe center towards the camera
    forward: DVec3,
    /// Right direction
    right: DVec3,
    /// Up direction
    up: DVec3,
    /// Camera distance from the globe center
    pub distance: f64,
    pub near: f64,
    pub far: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    /// Vertical field of view in radians
    pub fov_y: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl GlobeCamera {
    /// Camera looking at (lon, lat) from `altitude` globe radii above the surface.
    pub fn new(center_lon: f64, center_lat: f64, altitude: f64, width: usize, height: usize) -> Self {
        let forward = lonlat_to_vec3(center_lon, center_lat);
        let lat_rad = center_lat.to_radians();
        let lon_rad = center_lon.to_radians();

        // Up = derivative of forward w.r.t. latitude (points north on sphere)
        let raw_up = DVec3::new(
            -lat_rad.sin() * lon_rad.cos(),
            -lat_rad.sin() * lon_rad.sin(),
            lat_rad.cos(),
        );

        // Right = up × forward (points east)
        let right = raw_up.cross(forward).normalize();
        let up = forward.cross(right).normalize();

        let mut camera = Self {
            forward,
            right,
            up,
            distance: GLOBE_RADIUS * (1.0 + altitude),
            near: 0.1,
            far: 2000.0,
            min_distance: 0.0,
            max_distance: f64::MAX,
            fov_y: 50f64.to_radians(),
            width,
            height,
        };
        camera.tune_for_depth_precision();
        camera
    }

    /// Tighten the depth range and zoom bounds. Far planes much larger than the
    /// scene waste depth precision at close zoom.
    pub fn tune_for_depth_precision(&mut self) {
        self.near = 0.4;
        if self.far > 1200.0 {
            self.far = 1200.0;
        }
        self.min_distance = 110.0;
        self.max_distance = 380.0;
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
    }

    /// Set viewport dimensions and re-apply the depth tuning.
    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.tune_for_depth_precision();
    }

    /// Focal length in pixels
    #[inline(always)]
    fn focal(&self) -> f64 {
        (self.height.max(1) as f64 / 2.0) / (self.fov_y / 2.0).tan()
    }

    #[inline(always)]
    fn center(&self) -> (f64, f64) {
        (self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    /// Distance from the camera along the view axis
    #[inline(always)]
    pub fn view_depth(&self, p: DVec3) -> f64 {
        self.distance - p.dot(self.forward)
    }

    /// Whether a point on (or just above) the sphere is on the visible side of the horizon
    #[inline(always)]
    pub fn is_front_facing(&self, p: DVec3) -> bool {
        p.dot(self.forward) > p.length_squared() / self.distance
    }

    /// Move a hidden point onto the horizon circle of its own sphere shell.
    /// `None` for the point directly opposite the camera.
    pub fn clamp_to_limb(&self, p: DVec3) -> Option<DVec3> {
        let r2 = p.length_squared();
        let h = r2 / self.distance;
        let perpendicular = p - self.forward * p.dot(self.forward);
        let rho = (r2 - h * h).max(0.0).sqrt();
        let dir = perpendicular.try_normalize()?;
        Some(self.forward * h + dir * rho)
    }

    /// Project a world point to screen pixels. `None` outside the near/far planes.
    pub fn project(&self, p: DVec3) -> Option<(f64, f64)> {
        let depth = self.view_depth(p);
        if depth < self.near || depth > self.far {
            return None;
        }
        let f = self.focal() / depth;
        let (cx, cy) = self.center();
        Some((cx + p.dot(self.right) * f, cy - p.dot(self.up) * f))
    }

    /// Apparent radius of the globe disk in pixels
    pub fn screen_radius(&self) -> f64 {
        let r = GLOBE_RADIUS;
        let d = self.distance.max(r + f64::EPSILON);
        let h = r * r / d;
        let rho = (r * r - h * h).max(0.0).sqrt();
        self.focal() * rho / (d - h)
    }

    /// Screen position of the globe center
    pub fn screen_center(&self) -> (f64, f64) {
        self.center()
    }

    /// Cast a ray through a pixel onto the sphere; lon/lat of the front hit.
    pub fn unproject(&self, sx: f64, sy: f64) -> Option<(f64, f64)> {
        let (cx, cy) = self.center();
        let f = self.focal();
        let origin = self.forward * self.distance;
        let dir = (self.right * ((sx - cx) / f) + self.up * (-(sy - cy) / f) - self.forward).normalize();

        // |origin + t*dir|² = R²
        let b = origin.dot(dir);
        let c = origin.length_squared() - GLOBE_RADIUS * GLOBE_RADIUS;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let t = -b - disc.sqrt();
        if t < 0.0 {
            return None;
        }
        let p = (origin + dir * t) / GLOBE_RADIUS;
        let lat = p.z.clamp(-1.0, 1.0).asin().to_degrees();
        let lon = p.y.atan2(p.x).to_degrees();
        Some((lon, lat))
    }

    /// Rotate the globe by a pixel drag delta.
    /// Positive dx = dragged left → globe center shifts east (surface follows cursor).
    pub fn rotate_drag(&mut self, dx: f64, dy: f64) {
        let radius = self.screen_radius().max(1.0);
        let angle_x = dx / radius;
        let angle_y = -dy / radius;

        // Rotate around up axis (horizontal drag → longitude change)
        if angle_x.abs() > 1e-10 {
            let (sin_a, cos_a) = angle_x.sin_cos();
            let new_forward = self.forward * cos_a + self.right * sin_a;
            let new_right = self.right * cos_a - self.forward * sin_a;
            self.forward = new_forward.normalize();
            self.right = new_right.normalize();
        }

        // Rotate around right axis (vertical drag → latitude change)
        if angle_y.abs() > 1e-10 {
            let (sin_a, cos_a) = angle_y.sin_cos();
            let new_forward = self.forward * cos_a + self.up * sin_a;
            let new_up = self.up * cos_a - self.forward * sin_a;
            self.forward = new_forward.normalize();
            self.up = new_up.normalize();
        }
    }

    /// Zoom in (factor > 1) or out by moving the camera, within the distance bounds
    pub fn zoom_by(&mut self, factor: f64) {
        if factor <= 0.0 || !factor.is_finite() {
            return;
        }
        self.distance = (self.distance / factor).clamp(self.min_distance, self.max_distance);
    }

    /// Center lon/lat the camera looks at.
    pub fn center_lonlat(&self) -> (f64, f64) {
        let lat = self.forward.z.clamp(-1.0, 1.0).asin().to_degrees();
        let lon = self.forward.y.atan2(self.forward.x).to_degrees();
        (lon, lat)
    }
}

/// Convert lon/lat (degrees) to a unit sphere vector.
#[inline(always)]
pub fn lonlat_to_vec3(lon: f64, lat: f64) -> DVec3 {
    let lon_rad = lon.to_radians();
    let lat_rad = lat.to_radians();
    DVec3::new(
        lat_rad.cos() * lon_rad.cos(),
        lat_rad.cos() * lon_rad.sin(),
        lat_rad.sin(),
    )
}

/// Interpolate along a great circle arc and call a visitor for each subdivision point.
/// Subdivides adaptively: ~2° segments for smooth curves at braille resolution.
#[inline]
pub fn walk_great_circle(a: DVec3, b: DVec3, mut visitor: impl FnMut(DVec3)) {
    let dot = a.dot(b).clamp(-1.0, 1.0);
    let angle = dot.acos(); // angular distance in radians

    // ~2° segments
    let steps = ((angle.to_degrees() / 2.0).ceil() as usize).max(1);

    let sin_angle = angle.sin();
    if steps == 1 || sin_angle.abs() < 1e-10 {
        // Short segment, or points nearly identical or antipodal
        visitor(b);
        return;
    }

    for i in 1..=steps {
        let t = i as f64 / steps as f64;
        let sa = ((1.0 - t) * angle).sin() / sin_angle;
        let sb = (t * angle).sin() / sin_angle;
        visitor(a * sa + b * sb);
    }
}

/// Altitude above the surface, in globe radii, for a region name.
/// Deterministic so neighbouring regions never share a surface (no z-fighting).
pub fn altitude_for(name: &str, config: &AltitudeConfig) -> f64 {
    let jitter = name_hash(&name.to_lowercase()) % config.jitter_modulus.max(1);
    config.base + jitter as f64 * config.step
}

/// One region lifted onto the sphere
#[derive(Clone, Debug)]
pub struct GlobePatch {
    /// Index into the region collection the layout was built from
    pub region: usize,
    pub altitude: f64,
    /// Rings in world units, edges subdivided along great circles
    pub rings: Vec<Vec<DVec3>>,
    /// Area-weighted centroid on the patch surface, used for depth sorting
    pub centroid: DVec3,
}

/// Builds globe patches for every region except the excluded one
pub fn build_patches(regions: &[Region], config: &MapConfig) -> Vec<GlobePatch> {
    let excluded = normalize(&config.excluded_region);
    regions
        .iter()
        .enumerate()
        .filter(|(_, r)| r.key != excluded)
        .map(|(idx, region)| {
            let altitude = altitude_for(&region.name, &config.altitude);
            let shell = GLOBE_RADIUS * (1.0 + altitude);
            let rings = region
                .rings()
                .filter(|ring| ring.len() >= 2)
                .map(|ring| {
                    let mut points = Vec::with_capacity(ring.len() * 2);
                    let mut prev: Option<DVec3> = None;
                    for &(lon, lat) in ring {
                        let p = lonlat_to_vec3(lon, lat);
                        match prev {
                            Some(a) => walk_great_circle(a, p, |q| points.push(q * shell)),
                            None => points.push(p * shell),
                        }
                        prev = Some(p);
                    }
                    points
                })
                .collect();
            let (lon, lat) = region.centroid();
            GlobePatch {
                region: idx,
                altitude,
                rings,
                centroid: lonlat_to_vec3(lon, lat) * shell,
            }
        })
        .collect()
}

/// Which pass a draw belongs to once depth ordering is stable
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawKind {
    Fill,
    Stroke,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthPhase {
    /// Stabilization runs when the countdown reaches zero
    Scheduled { frames_left: u8 },
    Stable,
}

/// Frames between layout and the depth stabilization pass
const STABILIZE_AFTER_FRAMES: u8 = 2;

/// Back-to-front ordering of globe patches, double-buffered.
///
/// After a layout the stabilization step is deferred two frames; once it has
/// run, fills are drawn in a pass before strokes (render order 1 and 2).
#[derive(Debug)]
pub struct DepthSorter {
    phase: DepthPhase,
    front: Vec<usize>,
    back: Vec<(f64, usize)>,
}

impl DepthSorter {
    pub fn new() -> Self {
        Self {
            phase: DepthPhase::Scheduled {
                frames_left: STABILIZE_AFTER_FRAMES,
            },
            front: Vec::new(),
            back: Vec::new(),
        }
    }

    /// Restart the countdown after a new layout
    pub fn schedule(&mut self) {
        self.phase = DepthPhase::Scheduled {
            frames_left: STABILIZE_AFTER_FRAMES,
        };
    }

    /// Advance one frame; returns true on the frame stabilization runs
    pub fn on_frame(&mut self) -> bool {
        match self.phase {
            DepthPhase::Scheduled { frames_left } if frames_left <= 1 => {
                self.phase = DepthPhase::Stable;
                tracing::debug!("globe depth order stabilized");
                true
            }
            DepthPhase::Scheduled { frames_left } => {
                self.phase = DepthPhase::Scheduled {
                    frames_left: frames_left - 1,
                };
                false
            }
            DepthPhase::Stable => false,
        }
    }

    pub fn phase(&self) -> DepthPhase {
        self.phase
    }

    pub fn is_stable(&self) -> bool {
        self.phase == DepthPhase::Stable
    }

    /// Render order for a pass: fills 1, strokes 2 once stable, 0 before
    pub fn render_order(&self, kind: DrawKind) -> u8 {
        match (self.phase, kind) {
            (DepthPhase::Stable, DrawKind::Fill) => 1,
            (DepthPhase::Stable, DrawKind::Stroke) => 2,
            _ => 0,
        }
    }

    /// Sort patches far-to-near into the back buffer, then swap it in
    pub fn sort(&mut self, patches: &[GlobePatch], camera: &GlobeCamera) -> &[usize] {
        self.back.clear();
        self.back
            .extend(patches.iter().enumerate().map(|(i, p)| (camera.view_depth(p.centroid), i)));
        self.back.sort_by(|a, b| b.0.total_cmp(&a.0));
        self.front.clear();
        self.front.extend(self.back.iter().map(|&(_, i)| i));
        &self.front
    }

    /// Order from the last sort
    pub fn order(&self) -> &[usize] {
        &self.front
    }
}

impl Default for DepthSorter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> GlobeCamera {
        GlobeCamera::new(0.0, 0.0, 2.0, 400, 200)
    }

    #[test]
    fn test_altitude_deterministic_and_bounded() {
        let cfg = MapConfig::default().altitude;
        let a = altitude_for("Norway", &cfg);
        assert_eq!(a, altitude_for("norway", &cfg));
        assert!(a >= cfg.base && a <= cfg.base + 10.0 * cfg.step + 1e-12);
        let jitter = name_hash("norway") % 11;
        assert_relative_eq!(a, 0.006 + jitter as f64 * 0.00002);
    }

    #[test]
    fn test_neighbours_usually_differ_in_altitude() {
        let cfg = MapConfig::default().altitude;
        let names = ["france", "spain", "germany", "italy", "portugal", "belgium", "austria"];
        let distinct: std::collections::HashSet<u64> =
            names.iter().map(|n| altitude_for(n, &cfg).to_bits()).collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_camera_depth_clamps() {
        let mut cam = GlobeCamera::new(0.0, 0.0, 10.0, 400, 200);
        assert_eq!(cam.near, 0.4);
        assert!(cam.far <= 1200.0);
        assert_eq!(cam.distance, 380.0);
        cam.zoom_by(100.0);
        assert_eq!(cam.distance, 110.0);
        cam.zoom_by(0.0001);
        assert_eq!(cam.distance, 380.0);
        cam.far = 5000.0;
        cam.set_size(800, 400);
        assert_eq!(cam.far, 1200.0);
    }

    #[test]
    fn test_center_projects_to_screen_center() {
        let cam = camera();
        let (x, y) = cam.project(lonlat_to_vec3(0.0, 0.0) * GLOBE_RADIUS).unwrap();
        assert_relative_eq!(x, 200.0, epsilon = 1e-9);
        assert_relative_eq!(y, 100.0, epsilon = 1e-9);
        // North is up, east is right
        let (_, ny) = cam.project(lonlat_to_vec3(0.0, 10.0) * GLOBE_RADIUS).unwrap();
        let (ex, _) = cam.project(lonlat_to_vec3(10.0, 0.0) * GLOBE_RADIUS).unwrap();
        assert!(ny < 100.0);
        assert!(ex > 200.0);
    }

    #[test]
    fn test_back_face_and_limb() {
        let cam = camera();
        let back = lonlat_to_vec3(180.0, 0.0) * GLOBE_RADIUS;
        assert!(!cam.is_front_facing(back));
        assert!(cam.is_front_facing(lonlat_to_vec3(10.0, 10.0) * GLOBE_RADIUS));
        let hidden = lonlat_to_vec3(120.0, 5.0) * GLOBE_RADIUS;
        let limb = cam.clamp_to_limb(hidden).unwrap();
        assert_relative_eq!(limb.length(), GLOBE_RADIUS, epsilon = 1e-9);
        assert_relative_eq!(limb.dot(DVec3::X), GLOBE_RADIUS / 3.0, epsilon = 1e-9);
        assert!(cam.clamp_to_limb(DVec3::new(-GLOBE_RADIUS, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_unproject_roundtrip() {
        let cam = camera();
        let (x, y) = cam.project(lonlat_to_vec3(20.0, -15.0) * GLOBE_RADIUS).unwrap();
        let (lon, lat) = cam.unproject(x, y).unwrap();
        assert_relative_eq!(lon, 20.0, epsilon = 1e-6);
        assert_relative_eq!(lat, -15.0, epsilon = 1e-6);
        assert!(cam.unproject(0.0, 0.0).is_none());
    }

    #[test]
    fn test_unproject_across_antimeridian_hits_split_region() {
        let cam = GlobeCamera::new(180.0, 0.0, 2.0, 400, 200);
        let east = vec![(170.0, -10.0), (180.0, -10.0), (180.0, 10.0), (170.0, 10.0), (170.0, -10.0)];
        let west = vec![(-180.0, -10.0), (-170.0, -10.0), (-170.0, 10.0), (-180.0, 10.0), (-180.0, -10.0)];
        let fiji = Region::new("Fiji", vec![vec![east], vec![west]]).unwrap();

        let (left_lon, _) = cam.unproject(190.0, 100.0).unwrap();
        let (right_lon, _) = cam.unproject(210.0, 100.0).unwrap();
        assert!(left_lon > 170.0);
        assert!(right_lon < -170.0);
        assert!(fiji.contains(left_lon, 0.0));
        assert!(fiji.contains(right_lon, 0.0));
    }

    #[test]
    fn test_rotate_drag_moves_center() {
        let mut cam = camera();
        cam.rotate_drag(50.0, 0.0);
        let (lon, lat) = cam.center_lonlat();
        assert!(lon > 0.0);
        assert_relative_eq!(lat, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_patches_exclude_polar_region_and_sit_above_surface() {
        let regions = vec![
            Region::square("Norway", 5.0, 58.0, 20.0),
            Region::square("Antarctica", -60.0, -89.0, 20.0),
        ];
        let patches = build_patches(&regions, &MapConfig::default());
        assert_eq!(patches.len(), 1);
        let patch = &patches[0];
        assert_eq!(patch.region, 0);
        for p in patch.rings.iter().flatten() {
            assert_relative_eq!(p.length(), GLOBE_RADIUS * (1.0 + patch.altitude), epsilon = 1e-9);
        }
        // 20° edges subdivide into 2° steps
        assert!(patch.rings[0].len() > 5);
    }

    #[test]
    fn test_depth_sorter_schedule() {
        let mut sorter = DepthSorter::new();
        assert!(!sorter.is_stable());
        assert_eq!(sorter.render_order(DrawKind::Fill), 0);
        assert!(!sorter.on_frame());
        assert!(sorter.on_frame());
        assert!(sorter.is_stable());
        assert_eq!(sorter.render_order(DrawKind::Fill), 1);
        assert_eq!(sorter.render_order(DrawKind::Stroke), 2);
        assert!(!sorter.on_frame());
        sorter.schedule();
        assert_eq!(sorter.phase(), DepthPhase::Scheduled { frames_left: 2 });
    }

    #[test]
    fn test_depth_sort_far_to_near() {
        let regions = vec![
            Region::square("Near", -5.0, -5.0, 10.0),
            Region::square("Far", 80.0, 0.0, 5.0),
            Region::square("Middle", 40.0, 0.0, 5.0),
        ];
        let patches = build_patches(&regions, &MapConfig::default());
        let mut sorter = DepthSorter::new();
        let order = sorter.sort(&patches, &camera()).to_vec();
        assert_eq!(order, vec![1, 2, 0]);
        assert_eq!(sorter.order(), &[1, 2, 0]);
    }
}
