use std::rc::Rc;

use crate::braille::PixelCanvas;
use crate::config::MapConfig;
use crate::interaction::{GestureAction, GestureMachine, Hit, InputEvent, Label, Selection, SelectionMachine};
use crate::map::{
    build_patches, DepthSorter, FlatLayout, GlobeCamera, GlobePatch, MapRenderer, Region, ViewTransform,
    ViewportClamp,
};
use crate::style::{Palette, StyleCache, StyleDescriptor};
use crate::visit::{Membership, MembershipIndex, RegionKey, VisitedSets};

/// Drags at or below this scale zoom instead of pan
const DRAG_ZOOM_TOLERANCE: f64 = 0.01;
/// Initial globe altitude in globe radii
const GLOBE_ALTITUDE: f64 = 2.0;
/// Keyboard rotation step in pixels of drag
const KEY_ROTATE_PX: f64 = 12.0;

/// Which projection is on screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    Flat,
    Globe,
}

/// Notifications for the host, drained with [`App::drain_events`]
#[derive(Clone, Debug, PartialEq)]
pub enum MapEvent {
    SelectionChanged(Option<RegionKey>),
    TransformChanged(ViewTransform),
}

/// Terminal size minus the map border (2 columns) and border plus status and
/// legend lines (4 rows), in character cells
pub fn map_cells(width: usize, height: usize) -> (usize, usize) {
    (width.saturating_sub(2), height.saturating_sub(4))
}

/// Convert a terminal position to canvas pixels (border is 1 cell)
pub fn cell_to_pixel(col: u16, row: u16) -> (f64, f64) {
    (col.saturating_sub(1) as f64 * 2.0, row.saturating_sub(1) as f64 * 4.0)
}

/// One map view: regions, visit membership, styles, selection and both projections
pub struct App {
    pub config: MapConfig,
    pub mode: ViewMode,
    pub should_quit: bool,
    /// Current mouse position for the cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    regions: Vec<Region>,
    visited: VisitedSets,
    membership: MembershipIndex,
    flat_styles: StyleCache,
    globe_styles: StyleCache,
    /// Style per region for the current mode, parallel to `regions`
    styles: Vec<Rc<StyleDescriptor>>,
    selection: SelectionMachine,
    gestures: GestureMachine,
    transform: ViewTransform,
    clamp: ViewportClamp,
    layout: FlatLayout,
    camera: GlobeCamera,
    patches: Vec<GlobePatch>,
    depth: DepthSorter,
    renderer: MapRenderer,
    events: Vec<MapEvent>,
    cols: usize,
    rows: usize,
}

impl App {
    pub fn new(
        regions: Vec<Region>,
        visited: VisitedSets,
        config: MapConfig,
        flat_palette: Palette,
        globe_palette: Palette,
        width: usize,
        height: usize,
    ) -> Self {
        let (cols, rows) = map_cells(width, height);
        let (pw, ph) = (cols * 2, rows * 4);
        let membership = MembershipIndex::resolve(&regions, &visited);
        let layout = FlatLayout::build(&regions, &config, pw as f64, ph as f64);
        let clamp = ViewportClamp::new(config.zoom, pw as f64, ph as f64, layout.bounds);
        let patches = build_patches(&regions, &config);
        let camera = GlobeCamera::new(0.0, 20.0, GLOBE_ALTITUDE, pw, ph);
        let gestures = GestureMachine::new(config.drag_zoom_rate, config.scroll_zoom_step);
        let renderer = MapRenderer::new(config.stripes, config.globe_stripes);
        // Config owns the selection darkening for both palettes
        let flat_palette = Palette {
            darken_factor: config.darken_factor,
            ..flat_palette
        };
        let globe_palette = Palette {
            darken_factor: config.darken_factor,
            ..globe_palette
        };

        let mut app = Self {
            config,
            mode: ViewMode::Flat,
            should_quit: false,
            mouse_pos: None,
            regions,
            visited,
            membership,
            flat_styles: StyleCache::new(flat_palette),
            globe_styles: StyleCache::new(globe_palette),
            styles: Vec::new(),
            selection: SelectionMachine::new(),
            gestures,
            transform: ViewTransform::IDENTITY,
            clamp,
            layout,
            camera,
            patches,
            depth: DepthSorter::new(),
            renderer,
            events: Vec::new(),
            cols,
            rows,
        };
        app.refresh_styles();
        tracing::info!(
            regions = app.regions.len(),
            visited = app.membership.len(),
            "map view ready"
        );
        app
    }

    /// Rebuild the per-region style table from membership and selection
    fn refresh_styles(&mut self) {
        let cache = match self.mode {
            ViewMode::Flat => &mut self.flat_styles,
            ViewMode::Globe => &mut self.globe_styles,
        };
        let selected = self.selection.state().key();
        self.styles.clear();
        for region in &self.regions {
            let membership = self.membership.get(&region.key);
            let is_selected = selected == Some(&region.key);
            self.styles.push(cache.resolve(membership, is_selected));
        }
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (cols, rows) = map_cells(width, height);
        self.cols = cols;
        self.rows = rows;
        let (pw, ph) = (cols as f64 * 2.0, rows as f64 * 4.0);
        self.layout = FlatLayout::build(&self.regions, &self.config, pw, ph);
        self.clamp = ViewportClamp::new(self.config.zoom, pw, ph, self.layout.bounds);
        self.commit_transform(self.transform);
        self.camera.set_size(cols * 2, rows * 4);
        self.depth.schedule();
    }

    /// Replace the visited sets and re-resolve membership
    pub fn set_visited(&mut self, visited: VisitedSets) {
        self.membership = MembershipIndex::resolve(&self.regions, &visited);
        self.visited = visited;
        self.refresh_styles();
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            ViewMode::Flat => ViewMode::Globe,
            ViewMode::Globe => ViewMode::Flat,
        };
        if self.mode == ViewMode::Globe {
            self.depth.schedule();
        }
        tracing::debug!(mode = ?self.mode, "view mode switched");
        self.refresh_styles();
    }

    /// Advance one frame
    pub fn tick(&mut self) {
        if self.mode == ViewMode::Globe {
            self.depth.on_frame();
        }
    }

    /// Feed a pointer event (canvas pixels) through the gesture machine
    pub fn handle_input(&mut self, event: InputEvent) {
        let drag_zooms = self.mode == ViewMode::Flat && self.clamp.at_min_scale(&self.transform, DRAG_ZOOM_TOLERANCE);
        if let Some(action) = self.gestures.handle(event, drag_zooms) {
            self.apply(action);
        }
    }

    pub fn apply(&mut self, action: GestureAction) {
        match (self.mode, action) {
            (_, GestureAction::Click { x, y }) => self.click(x, y),
            (ViewMode::Flat, GestureAction::ZoomBy(factor)) => {
                let center = (self.clamp.width / 2.0, self.clamp.height / 2.0);
                self.commit_transform(self.transform.scale_about(factor, center));
            }
            (ViewMode::Flat, GestureAction::ZoomAt { factor, x, y }) => {
                self.commit_transform(self.transform.scale_about(factor, (x, y)));
            }
            (ViewMode::Flat, GestureAction::PanBy { dx, dy }) => {
                self.commit_transform(self.transform.translate_by(dx, dy));
            }
            (ViewMode::Globe, GestureAction::ZoomBy(factor) | GestureAction::ZoomAt { factor, .. }) => {
                self.camera.zoom_by(factor);
            }
            // Surface follows the pointer
            (ViewMode::Globe, GestureAction::PanBy { dx, dy }) => self.camera.rotate_drag(-dx, -dy),
        }
    }

    /// Clamp and store a transform, reporting it when it changed
    fn commit_transform(&mut self, proposed: ViewTransform) {
        let next = self.clamp.clamp(proposed);
        if next != self.transform {
            self.transform = next;
            self.events.push(MapEvent::TransformChanged(next));
        }
    }

    /// Region index under a canvas pixel in the current mode
    pub fn region_at(&self, x: f64, y: f64) -> Option<usize> {
        match self.mode {
            ViewMode::Flat => {
                let (cx, cy) = self.transform.invert((x, y));
                self.layout.hit_test(cx, cy)
            }
            ViewMode::Globe => {
                // Rings are tested in raw lon/lat, so regions must arrive split at ±180°
                let (lon, lat) = self.camera.unproject(x, y)?;
                self.patches
                    .iter()
                    .map(|p| p.region)
                    .find(|&idx| self.regions[idx].contains(lon, lat))
            }
        }
    }

    /// Click at a canvas pixel: select, toggle or clear
    pub fn click(&mut self, x: f64, y: f64) {
        let hit = self.region_at(x, y).map(|idx| {
            let region = &self.regions[idx];
            Hit {
                key: &region.key,
                name: &region.name,
            }
        });
        if self.selection.click(hit, (x, y)) {
            self.events
                .push(MapEvent::SelectionChanged(self.selection.state().key().cloned()));
            self.refresh_styles();
        }
    }

    /// Drop the selection and its label without a click
    pub fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.events.push(MapEvent::SelectionChanged(None));
            self.refresh_styles();
        }
    }

    /// Pan by keyboard, in canvas pixels
    pub fn pan(&mut self, dx: f64, dy: f64) {
        match self.mode {
            ViewMode::Flat => self.commit_transform(self.transform.translate_by(dx, dy)),
            ViewMode::Globe => self.camera.rotate_drag(-dx.signum() * KEY_ROTATE_PX, -dy.signum() * KEY_ROTATE_PX),
        }
    }

    pub fn zoom_in(&mut self) {
        self.apply(GestureAction::ZoomBy(self.config.scroll_zoom_step));
    }

    pub fn zoom_out(&mut self) {
        self.apply(GestureAction::ZoomBy(1.0 / self.config.scroll_zoom_step));
    }

    /// Back to the fitted flat view and the initial globe camera
    pub fn reset_view(&mut self) {
        self.commit_transform(ViewTransform::IDENTITY);
        self.camera = GlobeCamera::new(0.0, 20.0, GLOBE_ALTITUDE, self.cols * 2, self.rows * 4);
        self.depth.schedule();
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Update mouse cursor position
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Draw the current mode into a fresh canvas sized to the map area
    pub fn render_canvas(&mut self) -> PixelCanvas {
        let mut canvas = PixelCanvas::new(self.cols, self.rows);
        match self.mode {
            ViewMode::Flat => self
                .renderer
                .render_flat(&mut canvas, &self.layout, &self.transform, &self.styles),
            ViewMode::Globe => self.renderer.render_globe(
                &mut canvas,
                &self.patches,
                &self.camera,
                &mut self.depth,
                &self.styles,
            ),
        }
        canvas
    }

    /// Take all events raised since the last call
    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn visited(&self) -> &VisitedSets {
        &self.visited
    }

    pub fn membership_of(&self, key: &RegionKey) -> Membership {
        self.membership.get(key)
    }

    pub fn membership(&self) -> &MembershipIndex {
        &self.membership
    }

    pub fn selection(&self) -> &Selection {
        self.selection.state()
    }

    pub fn label(&self) -> Option<&Label> {
        self.selection.label()
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn layout(&self) -> &FlatLayout {
        &self.layout
    }

    pub fn camera(&self) -> &GlobeCamera {
        &self.camera
    }

    pub fn depth_stable(&self) -> bool {
        self.depth.is_stable()
    }

    /// Style in effect for a region index
    pub fn style_of(&self, idx: usize) -> Option<&Rc<StyleDescriptor>> {
        self.styles.get(idx)
    }

    /// Palette of the current mode, for the legend
    pub fn palette(&self) -> &Palette {
        match self.mode {
            ViewMode::Flat => self.flat_styles.palette(),
            ViewMode::Globe => self.globe_styles.palette(),
        }
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        match self.mode {
            ViewMode::Flat => format!("{:.1}x", self.transform.k),
            ViewMode::Globe => format!("{:.0}u", self.camera.distance),
        }
    }

    /// Globe center coordinates as a string
    pub fn center_coords(&self) -> String {
        let (lon, lat) = self.camera.center_lonlat();
        format!(
            "{:.1}°{}, {:.1}°{}",
            lat.abs(),
            if lat >= 0.0 { "N" } else { "S" },
            lon.abs(),
            if lon >= 0.0 { "E" } else { "W" }
        )
    }

    /// Canvas size in character cells
    pub fn map_size(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Fill;
    use crate::visit::normalize;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn app() -> App {
        let regions = vec![
            Region::square("Norway", 5.0, 58.0, 20.0),
            Region::square("Japan", 125.0, 25.0, 20.0),
            Region::square("Brazil", -70.0, -30.0, 35.0),
            Region::square("Spain", -9.0, 36.0, 12.0),
        ];
        let visited = VisitedSets::new(strings(&["Norway", "Japan"])).with_friend_one(strings(&["Japan", "Brazil"]));
        // 302 x 89 terminal -> 300 x 85 cells -> 600 x 340 pixels
        App::new(
            regions,
            visited,
            MapConfig::default(),
            Palette::flat(),
            Palette::globe(),
            302,
            89,
        )
    }

    fn center_of(app: &App, region: usize) -> (f64, f64) {
        let path = app.layout().paths.iter().find(|p| p.region == region).unwrap();
        let center = (
            (path.bounds.left + path.bounds.right) / 2.0,
            (path.bounds.top + path.bounds.bottom) / 2.0,
        );
        app.transform().apply(center)
    }

    #[test]
    fn test_terminal_to_canvas_size() {
        let app = app();
        assert_eq!(app.map_size(), (300, 85));
        assert_eq!(app.layout().width, 600.0);
        assert_eq!(app.layout().height, 340.0);
        assert_eq!(cell_to_pixel(11, 3), (20.0, 8.0));
    }

    #[test]
    fn test_membership_drives_styles() {
        let app = app();
        assert_eq!(app.membership_of(&normalize("norway")).code(), 1);
        assert_eq!(app.membership_of(&normalize("japan")).code(), 3);
        assert_eq!(app.membership_of(&normalize("brazil")).code(), 2);
        assert_eq!(app.membership_of(&normalize("spain")).code(), 0);
        assert!(matches!(app.style_of(1).unwrap().fill, Fill::Stripes { .. }));
        assert_eq!(app.style_of(3).unwrap().fill, Fill::Solid(Palette::flat().unvisited));
    }

    #[test]
    fn test_click_select_toggle_and_switch() {
        let mut app = app();
        let (x, y) = center_of(&app, 1);
        app.click(x, y);
        assert_eq!(app.selection(), &Selection::Selected(normalize("Japan")));
        assert!(app.style_of(1).unwrap().selected);
        assert_eq!(app.label().unwrap().text, "Japan");
        assert_eq!(
            app.drain_events(),
            vec![MapEvent::SelectionChanged(Some(normalize("japan")))]
        );

        app.click(x, y);
        assert_eq!(app.selection(), &Selection::Unselected);
        assert!(!app.style_of(1).unwrap().selected);
        assert_eq!(app.drain_events(), vec![MapEvent::SelectionChanged(None)]);

        app.click(x, y);
        let (sx, sy) = center_of(&app, 3);
        app.click(sx, sy);
        assert_eq!(app.selection(), &Selection::Selected(normalize("Spain")));
        assert!(!app.style_of(1).unwrap().selected);
        assert!(app.style_of(3).unwrap().selected);
        app.drain_events();

        // Ocean corner
        app.click(0.0, 0.0);
        assert_eq!(app.selection(), &Selection::Unselected);
        assert_eq!(app.drain_events(), vec![MapEvent::SelectionChanged(None)]);
    }

    #[test]
    fn test_clear_selection_emits_once() {
        let mut app = app();
        app.clear_selection();
        assert!(app.drain_events().is_empty());

        let (x, y) = center_of(&app, 0);
        app.click(x, y);
        app.drain_events();
        app.clear_selection();
        assert_eq!(app.selection(), &Selection::Unselected);
        assert!(app.label().is_none());
        assert!(!app.style_of(0).unwrap().selected);
        assert_eq!(app.drain_events(), vec![MapEvent::SelectionChanged(None)]);
    }

    #[test]
    fn test_config_darken_factor_applies_to_selection() {
        let config = MapConfig {
            darken_factor: 0.5,
            ..MapConfig::default()
        };
        let mut app = App::new(
            vec![Region::square("Norway", 5.0, 58.0, 20.0)],
            VisitedSets::new(strings(&["Norway"])),
            config,
            Palette::flat(),
            Palette::globe(),
            302,
            89,
        );
        let (x, y) = center_of(&app, 0);
        app.click(x, y);
        let expected = Palette::flat().me.darken(0.5);
        assert_eq!(app.style_of(0).unwrap().fill, Fill::Solid(expected));

        app.toggle_mode();
        assert_eq!(app.palette().darken_factor, 0.5);
    }

    #[test]
    fn test_unselected_styles_shared_between_regions() {
        let mut app = app();
        app.set_visited(VisitedSets::new(strings(&["Norway", "Spain"])));
        assert!(Rc::ptr_eq(app.style_of(0).unwrap(), app.style_of(3).unwrap()));
        assert!(Rc::ptr_eq(app.style_of(1).unwrap(), app.style_of(2).unwrap()));
    }

    #[test]
    fn test_drag_zooms_then_pans() {
        let mut app = app();
        app.handle_input(InputEvent::Down { x: 100.0, y: 100.0 });
        app.handle_input(InputEvent::Move { x: 200.0, y: 100.0 });
        let zoomed = app.transform();
        assert!(zoomed.k > 2.0);
        assert!(matches!(app.drain_events().as_slice(), [MapEvent::TransformChanged(_)]));

        app.handle_input(InputEvent::Move { x: 180.0, y: 90.0 });
        let panned = app.transform();
        assert_eq!(panned.k, zoomed.k);
        assert_ne!((panned.x, panned.y), (zoomed.x, zoomed.y));
        app.handle_input(InputEvent::Up { x: 180.0, y: 90.0 });
        assert_eq!(app.selection(), &Selection::Unselected);
    }

    #[test]
    fn test_zoom_out_past_min_snaps_to_identity() {
        let mut app = app();
        app.zoom_in();
        app.pan(-40.0, -20.0);
        assert!(!app.transform().is_identity());
        for _ in 0..5 {
            app.zoom_out();
        }
        assert!(app.transform().is_identity());
        // Already identity: no further events
        app.drain_events();
        app.zoom_out();
        assert!(app.drain_events().is_empty());
    }

    #[test]
    fn test_resize_reclamps_transform() {
        let mut app = app();
        for _ in 0..6 {
            app.zoom_in();
        }
        app.pan(-5000.0, -5000.0);
        app.resize(152, 46);
        assert_eq!(app.layout().width, 300.0);
        assert_eq!(app.layout().height, 168.0);
        let t = app.transform();
        assert_eq!(app.transform(), ViewportClamp::new(app.config.zoom, 300.0, 168.0, app.layout().bounds).clamp(t));
        assert_eq!(app.camera().width, 300);
    }

    #[test]
    fn test_globe_mode_click_and_stabilize() {
        let regions = vec![Region::square("Ghana", -40.0, -20.0, 80.0)];
        let mut app = App::new(
            regions,
            VisitedSets::new(strings(&["Ghana"])),
            MapConfig::default(),
            Palette::flat(),
            Palette::globe(),
            102,
            54,
        );
        app.toggle_mode();
        assert_eq!(app.mode, ViewMode::Globe);
        assert!(!app.depth_stable());
        app.tick();
        app.tick();
        assert!(app.depth_stable());

        let (cx, cy) = app.camera().screen_center();
        app.click(cx, cy);
        assert_eq!(app.selection(), &Selection::Selected(normalize("ghana")));
        assert_eq!(app.style_of(0).unwrap().stroke, crate::style::Stroke::Heavy);

        let canvas = app.render_canvas();
        assert!(canvas.cells().next().is_some());

        // Rotating does not emit flat transform events
        app.handle_input(InputEvent::Down { x: 10.0, y: 10.0 });
        app.handle_input(InputEvent::Move { x: 40.0, y: 10.0 });
        let events = app.drain_events();
        assert!(events.iter().all(|e| matches!(e, MapEvent::SelectionChanged(_))));
    }
}
