//! Pointer handling: turning raw input into gestures, and clicks into
//! selection changes. Both machines are plain state with no I/O so they can be
//! driven from tests.

use crate::visit::RegionKey;

/// Pointer movement (in canvas pixels) that turns a press into a drag
pub const CLICK_THRESHOLD_PX: f64 = 3.0;

/// Selected region, if any
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Unselected,
    Selected(RegionKey),
}

impl Selection {
    pub fn key(&self) -> Option<&RegionKey> {
        match self {
            Selection::Unselected => None,
            Selection::Selected(key) => Some(key),
        }
    }

    pub fn is_selected(&self, key: &RegionKey) -> bool {
        self.key() == Some(key)
    }
}

/// Transient tooltip shown next to the pointer for the selected region
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub text: String,
    /// Canvas pixel position of the click that opened it
    pub anchor: (f64, f64),
}

/// Region under the pointer when a click lands
#[derive(Clone, Copy, Debug)]
pub struct Hit<'a> {
    pub key: &'a RegionKey,
    pub name: &'a str,
}

/// Click-to-select state machine
#[derive(Debug, Default)]
pub struct SelectionMachine {
    state: Selection,
    label: Option<Label>,
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &Selection {
        &self.state
    }

    pub fn label(&self) -> Option<&Label> {
        self.label.as_ref()
    }

    /// Apply a click. Returns true when the selection changed and styles
    /// must be refreshed.
    pub fn click(&mut self, hit: Option<Hit<'_>>, pointer: (f64, f64)) -> bool {
        let next = match (&self.state, hit) {
            (Selection::Selected(current), Some(hit)) if current == hit.key => {
                self.label = None;
                Selection::Unselected
            }
            (_, Some(hit)) => {
                self.label = Some(Label {
                    text: hit.name.to_string(),
                    anchor: pointer,
                });
                Selection::Selected(hit.key.clone())
            }
            (_, None) => {
                self.label = None;
                Selection::Unselected
            }
        };

        let changed = next != self.state;
        if changed {
            tracing::debug!(from = ?self.state, to = ?next, "selection changed");
        }
        self.state = next;
        changed
    }

    /// Drop the selection without a click. Returns whether it changed.
    pub fn clear(&mut self) -> bool {
        self.label = None;
        let changed = self.state != Selection::Unselected;
        self.state = Selection::Unselected;
        changed
    }
}

/// Discrete pointer input in canvas pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up { x: f64, y: f64 },
    /// Positive notches zoom in
    Scroll { x: f64, y: f64, notches: f64 },
}

/// What the view should do in response to input
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureAction {
    Click { x: f64, y: f64 },
    /// Zoom about the viewport center
    ZoomBy(f64),
    /// Zoom keeping a pointer position fixed
    ZoomAt { factor: f64, x: f64, y: f64 },
    PanBy { dx: f64, dy: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum GestureState {
    Idle,
    Pressed { origin: (f64, f64) },
    Dragging { last: (f64, f64) },
}

/// Separates clicks from drags and maps drags to zoom or pan
#[derive(Debug)]
pub struct GestureMachine {
    state: GestureState,
    pub click_threshold: f64,
    pub drag_zoom_rate: f64,
    pub scroll_zoom_step: f64,
}

impl GestureMachine {
    pub fn new(drag_zoom_rate: f64, scroll_zoom_step: f64) -> Self {
        Self {
            state: GestureState::Idle,
            click_threshold: CLICK_THRESHOLD_PX,
            drag_zoom_rate,
            scroll_zoom_step,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    /// Feed one event. `drag_zooms` is true when a horizontal drag should
    /// zoom instead of pan (flat map at its minimum scale).
    pub fn handle(&mut self, event: InputEvent, drag_zooms: bool) -> Option<GestureAction> {
        match (self.state, event) {
            (_, InputEvent::Scroll { x, y, notches }) => Some(GestureAction::ZoomAt {
                factor: self.scroll_zoom_step.powf(notches),
                x,
                y,
            }),
            (_, InputEvent::Down { x, y }) => {
                self.state = GestureState::Pressed { origin: (x, y) };
                None
            }
            (GestureState::Pressed { origin }, InputEvent::Move { x, y }) => {
                let (dx, dy) = (x - origin.0, y - origin.1);
                if dx.hypot(dy) < self.click_threshold {
                    return None;
                }
                self.state = GestureState::Dragging { last: (x, y) };
                Some(self.drag(dx, dy, drag_zooms))
            }
            (GestureState::Dragging { last }, InputEvent::Move { x, y }) => {
                self.state = GestureState::Dragging { last: (x, y) };
                Some(self.drag(x - last.0, y - last.1, drag_zooms))
            }
            (GestureState::Pressed { .. }, InputEvent::Up { x, y }) => {
                self.state = GestureState::Idle;
                Some(GestureAction::Click { x, y })
            }
            (_, InputEvent::Up { .. }) => {
                self.state = GestureState::Idle;
                None
            }
            (GestureState::Idle, InputEvent::Move { .. }) => None,
        }
    }

    fn drag(&self, dx: f64, dy: f64, drag_zooms: bool) -> GestureAction {
        if drag_zooms {
            GestureAction::ZoomBy((dx * self.drag_zoom_rate).exp())
        } else {
            GestureAction::PanBy { dx, dy }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visit::normalize;
    use approx::assert_relative_eq;

    fn hit<'a>(key: &'a RegionKey, name: &'a str) -> Option<Hit<'a>> {
        Some(Hit { key, name })
    }

    #[test]
    fn test_click_same_region_twice_deselects() {
        let japan = normalize("Japan");
        let mut m = SelectionMachine::new();
        assert!(m.click(hit(&japan, "Japan"), (10.0, 20.0)));
        assert_eq!(m.state(), &Selection::Selected(japan.clone()));
        assert_eq!(m.label().map(|l| l.text.as_str()), Some("Japan"));
        assert!(m.click(hit(&japan, "Japan"), (10.0, 20.0)));
        assert_eq!(m.state(), &Selection::Unselected);
        assert!(m.label().is_none());
    }

    #[test]
    fn test_click_other_region_moves_selection() {
        let japan = normalize("Japan");
        let spain = normalize("Spain");
        let mut m = SelectionMachine::new();
        m.click(hit(&japan, "Japan"), (10.0, 20.0));
        assert!(m.click(hit(&spain, "Spain"), (40.0, 5.0)));
        assert_eq!(m.state(), &Selection::Selected(spain));
        let label = m.label().unwrap();
        assert_eq!(label.text, "Spain");
        assert_eq!(label.anchor, (40.0, 5.0));
    }

    #[test]
    fn test_click_outside_clears() {
        let japan = normalize("Japan");
        let mut m = SelectionMachine::new();
        assert!(!m.click(None, (0.0, 0.0)));
        m.click(hit(&japan, "Japan"), (1.0, 1.0));
        assert!(m.click(None, (0.0, 0.0)));
        assert_eq!(m.state(), &Selection::Unselected);
        assert!(m.label().is_none());
    }

    #[test]
    fn test_press_release_in_place_is_click() {
        let mut g = GestureMachine::new(0.01, 1.5);
        assert_eq!(g.handle(InputEvent::Down { x: 10.0, y: 10.0 }, false), None);
        assert_eq!(g.handle(InputEvent::Move { x: 11.0, y: 11.0 }, false), None);
        assert_eq!(
            g.handle(InputEvent::Up { x: 11.0, y: 11.0 }, false),
            Some(GestureAction::Click { x: 11.0, y: 11.0 })
        );
    }

    #[test]
    fn test_drag_pans_when_zoomed_in() {
        let mut g = GestureMachine::new(0.01, 1.5);
        g.handle(InputEvent::Down { x: 10.0, y: 10.0 }, false);
        assert_eq!(
            g.handle(InputEvent::Move { x: 20.0, y: 14.0 }, false),
            Some(GestureAction::PanBy { dx: 10.0, dy: 4.0 })
        );
        assert!(g.is_dragging());
        assert_eq!(
            g.handle(InputEvent::Move { x: 18.0, y: 14.0 }, false),
            Some(GestureAction::PanBy { dx: -2.0, dy: 0.0 })
        );
        // Releasing a drag is not a click
        assert_eq!(g.handle(InputEvent::Up { x: 18.0, y: 14.0 }, false), None);
        assert!(!g.is_dragging());
    }

    #[test]
    fn test_drag_zooms_at_min_scale() {
        let mut g = GestureMachine::new(0.01, 1.5);
        g.handle(InputEvent::Down { x: 0.0, y: 0.0 }, true);
        match g.handle(InputEvent::Move { x: 50.0, y: 0.0 }, true) {
            Some(GestureAction::ZoomBy(f)) => assert_relative_eq!(f, 0.5f64.exp()),
            other => panic!("expected zoom, got {other:?}"),
        }
    }

    #[test]
    fn test_scroll_zooms_at_pointer() {
        let mut g = GestureMachine::new(0.01, 1.5);
        assert_eq!(
            g.handle(InputEvent::Scroll { x: 5.0, y: 6.0, notches: 1.0 }, true),
            Some(GestureAction::ZoomAt { factor: 1.5, x: 5.0, y: 6.0 })
        );
        match g.handle(InputEvent::Scroll { x: 5.0, y: 6.0, notches: -1.0 }, true) {
            Some(GestureAction::ZoomAt { factor, .. }) => assert_relative_eq!(factor, 1.0 / 1.5),
            other => panic!("expected zoom, got {other:?}"),
        }
    }
}
