//! Platform-agnostic input tracking
use std::collections::HashSet;
use std::rc::Rc;

use glam::Vec2;

use crate::model::ViewerContext;

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events
    KeyDown(String),
    KeyUp(String),

    // Pointer events, positions in viewport pixels (top-left origin)
    PointerMove { x: f32, y: f32 },
    PointerButton { button: MouseButton, is_down: bool, x: f32, y: f32 },

    // Window events
    FocusLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Other(i16),
}

impl MouseButton {
    pub fn from_web_button(button: i16) -> Self {
        match button {
            0 => MouseButton::Left,
            2 => MouseButton::Right,
            other => MouseButton::Other(other),
        }
    }
}

/// Key identifiers are compared after folding single characters to lower case,
/// so "W" typed with shift held is the same key as "w".
pub fn normalize_key(key: &str) -> String {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_lowercase().collect(),
        _ => key.to_string(),
    }
}

/// Input state at one sampling instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub left_button: bool,
    pub right_button: bool,
    /// Pointer offset from the viewport centre, in pixels.
    pub pointer: Vec2,
    /// Pointer displacement since the previous snapshot.
    pub pointer_delta: Vec2,
    pub held_keys: HashSet<String>,
}

impl InputSnapshot {
    pub fn is_key_held(&self, key: &str) -> bool {
        self.held_keys.contains(&normalize_key(key))
    }
}

/// Accumulates raw events into a current snapshot and rolls it into the
/// previous one once per frame.
#[derive(Debug)]
pub struct InputTracker {
    context: Rc<ViewerContext>,
    current: InputSnapshot,
    previous: Option<InputSnapshot>,
}

impl InputTracker {
    pub fn new(context: Rc<ViewerContext>) -> Self {
        Self {
            context,
            current: InputSnapshot::default(),
            previous: None,
        }
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => self.on_key_down(key),
            InputEvent::KeyUp(key) => self.on_key_up(key),
            InputEvent::PointerMove { x, y } => self.on_pointer_move(*x, *y),
            InputEvent::PointerButton { button, is_down, x, y } => {
                if *is_down {
                    self.on_pointer_down(*button, *x, *y);
                } else {
                    self.on_pointer_up(*button, *x, *y);
                }
            }
            InputEvent::FocusLost => self.clear_keys(),
        }
    }

    /// Non-finite coordinates are dropped.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if !x.is_finite() || !y.is_finite() {
            tracing::debug!(x, y, "ignoring non-finite pointer sample");
            return;
        }
        self.current.pointer = Vec2::new(x, y) - self.context.viewport().center();

        if self.previous.is_none() {
            tracing::debug!(pointer = ?self.current.pointer, "first pointer sample");
            self.previous = Some(self.current.clone());
        }

        self.refresh_delta();
    }

    pub fn on_pointer_down(&mut self, button: MouseButton, x: f32, y: f32) {
        self.on_pointer_move(x, y);
        self.set_button(button, true);
    }

    pub fn on_pointer_up(&mut self, button: MouseButton, x: f32, y: f32) {
        self.on_pointer_move(x, y);
        self.set_button(button, false);
    }

    pub fn on_key_down(&mut self, key: &str) {
        self.current.held_keys.insert(normalize_key(key));
    }

    pub fn on_key_up(&mut self, key: &str) {
        self.current.held_keys.remove(&normalize_key(key));
    }

    pub fn is_key_held(&self, key: &str) -> bool {
        self.current.is_key_held(key)
    }

    /// Drops held keys and buttons, e.g. when the page loses focus and key-up
    /// events would never arrive.
    pub fn clear_keys(&mut self) {
        self.current.held_keys.clear();
        self.current.left_button = false;
        self.current.right_button = false;
    }

    /// Recompute deltas against the previous snapshot, then make the current
    /// snapshot the new previous one. Returns the rolled snapshot, or `None`
    /// while no pointer sample exists yet.
    pub fn advance_frame(&mut self, _elapsed: f32) -> Option<&InputSnapshot> {
        self.previous.as_ref()?;
        self.refresh_delta();
        self.previous = Some(self.current.clone());
        self.previous.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.previous.is_some()
    }

    pub fn current(&self) -> &InputSnapshot {
        &self.current
    }

    pub fn previous(&self) -> Option<&InputSnapshot> {
        self.previous.as_ref()
    }

    pub fn context(&self) -> &Rc<ViewerContext> {
        &self.context
    }

    fn refresh_delta(&mut self) {
        if let Some(prev) = &self.previous {
            self.current.pointer_delta = self.current.pointer - prev.pointer;
        }
    }

    fn set_button(&mut self, button: MouseButton, down: bool) {
        match button {
            MouseButton::Left => self.current.left_button = down,
            MouseButton::Right => self.current.right_button = down,
            MouseButton::Other(_) => {}
        }
    }
}

/// Key mapping configuration
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBindings {
    pub forward: String,
    pub backward: String,
    pub left: String,
    pub right: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: "w".to_string(),
            backward: "s".to_string(),
            left: "a".to_string(),
            right: "d".to_string(),
        }
    }
}

/// Maps held keys to movement axes
#[derive(Debug, Clone, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn is_moving_forward(&self, input: &InputSnapshot) -> bool {
        self.held(input, &self.bindings.forward) || input.is_key_held("ArrowUp")
    }

    pub fn is_moving_backward(&self, input: &InputSnapshot) -> bool {
        self.held(input, &self.bindings.backward) || input.is_key_held("ArrowDown")
    }

    pub fn is_moving_left(&self, input: &InputSnapshot) -> bool {
        self.held(input, &self.bindings.left) || input.is_key_held("ArrowLeft")
    }

    pub fn is_moving_right(&self, input: &InputSnapshot) -> bool {
        self.held(input, &self.bindings.right) || input.is_key_held("ArrowRight")
    }

    /// +1 forward, -1 backward, 0 for neither or both.
    pub fn forward_axis(&self, input: &InputSnapshot) -> f32 {
        axis(self.is_moving_forward(input), self.is_moving_backward(input))
    }

    /// +1 left, -1 right, 0 for neither or both.
    pub fn strafe_axis(&self, input: &InputSnapshot) -> f32 {
        axis(self.is_moving_left(input), self.is_moving_right(input))
    }

    /// Whether the default browser action should be suppressed for this key.
    pub fn is_navigation_key(&self, key: &str) -> bool {
        let key = normalize_key(key);
        [&self.bindings.forward, &self.bindings.backward, &self.bindings.left, &self.bindings.right]
            .iter()
            .any(|b| normalize_key(b) == key)
            || matches!(key.as_str(), "ArrowUp" | "ArrowDown" | "ArrowLeft" | "ArrowRight")
    }

    fn held(&self, input: &InputSnapshot, binding: &str) -> bool {
        input.is_key_held(binding)
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    (if positive { 1.0 } else { 0.0 }) + (if negative { -1.0 } else { 0.0 })
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::*;
    use web_sys::{KeyboardEvent, MouseEvent};

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        let key = e.key();
        if is_down {
            InputEvent::KeyDown(key)
        } else {
            InputEvent::KeyUp(key)
        }
    }

    pub fn mouse_move_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::PointerMove {
            x: e.page_x() as f32,
            y: e.page_y() as f32,
        }
    }

    pub fn mouse_button_to_input(e: &MouseEvent, is_down: bool) -> InputEvent {
        InputEvent::PointerButton {
            button: MouseButton::from_web_button(e.button()),
            is_down,
            x: e.page_x() as f32,
            y: e.page_y() as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Viewport;

    fn tracker() -> InputTracker {
        InputTracker::new(Rc::new(ViewerContext::new(Viewport::new(800.0, 600.0))))
    }

    #[test]
    fn test_first_move_has_zero_delta() {
        let mut input = tracker();
        assert!(!input.is_initialized());
        input.on_pointer_move(700.0, 20.0);
        assert!(input.is_initialized());
        assert_eq!(input.current().pointer, Vec2::new(300.0, -280.0));
        assert_eq!(input.current().pointer_delta, Vec2::ZERO);
    }

    #[test]
    fn test_later_moves_delta_against_previous() {
        let mut input = tracker();
        input.on_pointer_move(400.0, 300.0);
        input.on_pointer_move(410.0, 295.0);
        assert_eq!(input.current().pointer_delta, Vec2::new(10.0, -5.0));

        // Still measured from the seeded snapshot until a frame rolls it.
        input.on_pointer_move(420.0, 300.0);
        assert_eq!(input.current().pointer_delta, Vec2::new(20.0, 0.0));

        input.advance_frame(0.016);
        input.on_pointer_move(421.0, 310.0);
        assert_eq!(input.current().pointer_delta, Vec2::new(1.0, 10.0));
    }

    #[test]
    fn test_advance_frame_before_first_move_is_noop() {
        let mut input = tracker();
        input.on_key_down("w");
        assert!(input.advance_frame(0.016).is_none());
        assert!(!input.is_initialized());
        assert!(input.previous().is_none());
    }

    #[test]
    fn test_advance_frame_rolls_snapshot() {
        let mut input = tracker();
        input.on_pointer_move(400.0, 300.0);
        input.on_pointer_move(450.0, 300.0);

        let rolled = input.advance_frame(0.016).cloned().unwrap();
        assert_eq!(rolled.pointer_delta, Vec2::new(50.0, 0.0));
        assert_eq!(input.previous(), Some(&rolled));
        assert_eq!(input.current(), &rolled);

        // A frame without movement settles the delta back to zero.
        let rolled = input.advance_frame(0.016).cloned().unwrap();
        assert_eq!(rolled.pointer_delta, Vec2::ZERO);
        assert!(input.is_initialized());
    }

    #[test]
    fn test_buttons_refresh_pointer() {
        let mut input = tracker();
        input.on_pointer_down(MouseButton::Left, 400.0, 300.0);
        assert!(input.is_initialized());
        assert!(input.current().left_button);

        input.on_pointer_down(MouseButton::Right, 405.0, 300.0);
        assert!(input.current().right_button);
        assert_eq!(input.current().pointer_delta, Vec2::new(5.0, 0.0));

        input.on_pointer_up(MouseButton::Left, 405.0, 300.0);
        assert!(!input.current().left_button);
        assert!(input.current().right_button);
    }

    #[test]
    fn test_unknown_button_ignored() {
        let mut input = tracker();
        input.process_event(&InputEvent::PointerButton {
            button: MouseButton::from_web_button(1),
            is_down: true,
            x: 0.0,
            y: 0.0,
        });
        assert!(!input.current().left_button);
        assert!(!input.current().right_button);
        assert!(input.is_initialized());
    }

    #[test]
    fn test_keys_held_and_released() {
        let mut input = tracker();
        input.process_event(&InputEvent::KeyDown("W".to_string()));
        assert!(input.is_key_held("w"));
        assert!(input.is_key_held("W"));
        assert!(!input.is_key_held("Unidentified"));

        input.process_event(&InputEvent::KeyUp("w".to_string()));
        assert!(!input.is_key_held("w"));

        // Releasing a key that was never pressed is harmless.
        input.on_key_up("q");
        assert!(input.current().held_keys.is_empty());
    }

    #[test]
    fn test_focus_lost_clears_keys() {
        let mut input = tracker();
        input.on_key_down("w");
        input.on_key_down("Shift");
        input.on_pointer_down(MouseButton::Left, 1.0, 1.0);
        input.process_event(&InputEvent::FocusLost);
        assert!(input.current().held_keys.is_empty());
        assert!(!input.current().left_button);
    }

    #[test]
    fn test_non_finite_pointer_samples_ignored() {
        let mut input = tracker();
        input.on_pointer_move(f32::NAN, 300.0);
        assert!(!input.is_initialized());

        input.on_pointer_move(400.0, 300.0);
        input.on_pointer_move(f32::INFINITY, 310.0);
        input.on_pointer_move(410.0, f32::NEG_INFINITY);
        assert_eq!(input.current().pointer, Vec2::ZERO);
        assert_eq!(input.current().pointer_delta, Vec2::ZERO);

        // The button state still changes even when the position is unusable.
        input.on_pointer_down(MouseButton::Left, f32::NAN, f32::NAN);
        assert!(input.current().left_button);
        assert!(input.current().pointer.is_finite());

        input.on_pointer_move(420.0, 305.0);
        assert_eq!(input.current().pointer_delta, Vec2::new(20.0, 5.0));
    }

    #[test]
    fn test_snapshot_key_lookup_is_normalized() {
        let mut input = tracker();
        input.on_key_down("w");
        assert!(input.current().is_key_held("W"));
        assert!(input.current().is_key_held("w"));
        assert!(!input.current().is_key_held("S"));
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("A"), "a");
        assert_eq!(normalize_key("ArrowUp"), "ArrowUp");
        assert_eq!(normalize_key(" "), " ");
        assert_eq!(normalize_key(""), "");
    }

    #[test]
    fn test_axes_cancel() {
        let processor = InputProcessor::default();
        let mut input = tracker();
        assert_eq!(processor.forward_axis(input.current()), 0.0);

        input.on_key_down("w");
        assert_eq!(processor.forward_axis(input.current()), 1.0);
        input.on_key_down("s");
        assert_eq!(processor.forward_axis(input.current()), 0.0);

        input.on_key_down("d");
        assert_eq!(processor.strafe_axis(input.current()), -1.0);
        input.on_key_down("ArrowLeft");
        assert_eq!(processor.strafe_axis(input.current()), 0.0);
    }

    #[test]
    fn test_custom_bindings() {
        let processor = InputProcessor::new(KeyBindings {
            forward: "Z".to_string(),
            backward: "s".to_string(),
            left: "q".to_string(),
            right: "d".to_string(),
        });
        let mut input = tracker();
        input.on_key_down("z");
        assert_eq!(processor.forward_axis(input.current()), 1.0);
        assert!(processor.is_navigation_key("Q"));
        assert!(processor.is_navigation_key("ArrowDown"));
        assert!(!processor.is_navigation_key("w"));
    }
}
