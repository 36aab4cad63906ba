//! Pointer input and the toggle gesture.
//!
//! [`Input`] tracks the cursor, held buttons, and completed clicks from raw
//! window events. A click is a press and release of the same button; it
//! remembers where both happened so [`ToggleGesture`] can tell a tap from a
//! drag.
//!
//! # Usage
//!
//! ```ignore
//! // In the window event handler:
//! input.handle_event(&event);
//!
//! // Once per frame:
//! scene.handle_input(&input);
//! input.begin_frame();
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use winit::event::{ElementState, MouseButton as WinitMouseButton, TouchPhase, WindowEvent};

/// Mouse button identifiers. Touches count as [`MouseButton::Left`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl From<WinitMouseButton> for MouseButton {
    fn from(btn: WinitMouseButton) -> Self {
        match btn {
            WinitMouseButton::Left => MouseButton::Left,
            WinitMouseButton::Right => MouseButton::Right,
            WinitMouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Left,
        }
    }
}

/// A completed press and release, in window pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Click {
    pub button: MouseButton,
    pub press: Vec2,
    pub release: Vec2,
}

impl Click {
    /// Distance the pointer travelled between press and release.
    pub fn travel(&self) -> f32 {
        self.press.distance(self.release)
    }
}

/// Pointer state for one window.
#[derive(Debug, Default)]
pub struct Input {
    cursor: Option<Vec2>,
    mouse_held: HashSet<MouseButton>,
    press_origin: HashMap<MouseButton, Vec2>,
    clicks: Vec<Click>,
    window_size: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self {
            window_size: Vec2::new(800.0, 600.0),
            ..Default::default()
        }
    }

    /// Cursor position in pixels, `None` once it leaves the window.
    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    pub fn window_size(&self) -> Vec2 {
        self.window_size
    }

    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    /// Clicks completed since the last [`begin_frame`](Self::begin_frame).
    pub fn clicks(&self) -> &[Click] {
        &self.clicks
    }

    /// Clear per-frame state. Call after the frame has consumed its clicks.
    pub fn begin_frame(&mut self) {
        self.clicks.clear();
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = Vec2::new(width as f32, height as f32);
    }

    pub fn move_cursor(&mut self, position: Vec2) {
        self.cursor = Some(position);
    }

    pub fn leave(&mut self) {
        self.cursor = None;
    }

    pub fn press(&mut self, button: MouseButton, position: Vec2) {
        self.cursor = Some(position);
        self.mouse_held.insert(button);
        self.press_origin.insert(button, position);
    }

    /// Release `button`, recording a click if its press was seen.
    pub fn release(&mut self, button: MouseButton, position: Vec2) {
        self.cursor = Some(position);
        self.mouse_held.remove(&button);
        if let Some(press) = self.press_origin.remove(&button) {
            self.clicks.push(Click {
                button,
                press,
                release: position,
            });
        }
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                let btn = MouseButton::from(*button);
                // buttons without a cursor position are ignored
                let Some(position) = self.cursor else {
                    return;
                };
                match state {
                    ElementState::Pressed => self.press(btn, position),
                    ElementState::Released => self.release(btn, position),
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.move_cursor(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::CursorLeft { .. } => self.leave(),

            WindowEvent::Resized(size) => self.set_window_size(size.width, size.height),

            WindowEvent::Touch(touch) => {
                let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                match touch.phase {
                    TouchPhase::Started => self.press(MouseButton::Left, position),
                    TouchPhase::Moved => self.move_cursor(position),
                    TouchPhase::Ended => {
                        self.release(MouseButton::Left, position);
                        self.leave();
                    }
                    TouchPhase::Cancelled => {
                        self.mouse_held.remove(&MouseButton::Left);
                        self.press_origin.remove(&MouseButton::Left);
                        self.leave();
                    }
                }
            }

            _ => {}
        }
    }
}

/// What a click has to land on to toggle the tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToggleTrigger {
    /// An on-screen button centered horizontally at the bottom of the viewport.
    Button {
        width: f32,
        height: f32,
        bottom_margin: f32,
    },
    /// Anywhere in the viewport.
    ScreenTap,
}

impl ToggleTrigger {
    pub fn button() -> Self {
        ToggleTrigger::Button {
            width: 240.0,
            height: 52.0,
            bottom_margin: 40.0,
        }
    }

    /// Button rectangle as `(min, max)` corners, if this trigger has one.
    pub fn button_rect(&self, viewport: Vec2) -> Option<(Vec2, Vec2)> {
        match *self {
            ToggleTrigger::Button {
                width,
                height,
                bottom_margin,
            } => {
                let max_y = viewport.y - bottom_margin;
                let min = Vec2::new((viewport.x - width) * 0.5, max_y - height);
                let max = Vec2::new((viewport.x + width) * 0.5, max_y);
                Some((min, max))
            }
            ToggleTrigger::ScreenTap => None,
        }
    }

    pub fn hit(&self, position: Vec2, viewport: Vec2) -> bool {
        match self.button_rect(viewport) {
            Some((min, max)) => position.cmpge(min).all() && position.cmple(max).all(),
            None => position.cmpge(Vec2::ZERO).all() && position.cmple(viewport).all(),
        }
    }

    /// Whether the pointer is over UI rather than the scene.
    pub fn blocks_pointer(&self, position: Vec2, viewport: Vec2) -> bool {
        matches!(self, ToggleTrigger::Button { .. }) && self.hit(position, viewport)
    }
}

impl Default for ToggleTrigger {
    fn default() -> Self {
        Self::button()
    }
}

/// Recognizes the click that flips the assembled target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToggleGesture {
    pub trigger: ToggleTrigger,
    /// Largest press-to-release travel, in pixels, still counted as a tap.
    pub tap_slop: f32,
}

impl ToggleGesture {
    pub fn new(trigger: ToggleTrigger, tap_slop: f32) -> Self {
        Self { trigger, tap_slop }
    }

    pub fn is_toggle(&self, click: &Click, viewport: Vec2) -> bool {
        click.button == MouseButton::Left
            && click.travel() < self.tap_slop
            && self.trigger.hit(click.press, viewport)
            && self.trigger.hit(click.release, viewport)
    }

    /// Number of toggles among `clicks`.
    pub fn count(&self, clicks: &[Click], viewport: Vec2) -> usize {
        clicks.iter().filter(|c| self.is_toggle(c, viewport)).count()
    }
}

impl Default for ToggleGesture {
    fn default() -> Self {
        Self::new(ToggleTrigger::default(), 6.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Vec2 = Vec2::new(800.0, 600.0);

    fn click(press: Vec2, release: Vec2) -> Click {
        Click {
            button: MouseButton::Left,
            press,
            release,
        }
    }

    #[test]
    fn test_click_recorded_on_release() {
        let mut input = Input::new();
        input.press(MouseButton::Left, Vec2::new(10.0, 10.0));
        assert!(input.mouse_held(MouseButton::Left));
        assert!(input.clicks().is_empty());

        input.release(MouseButton::Left, Vec2::new(12.0, 10.0));
        assert!(!input.mouse_held(MouseButton::Left));
        assert_eq!(input.clicks().len(), 1);
        assert_eq!(input.clicks()[0].travel(), 2.0);

        input.begin_frame();
        assert!(input.clicks().is_empty());
    }

    #[test]
    fn test_release_without_press() {
        let mut input = Input::new();
        input.release(MouseButton::Right, Vec2::ZERO);
        assert!(input.clicks().is_empty());
    }

    #[test]
    fn test_cursor_leave() {
        let mut input = Input::new();
        input.move_cursor(Vec2::new(3.0, 4.0));
        assert_eq!(input.cursor(), Some(Vec2::new(3.0, 4.0)));
        input.leave();
        assert_eq!(input.cursor(), None);
    }

    #[test]
    fn test_button_rect() {
        let (min, max) = ToggleTrigger::button().button_rect(VIEWPORT).unwrap();
        assert_eq!(min, Vec2::new(280.0, 508.0));
        assert_eq!(max, Vec2::new(520.0, 560.0));
        assert!(ToggleTrigger::ScreenTap.button_rect(VIEWPORT).is_none());
    }

    #[test]
    fn test_button_toggle() {
        let gesture = ToggleGesture::default();
        let on_button = Vec2::new(400.0, 530.0);
        assert!(gesture.is_toggle(&click(on_button, on_button), VIEWPORT));

        let off_button = Vec2::new(400.0, 300.0);
        assert!(!gesture.is_toggle(&click(off_button, off_button), VIEWPORT));
        assert!(gesture.trigger.blocks_pointer(on_button, VIEWPORT));
        assert!(!gesture.trigger.blocks_pointer(off_button, VIEWPORT));
    }

    #[test]
    fn test_drag_is_not_a_tap() {
        let gesture = ToggleGesture::new(ToggleTrigger::ScreenTap, 6.0);
        let start = Vec2::new(100.0, 100.0);
        assert!(gesture.is_toggle(&click(start, start + Vec2::new(3.0, 0.0)), VIEWPORT));
        assert!(!gesture.is_toggle(&click(start, start + Vec2::new(40.0, 0.0)), VIEWPORT));

        let right = Click {
            button: MouseButton::Right,
            press: start,
            release: start,
        };
        assert!(!gesture.is_toggle(&right, VIEWPORT));
        assert!(!gesture.trigger.blocks_pointer(start, VIEWPORT));
    }

    #[test]
    fn test_trigger_serde() {
        let json = serde_json::to_string(&ToggleTrigger::ScreenTap).unwrap();
        assert_eq!(json, r#"{"kind":"screen_tap"}"#);
        let parsed: ToggleTrigger =
            serde_json::from_str(r#"{"kind":"button","width":100.0,"height":40.0,"bottom_margin":10.0}"#)
                .unwrap();
        assert!(matches!(parsed, ToggleTrigger::Button { width, .. } if width == 100.0));
    }
}
