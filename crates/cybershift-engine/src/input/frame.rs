use std::collections::HashSet;

use glam::Vec2;

use super::types::{InputEvent, Key, Modifiers, MouseButton};

/// Per-frame input deltas.
///
/// `InputState` holds what is currently down; `InputFrame` holds what happened since
/// the previous frame. The runtime clears it after every `on_frame`.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Raw events in arrival order.
    pub events: Vec<InputEvent>,

    /// Keys pressed this frame (repeats included, so held PageDown keeps scrolling).
    pub keys_pressed: HashSet<Key>,

    /// Mouse buttons pressed this frame.
    pub buttons_pressed: HashSet<MouseButton>,

    /// Mouse buttons released this frame.
    pub buttons_released: HashSet<MouseButton>,

    /// Left-button clicks (press and release within [`CLICK_SLOP`](super::CLICK_SLOP)),
    /// at the release position.
    pub clicks: Vec<Vec2>,

    /// Sum of pointer movement this frame, in logical pixels.
    pub pointer_delta: Vec2,

    /// Accumulated wheel input in lines (notched wheels).
    pub wheel_lines: Vec2,

    /// Accumulated wheel input in logical pixels (touchpads).
    pub wheel_pixels: Vec2,

    /// Modifiers held during the last wheel event.
    pub wheel_modifiers: Modifiers,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.events.clear();
        self.keys_pressed.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.clicks.clear();
        self.pointer_delta = Vec2::ZERO;
        self.wheel_lines = Vec2::ZERO;
        self.wheel_pixels = Vec2::ZERO;
        self.wheel_modifiers = Modifiers::default();
    }

    pub fn push_event(&mut self, ev: InputEvent) {
        self.events.push(ev);
    }

    /// Wheel input converted to pixels with the given line height.
    pub fn wheel_delta(&self, line_height: f32) -> Vec2 {
        self.wheel_pixels + self.wheel_lines * line_height
    }
}
