use std::collections::HashSet;

use glam::Vec2;

use super::frame::InputFrame;
use super::types::{
    InputEvent, Key, KeyState, Modifiers, MouseButton, MouseButtonState, MouseWheelDelta,
    PointerButtonEvent,
};

/// Maximum pointer travel (logical px) between press and release for a click.
/// Anything longer is a drag (orbit controls, gallery swipe).
pub const CLICK_SLOP: f32 = 5.0;

/// Current input state for a single window.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,

    pub focused: bool,

    /// Pointer position in logical pixels; `None` while outside the window.
    pub pointer_pos: Option<Vec2>,

    pub keys_down: HashSet<Key>,

    pub buttons_down: HashSet<MouseButton>,

    /// Where the left button went down, while it is held.
    pub press_origin: Option<Vec2>,
}

impl InputState {
    /// Applies a platform-agnostic input event to the current state and writes deltas to `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match &ev {
            InputEvent::ModifiersChanged(m) => self.modifiers = *m,

            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Avoid stuck keys/buttons when focus changes mid-press.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                    self.press_origin = None;
                }
            }

            InputEvent::PointerMoved(p) => {
                if let Some(prev) = self.pointer_pos {
                    frame.pointer_delta += *p - prev;
                }
                self.pointer_pos = Some(*p);
            }

            InputEvent::PointerLeft => self.pointer_pos = None,

            InputEvent::Key { key, state, modifiers, .. } => {
                self.modifiers = *modifiers;
                match state {
                    KeyState::Pressed => {
                        self.keys_down.insert(*key);
                        frame.keys_pressed.insert(*key);
                    }
                    KeyState::Released => {
                        self.keys_down.remove(key);
                    }
                }
            }

            InputEvent::PointerButton(PointerButtonEvent { button, state, position, modifiers }) => {
                self.pointer_pos = Some(*position);
                self.modifiers = *modifiers;

                match state {
                    MouseButtonState::Pressed => {
                        if self.buttons_down.insert(*button) {
                            frame.buttons_pressed.insert(*button);
                        }
                        if *button == MouseButton::Left {
                            self.press_origin = Some(*position);
                        }
                    }
                    MouseButtonState::Released => {
                        if self.buttons_down.remove(button) {
                            frame.buttons_released.insert(*button);
                        }
                        if *button == MouseButton::Left {
                            if let Some(origin) = self.press_origin.take() {
                                if origin.distance(*position) <= CLICK_SLOP {
                                    frame.clicks.push(*position);
                                }
                            }
                        }
                    }
                }
            }

            InputEvent::MouseWheel { delta, modifiers } => {
                self.modifiers = *modifiers;
                frame.wheel_modifiers = *modifiers;
                match delta {
                    MouseWheelDelta::Line { x, y } => frame.wheel_lines += Vec2::new(*x, *y),
                    MouseWheelDelta::Pixel { x, y } => frame.wheel_pixels += Vec2::new(*x, *y),
                }
            }
        }

        frame.push_event(ev);
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }

    /// True while the left button is held and the pointer has left the click slop.
    pub fn is_dragging(&self) -> bool {
        match (self.press_origin, self.pointer_pos) {
            (Some(origin), Some(p)) => origin.distance(p) > CLICK_SLOP,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(state: MouseButtonState, x: f32, y: f32) -> InputEvent {
        InputEvent::PointerButton(PointerButtonEvent {
            button: MouseButton::Left,
            state,
            position: Vec2::new(x, y),
            modifiers: Modifiers::default(),
        })
    }

    #[test]
    fn press_release_in_place_is_a_click() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        s.apply_event(&mut f, button(MouseButtonState::Pressed, 10.0, 10.0));
        s.apply_event(&mut f, button(MouseButtonState::Released, 12.0, 11.0));
        assert_eq!(f.clicks, vec![Vec2::new(12.0, 11.0)]);
    }

    #[test]
    fn long_travel_is_a_drag_not_a_click() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        s.apply_event(&mut f, button(MouseButtonState::Pressed, 10.0, 10.0));
        s.apply_event(&mut f, InputEvent::PointerMoved(Vec2::new(60.0, 10.0)));
        assert!(s.is_dragging());
        s.apply_event(&mut f, button(MouseButtonState::Released, 60.0, 10.0));
        assert!(f.clicks.is_empty());
        assert_eq!(f.pointer_delta, Vec2::new(50.0, 0.0));
    }

    #[test]
    fn wheel_accumulates_by_kind() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        let m = Modifiers::default();
        s.apply_event(&mut f, InputEvent::MouseWheel { delta: MouseWheelDelta::Line { x: 0.0, y: -1.0 }, modifiers: m });
        s.apply_event(&mut f, InputEvent::MouseWheel { delta: MouseWheelDelta::Pixel { x: 0.0, y: -20.0 }, modifiers: m });
        assert_eq!(f.wheel_delta(40.0), Vec2::new(0.0, -60.0));
    }

    #[test]
    fn focus_loss_clears_held_state() {
        let mut s = InputState::default();
        let mut f = InputFrame::default();
        s.apply_event(&mut f, button(MouseButtonState::Pressed, 0.0, 0.0));
        s.apply_event(&mut f, InputEvent::Focused(false));
        assert!(!s.button_down(MouseButton::Left));
        assert!(s.press_origin.is_none());
    }
}
