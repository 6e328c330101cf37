//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types. The runtime
//! translates window events into `InputEvent`s; input is only *recorded* here and
//! consumed by the app at the start of the next frame.

mod frame;
mod state;
mod types;

pub use frame::InputFrame;
pub use state::{InputState, CLICK_SLOP};
pub use types::{
    InputEvent,
    Key,
    KeyState,
    Modifiers,
    MouseButton,
    MouseButtonState,
    MouseWheelDelta,
    PointerButtonEvent,
};
