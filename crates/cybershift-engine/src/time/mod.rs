//! Time subsystem.
//!
//! - one `FrameClock` per window; `tick()` once per presented frame
//! - `AdaptiveQuality` turns observed frame times into a render scale and an
//!   event-sampling stride (the throughput/latency trade-off under load)

mod adaptive;
mod frame_clock;

pub use adaptive::{AdaptiveConfig, AdaptiveQuality};
pub use frame_clock::{FrameClock, FrameTime};
