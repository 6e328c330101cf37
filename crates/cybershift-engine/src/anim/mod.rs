//! Animation primitives: easing curves, wall-clock tweens and damping.
//!
//! Scroll-driven animation lives in [`crate::scroll`]; it reuses the easing
//! and smoothing defined here.

mod damp;
mod ease;
mod tween;

pub use damp::{damp, lambda_for_lerp, SmoothDamp};
pub use ease::{Ease, EaseDir, EaseParseError};
pub use tween::{Lerp, Tween};
