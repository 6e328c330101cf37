//! Scroll-driven timelines.
//!
//! A timeline maps the scroll position through a page region to a progress in
//! `[0, 1]` and writes `lerp(from, to, ease(progress))` into scene properties every
//! tick. Nothing is timed by the wall clock except the optional scrub lag.

mod binder;
mod position;
mod property;

pub use binder::{
    progress, PinSpan, PropertyTween, RegionId, RegionSource, Scrub, ScrollBinder, ScrollTrigger,
    TimelineHandle, TimelineId,
};
pub use position::{Anchor, Edge, ScrollPosition, ScrollPositionParseError};
pub use property::{Axis, PropertyPath, PropertyPathError, PropertyTargets, TargetRef};
