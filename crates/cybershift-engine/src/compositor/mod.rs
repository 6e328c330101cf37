//! The shared 3D layer under the page.
//!
//! One offscreen target per frame: the main scene fills it, every tracked viewport is
//! drawn into its own visible rect on top, and the result is blitted onto the surface
//! before the page foreground. The render scale follows [`AdaptiveQuality`].
//!
//! [`AdaptiveQuality`]: crate::time::AdaptiveQuality

mod plan;
mod surface;
mod targets;

pub use plan::{effective_pixel_ratio, FramePlan, PlannedLayer};
pub use surface::{Compositor, PlaneHit};
