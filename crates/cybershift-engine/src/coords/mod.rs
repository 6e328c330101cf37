//! Coordinate and geometry types shared by the page layer and the compositor.
//!
//! Canonical CPU space:
//! - Logical pixels (DPI-aware)
//! - Origin top-left
//! - +X right, +Y down
//!
//! Page geometry lives in *document* space (scroll-independent). The compositor
//! converts to *surface* space by subtracting the scroll offset and multiplying by
//! the effective pixel ratio (`scale_factor * render_scale`).

mod pixel_rect;
mod rect;
mod viewport;

pub use pixel_rect::{PixelRect, ViewportRect};
pub use rect::Rect;
pub use viewport::{SurfaceMetrics, Viewport};

pub use glam::Vec2;
