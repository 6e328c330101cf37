//! CyberShift engine crate.
//!
//! Platform and GPU runtime, plus the page's 3D layer: tracked viewports, scroll
//! timelines and the pulse cloth effect, composited on one shared surface.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
pub mod paint;
pub mod asset;

pub mod anim;
pub mod scene;
pub mod pulse;
pub mod viewport;
pub mod scroll;
pub mod compositor;
