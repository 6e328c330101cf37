//! Color model shared by scene content, backgrounds and the page layer.
//!
//! Colors are stored as straight-alpha *linear* RGBA. Hex literals coming from the
//! design system are sRGB and are decoded on construction; the sRGB surface
//! format re-encodes on output.

mod color;

pub use color::Color;
