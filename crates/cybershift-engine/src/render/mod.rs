//! GPU rendering subsystem.
//!
//! Two families of renderers live here:
//! - Page renderers (`FillRenderer`, `RingRenderer`, `ImageRenderer`) draw document-space
//!   rectangles straight onto the surface. CPU geometry is in logical pixels (top-left
//!   origin, +Y down) and the vertex shaders subtract the scroll offset.
//! - Scene renderers (`MeshRenderer`, `BackdropRenderer`) draw `scene` layers into the
//!   shared offscreen target, which `BlitRenderer` then composites onto the surface.
//!
//! Each renderer owns its GPU resources. One instance writes its buffers once per
//! frame, so callers that draw the same kind of thing twice in a frame keep two.

mod backdrop;
mod common;
mod ctx;
mod fill;
mod image;
mod material;
mod mesh;
mod offscreen;
mod ring;

pub use backdrop::BackdropRenderer;
pub use ctx::{RenderCtx, RenderTarget};
pub use fill::{Fill, FillRenderer};
pub use image::{cover_uv, ImageDraw, ImageRenderer};
pub use material::{MaterialPipeline, MaterialRegistry, MeshTopology, PipelineDesc, PipelineFactory};
pub use mesh::{LayerDraw, MeshRenderer};
pub use offscreen::{BlitRenderer, OffscreenTarget};
pub use ring::{Ring, RingRenderer};
