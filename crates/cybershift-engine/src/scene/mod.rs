//! Retained 3D scene content.
//!
//! A [`SceneLayer`] owns its camera, optional orbit controls, lights and meshes.
//! Layers are CPU-side descriptions; `render::MeshRenderer` turns them into draws.
//!
//! World space is right-handed, +Y up, camera looking down -Z.

mod camera;
mod controls;
mod geometry;
mod layer;
mod light;
mod material;
mod raycast;
mod transform;

pub use camera::PerspectiveCamera;
pub use controls::OrbitControls;
pub use geometry::{wireframe_indices, Geometry, GeometryId, Vertex};
pub use layer::{Mesh, MeshId, SceneLayer};
pub use light::{GpuLight, Light, LightsUniform, MAX_LIGHTS};
pub use material::{Material, MaterialKind, MaterialParam, StandardMaterial, WireframeMaterial};
pub use raycast::Ray;
pub use transform::Transform;
