//! Tracked viewports: page elements with their own 3D sub-scene drawn on the shared
//! surface at the element's current position.

mod registry;

pub use registry::{ViewportFrame, ViewportHandle, ViewportHit, ViewportRegistry};

use crate::coords::Rect;
use crate::paint::Color;
use crate::scene::{Light, Mesh, MeshId, OrbitControls, PerspectiveCamera, SceneLayer};

/// Which scene layer something belongs to: the full-surface main scene or one
/// tracked viewport's sub-scene.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LayerKey {
    Main,
    Viewport(ViewportHandle),
}

/// A page element a viewport follows.
///
/// Measured every frame; nothing about its geometry is cached.
pub trait TrackedElement {
    /// Current bounds in document space (logical px, scroll-independent).
    ///
    /// `None` while the element is not laid out yet.
    fn document_rect(&self) -> Option<Rect>;
}

/// Builder for a viewport's sub-scene: camera, background, lights, meshes, controls.
#[derive(Debug)]
pub struct ViewportScene {
    layer: SceneLayer,
}

impl ViewportScene {
    pub fn new(camera: PerspectiveCamera) -> Self {
        Self { layer: SceneLayer::new(camera) }
    }

    pub fn background(mut self, color: Color) -> Self {
        self.layer.background = Some(color);
        self
    }

    pub fn light(mut self, light: Light) -> Self {
        self.layer.add_light(light);
        self
    }

    /// Attaches orbit controls built from the camera's current pose.
    pub fn orbit(mut self, configure: impl FnOnce(OrbitControls) -> OrbitControls) -> Self {
        self.layer.controls = Some(configure(OrbitControls::new(&self.layer.camera)));
        self
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.layer.add_mesh(mesh)
    }

    pub fn build(self) -> SceneLayer {
        self.layer
    }
}
