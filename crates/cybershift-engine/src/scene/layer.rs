use std::rc::Rc;

use crate::paint::Color;

use super::{Geometry, Light, Material, OrbitControls, PerspectiveCamera, Transform};

/// Mesh identifier, unique within its layer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Rc<Geometry>,
    pub material: Material,
    pub transform: Transform,
    pub visible: bool,
}

impl Mesh {
    pub fn new(geometry: Rc<Geometry>, material: Material, transform: Transform) -> Self {
        Self { geometry, material, transform, visible: true }
    }
}

/// One independently rendered 3D scene: the main full-surface scene or a tracked
/// viewport's sub-scene.
///
/// Meshes draw in insertion order.
#[derive(Debug)]
pub struct SceneLayer {
    /// Fill behind the meshes; `None` leaves whatever is beneath visible.
    pub background: Option<Color>,
    pub camera: PerspectiveCamera,
    pub controls: Option<OrbitControls>,
    lights: Vec<Light>,
    meshes: Vec<(MeshId, Mesh)>,
    next_id: u32,
}

impl SceneLayer {
    pub fn new(camera: PerspectiveCamera) -> Self {
        Self {
            background: None,
            camera,
            controls: None,
            lights: Vec::new(),
            meshes: Vec::new(),
            next_id: 0,
        }
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        let id = MeshId(self.next_id);
        self.next_id += 1;
        self.meshes.push((id, mesh));
        id
    }

    pub fn remove_mesh(&mut self, id: MeshId) -> Option<Mesh> {
        let idx = self.meshes.iter().position(|(m, _)| *m == id)?;
        Some(self.meshes.remove(idx).1)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.iter().find(|(m, _)| *m == id).map(|(_, mesh)| mesh)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.iter_mut().find(|(m, _)| *m == id).map(|(_, mesh)| mesh)
    }

    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &Mesh)> {
        self.meshes.iter().map(|(id, m)| (*id, m))
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Per-frame update: orbit controls and cloth clocks.
    pub fn update(&mut self, time: f32, dt: f32) {
        if let Some(controls) = self.controls.as_mut() {
            controls.update(&mut self.camera, dt);
        }
        for (_, mesh) in self.meshes.iter_mut() {
            if let Some(cloth) = mesh.material.as_cloth_mut() {
                cloth.advance(time);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::StandardMaterial;

    fn mesh() -> Mesh {
        Mesh::new(
            Rc::new(Geometry::plane(1.0, 1.0, 1, 1)),
            Material::Standard(StandardMaterial::default()),
            Transform::default(),
        )
    }

    #[test]
    fn ids_are_stable_after_removal() {
        let mut layer = SceneLayer::new(PerspectiveCamera::default());
        let a = layer.add_mesh(mesh());
        let b = layer.add_mesh(mesh());
        assert!(layer.remove_mesh(a).is_some());
        assert!(layer.mesh(a).is_none());
        assert!(layer.mesh(b).is_some());
        let c = layer.add_mesh(mesh());
        assert_ne!(c, a);
        assert_eq!(layer.meshes().map(|(id, _)| id).collect::<Vec<_>>(), vec![b, c]);
    }
}
