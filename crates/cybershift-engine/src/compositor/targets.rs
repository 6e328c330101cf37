use crate::scene::Mesh;
use crate::scroll::{PropertyPath, PropertyTargets, TargetRef};

use super::Compositor;

impl Compositor {
    fn target_mesh(&self, target: TargetRef) -> Option<&Mesh> {
        self.layer(target.layer)?.mesh(target.mesh)
    }

    fn target_mesh_mut(&mut self, target: TargetRef) -> Option<&mut Mesh> {
        self.layer_mut(target.layer)?.mesh_mut(target.mesh)
    }
}

impl PropertyTargets for Compositor {
    fn get(&self, target: TargetRef, path: PropertyPath) -> Option<f32> {
        let mesh = self.target_mesh(target)?;
        let t = &mesh.transform;
        match path {
            PropertyPath::Position(a) => Some(t.position[a.index()]),
            PropertyPath::Rotation(a) => Some(t.rotation[a.index()]),
            PropertyPath::Scale(a) => Some(t.scale[a.index()]),
            PropertyPath::Material(p) => mesh.material.param(p),
        }
    }

    fn set(&mut self, target: TargetRef, path: PropertyPath, value: f32) -> bool {
        let Some(mesh) = self.target_mesh_mut(target) else { return false };
        let t = &mut mesh.transform;
        match path {
            PropertyPath::Position(a) => t.position[a.index()] = value,
            PropertyPath::Rotation(a) => t.rotation[a.index()] = value,
            PropertyPath::Scale(a) => t.scale[a.index()] = value,
            PropertyPath::Material(p) => return mesh.material.set_param(p, value),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use glam::Vec3;

    use super::*;
    use crate::scene::{
        Geometry, Material, MaterialParam, MeshId, PerspectiveCamera, SceneLayer, StandardMaterial, Transform,
    };
    use crate::scroll::Axis;

    fn compositor() -> (Compositor, MeshId) {
        let mut main = SceneLayer::new(PerspectiveCamera::default());
        let id = main.add_mesh(Mesh::new(
            Rc::new(Geometry::plane(20.0, 20.0, 2, 2)),
            Material::Standard(StandardMaterial::default()),
            Transform::from_position(Vec3::new(0.0, -5.0, -2.0)),
        ));
        (Compositor::new(main), id)
    }

    #[test]
    fn transform_axes_read_and_write() {
        let (mut c, id) = compositor();
        let t = TargetRef::main(id);
        assert_eq!(c.get(t, PropertyPath::Position(Axis::Y)), Some(-5.0));

        assert!(c.set(t, PropertyPath::Position(Axis::Z), 3.0));
        assert!(c.set(t, PropertyPath::Rotation(Axis::Z), 0.5));
        let mesh = c.main().mesh(id).unwrap();
        assert_eq!(mesh.transform.position.z, 3.0);
        assert_eq!(mesh.transform.rotation.z, 0.5);
    }

    #[test]
    fn material_params_go_through_the_material() {
        let (mut c, id) = compositor();
        let t = TargetRef::main(id);
        let path = PropertyPath::Material(MaterialParam::DisplacementScale);
        assert!(c.set(t, path, 0.5));
        assert_eq!(c.get(t, path), Some(0.5));
    }

    #[test]
    fn missing_targets_are_tolerated() {
        let (mut c, _) = compositor();
        let t = TargetRef::main(MeshId(99));
        assert_eq!(c.get(t, PropertyPath::Scale(Axis::X)), None);
        assert!(!c.set(t, PropertyPath::Scale(Axis::X), 2.0));
    }
}
