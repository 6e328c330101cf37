//! Macro weave: the main-scene fabric plane the camera dives into while the fabric
//! lab is pinned.

use std::f32::consts::{FRAC_PI_4, FRAC_PI_6};
use std::rc::Rc;

use glam::Vec3;

use cybershift_engine::anim::Ease;
use cybershift_engine::compositor::Compositor;
use cybershift_engine::paint::Color;
use cybershift_engine::scene::{Geometry, Material, MaterialParam, Mesh, MeshId, StandardMaterial, Transform};
use cybershift_engine::scroll::{
    Anchor, Axis, PropertyPath, PropertyTween, ScrollBinder, ScrollPosition, ScrollTrigger, TargetRef,
    TimelineHandle,
};

use crate::page::FABRIC_LAB;

const SEGMENTS: u32 = 256;
const SCRUB_LAG: f32 = 1.5;

pub struct MacroWeave {
    mesh: MeshId,
    timeline: TimelineHandle,
}

impl MacroWeave {
    pub fn mount(compositor: &mut Compositor, binder: &ScrollBinder) -> Self {
        // Starts flat; the timeline raises the weave displacement.
        let material = StandardMaterial::new(Color::hex(0x1a1a1a), 0.9, 0.1);
        let mesh = compositor.main_mut().add_mesh(Mesh::new(
            Rc::new(Geometry::plane(10.0, 10.0, SEGMENTS, SEGMENTS)),
            Material::Standard(material),
            Transform::from_position(Vec3::new(0.0, -5.0, -2.0)).with_rotation(Vec3::new(-FRAC_PI_6, 0.0, 0.0)),
        ));

        let target = TargetRef::main(mesh);
        let trigger = ScrollTrigger::new(
            FABRIC_LAB,
            ScrollPosition::relative(Anchor::Top, Anchor::Top),
            ScrollPosition::relative(Anchor::Bottom, Anchor::Top),
        )
        .scrub(SCRUB_LAG)
        .pinned();
        let tweens = vec![
            PropertyTween::to(target, PropertyPath::Position(Axis::Z), 3.0).ease(Ease::POWER2_IN_OUT),
            PropertyTween::to(target, PropertyPath::Position(Axis::Y), 0.0).ease(Ease::POWER2_IN_OUT),
            PropertyTween::to(target, PropertyPath::Rotation(Axis::Z), FRAC_PI_4).ease(Ease::None),
            PropertyTween::to(target, PropertyPath::Material(MaterialParam::DisplacementScale), 0.5)
                .ease(Ease::POWER1_IN),
        ];
        let timeline = binder.bind(trigger, tweens);
        log::debug!("macro weave mounted as {mesh:?}");

        Self { mesh, timeline }
    }

    pub fn target(&self) -> TargetRef {
        TargetRef::main(self.mesh)
    }

    /// Puts the plane back where it started and releases the pin.
    pub fn revert(&mut self, compositor: &mut Compositor) {
        self.timeline.revert(compositor);
    }

    pub fn unmount(mut self, compositor: &mut Compositor) {
        self.revert(compositor);
        compositor.main_mut().remove_mesh(self.mesh);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use cybershift_engine::coords::Viewport;
    use cybershift_engine::scene::{PerspectiveCamera, SceneLayer};
    use cybershift_engine::scroll::PropertyTargets;

    use super::*;
    use crate::page::PageLayout;

    fn setup() -> (Compositor, ScrollBinder, MacroWeave) {
        let mut compositor = Compositor::new(SceneLayer::new(PerspectiveCamera::default()));
        let binder = ScrollBinder::new();
        let weave = MacroWeave::mount(&mut compositor, &binder);
        (compositor, binder, weave)
    }

    fn settle(compositor: &mut Compositor, binder: &ScrollBinder, scroll: f32) -> PageLayout {
        let layout = PageLayout::with_pins(Viewport::new(1280.0, 800.0), binder);
        for _ in 0..900 {
            binder.tick(scroll, 800.0, 1.0 / 60.0, &layout, compositor);
        }
        layout
    }

    #[test]
    fn mount_adds_the_plane_and_pins_the_lab() {
        let (compositor, binder, weave) = setup();
        let mesh = compositor.main().mesh(weave.mesh).unwrap();
        assert_eq!(mesh.transform.position, Vec3::new(0.0, -5.0, -2.0));
        assert_eq!(mesh.geometry.plane_size(), Some((10.0, 10.0)));

        let layout = PageLayout::with_pins(Viewport::new(1280.0, 800.0), &binder);
        assert_eq!(layout.pins().len(), 1);
        assert_eq!(layout.pins()[0].start, layout.fabric_lab.min().y);
    }

    #[test]
    fn end_of_pin_reaches_every_target_value() {
        let (mut compositor, binder, weave) = setup();
        let probe = PageLayout::with_pins(Viewport::new(1280.0, 800.0), &binder);
        settle(&mut compositor, &binder, probe.fabric_lab.max().y + 100.0);

        let t = weave.target();
        let get = |p| compositor.get(t, p).unwrap();
        assert!((get(PropertyPath::Position(Axis::Z)) - 3.0).abs() < 1e-3);
        assert!(get(PropertyPath::Position(Axis::Y)).abs() < 1e-3);
        assert!((get(PropertyPath::Rotation(Axis::Z)) - FRAC_PI_4).abs() < 1e-3);
        assert!((get(PropertyPath::Material(MaterialParam::DisplacementScale)) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn before_the_pin_the_plane_is_untouched() {
        let (mut compositor, binder, weave) = setup();
        settle(&mut compositor, &binder, 0.0);
        let mesh = compositor.main().mesh(weave.mesh).unwrap();
        assert_eq!(mesh.transform.position.z, -2.0);
        assert_eq!(mesh.transform.rotation.z, 0.0);
    }

    #[test]
    fn revert_restores_the_start_pose_and_unpins() {
        let (mut compositor, binder, mut weave) = setup();
        let probe = PageLayout::with_pins(Viewport::new(1280.0, 800.0), &binder);
        settle(&mut compositor, &binder, probe.fabric_lab.max().y);

        weave.revert(&mut compositor);
        let mesh = compositor.main().mesh(weave.mesh).unwrap();
        assert_eq!(mesh.transform.position, Vec3::new(0.0, -5.0, -2.0));
        assert_eq!(mesh.transform.rotation.truncate(), Vec2::new(-FRAC_PI_6, 0.0));
        assert!(binder.is_empty());
    }

    #[test]
    fn remounting_leaves_a_single_pin() {
        let (mut compositor, binder, weave) = setup();
        weave.unmount(&mut compositor);
        assert_eq!(compositor.main().meshes().count(), 0);
        assert!(binder.is_empty());

        let again = MacroWeave::mount(&mut compositor, &binder);
        let layout = PageLayout::with_pins(Viewport::new(1280.0, 800.0), &binder);
        assert_eq!(layout.pins().len(), 1);
        assert_eq!(compositor.main().meshes().count(), 1);
        again.unmount(&mut compositor);
    }
}
