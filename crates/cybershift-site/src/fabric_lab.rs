//! Fabric lab: three circular placeholders, each with its own orbitable scene.

use std::f32::consts::{FRAC_PI_4, PI};
use std::rc::{Rc, Weak};

use glam::{Vec2, Vec3};

use cybershift_engine::anim::{Ease, EaseDir, Tween};
use cybershift_engine::compositor::Compositor;
use cybershift_engine::coords::Rect;
use cybershift_engine::paint::Color;
use cybershift_engine::render::Ring;
use cybershift_engine::scene::{
    Geometry, Light, Material, Mesh, MeshId, PerspectiveCamera, StandardMaterial, Transform, WireframeMaterial,
};
use cybershift_engine::scroll::{
    Anchor, Axis, PropertyPath, PropertyTween, ScrollBinder, ScrollPosition, ScrollTrigger, TargetRef,
    TimelineHandle,
};
use cybershift_engine::viewport::{TrackedElement, ViewportHandle, ViewportScene};

use crate::hero_cloth::NEON;
use crate::page::{scale_about_center, PageLayout, TrackedBox, FABRIC_LAB};

const BORDER: f32 = 4.0;
const BORDER_GRAY: u32 = 0xe5e7eb;
const GLOW: f32 = 30.0;
const HOVER_SECONDS: f32 = 0.5;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LabItem {
    Sleeve,
    Grain,
    Fiber,
}

impl LabItem {
    pub const ALL: [LabItem; 3] = [LabItem::Sleeve, LabItem::Grain, LabItem::Fiber];

    pub fn label(self) -> &'static str {
        match self {
            LabItem::Sleeve => "Sleeve",
            LabItem::Grain => "Grain",
            LabItem::Fiber => "Fiber",
        }
    }

    fn hover_scale(self) -> f32 {
        match self {
            LabItem::Grain => 1.05,
            LabItem::Sleeve | LabItem::Fiber => 1.1,
        }
    }

    fn ring(self, rect: Rect) -> Ring {
        match self {
            LabItem::Grain => {
                Ring::around(rect, BORDER, Color::hex(NEON)).with_glow(GLOW, Color::hex(NEON).with_alpha(0.25))
            }
            LabItem::Sleeve | LabItem::Fiber => Ring::around(rect, BORDER, Color::hex(BORDER_GRAY)),
        }
    }

    /// The sub-scene and the mesh scroll animation targets.
    fn scene(self) -> (ViewportScene, MeshId) {
        match self {
            LabItem::Sleeve => {
                let mut scene = ViewportScene::new(PerspectiveCamera::new(Vec3::new(0.0, 0.0, 5.0), 40.0))
                    .background(Color::hex(0xe0e0e0))
                    .light(Light::ambient(2.0))
                    .light(Light::point(Vec3::new(10.0, 9.0, 10.0), 1.0))
                    .orbit(|o| o.with_zoom(false));
                let mesh = scene.add_mesh(Mesh::new(
                    Rc::new(Geometry::capsule(0.8, 2.0, 8, 16)),
                    Material::Standard(StandardMaterial::new(Color::hex(0x222222), 0.3, 0.8)),
                    Transform::from_position(Vec3::new(0.0, -1.0, 0.0)),
                ));
                (scene, mesh)
            }
            LabItem::Grain => {
                let mut scene = ViewportScene::new(PerspectiveCamera::new(Vec3::new(0.0, 0.0, 4.0), 30.0))
                    .background(Color::WHITE)
                    .light(Light::ambient(1.0))
                    .light(Light::spot(Vec3::new(5.0, 10.0, 5.0), 50.0))
                    .orbit(|o| o.with_zoom(false));
                let mesh = scene.add_mesh(Mesh::new(
                    Rc::new(Geometry::plane(10.0, 10.0, 64, 64)),
                    Material::Standard(StandardMaterial::new(Color::hex(0x0a0a0a), 0.4, 0.6)),
                    Transform::default()
                        .with_rotation(Vec3::new(-FRAC_PI_4, 0.0, 0.0))
                        .with_scale(Vec3::splat(0.8)),
                ));
                (scene, mesh)
            }
            LabItem::Fiber => {
                let mut scene = ViewportScene::new(PerspectiveCamera::new(Vec3::new(0.0, 0.0, 1.8), 20.0))
                    .background(Color::hex(0xf0f0f0))
                    .orbit(|o| o.with_zoom(false).with_auto_rotate(0.5));
                let mesh = scene.add_mesh(Mesh::new(
                    Rc::new(Geometry::plane(5.0, 5.0, 64, 64)),
                    Material::Wireframe(WireframeMaterial {
                        color: Color::hex(NEON),
                        emissive: Color::hex(NEON),
                        emissive_intensity: 0.2,
                    }),
                    Transform::default().with_rotation(Vec3::new(-FRAC_PI_4, 0.0, 0.0)),
                ));
                (scene, mesh)
            }
        }
    }
}

struct LabView {
    item: LabItem,
    element: Rc<TrackedBox>,
    handle: ViewportHandle,
    hover: Tween<f32>,
}

pub struct FabricLab {
    views: Vec<LabView>,
    grain_spin: TimelineHandle,
}

impl FabricLab {
    pub fn mount(compositor: &mut Compositor, binder: &ScrollBinder) -> Self {
        let mut views = Vec::with_capacity(LabItem::ALL.len());
        let mut grain = None;

        for item in LabItem::ALL {
            let element = Rc::new(TrackedBox::new());
            let (scene, mesh) = item.scene();
            let tracked: Weak<dyn TrackedElement> = Rc::<TrackedBox>::downgrade(&element);
            let handle = compositor.register(tracked, scene);
            if item == LabItem::Grain {
                grain = Some(TargetRef::viewport(handle, mesh));
            }
            log::debug!("fabric lab view `{}` registered as {handle:?}", item.label());
            views.push(LabView { item, element, handle, hover: Tween::settled(1.0) });
        }

        // Half a turn while the section crosses the viewport.
        let trigger = ScrollTrigger::new(
            FABRIC_LAB,
            ScrollPosition::relative(Anchor::Top, Anchor::Bottom),
            ScrollPosition::relative(Anchor::Bottom, Anchor::Top),
        )
        .scrub(1.0);
        let tweens = grain
            .map(|target| {
                vec![PropertyTween::to(target, PropertyPath::Rotation(Axis::Y), PI).ease(Ease::Power(1, EaseDir::Out))]
            })
            .unwrap_or_default();
        let grain_spin = binder.bind(trigger, tweens);

        Self { views, grain_spin }
    }

    /// Places the circles at their displayed position and advances hover scaling.
    ///
    /// `pointer` is in document space.
    pub fn update(&mut self, layout: &PageLayout, scroll: f32, pointer: Option<Vec2>, dt: f32) {
        for (view, base) in self.views.iter_mut().zip(layout.lab_circles) {
            let shown = layout.displayed(FABRIC_LAB, base, scroll);
            let hovered = pointer.is_some_and(|p| shown.contains(p));
            let goal = if hovered { view.item.hover_scale() } else { 1.0 };
            if view.hover.target() != goal {
                view.hover.retarget(goal, HOVER_SECONDS, Ease::POWER2_OUT);
            }
            let scale = view.hover.advance(dt);
            view.element.set(Some(scale_about_center(shown, scale)));
        }
    }

    /// Circle outlines in document space, matching the viewports drawn inside them.
    pub fn rings(&self) -> Vec<Ring> {
        self.views
            .iter()
            .filter_map(|v| v.element.get().map(|rect| v.item.ring(rect)))
            .collect()
    }

    pub fn handles(&self) -> impl Iterator<Item = (LabItem, ViewportHandle)> + '_ {
        self.views.iter().map(|v| (v.item, v.handle))
    }

    pub fn unmount(mut self, compositor: &mut Compositor) {
        self.grain_spin.dispose();
        for view in &self.views {
            compositor.unregister(view.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use cybershift_engine::coords::Viewport;
    use cybershift_engine::scene::SceneLayer;
    use cybershift_engine::viewport::LayerKey;

    use super::*;

    fn setup() -> (Compositor, ScrollBinder, FabricLab, PageLayout) {
        let mut compositor = Compositor::new(SceneLayer::new(PerspectiveCamera::default()));
        let binder = ScrollBinder::new();
        let lab = FabricLab::mount(&mut compositor, &binder);
        let layout = PageLayout::with_pins(Viewport::new(1280.0, 800.0), &binder);
        (compositor, binder, lab, layout)
    }

    fn grain_rotation(compositor: &Compositor, lab: &FabricLab) -> f32 {
        let (_, handle) = lab.handles().find(|(item, _)| *item == LabItem::Grain).unwrap();
        let layer = compositor.layer(LayerKey::Viewport(handle)).unwrap();
        layer.meshes().next().unwrap().1.transform.rotation.y
    }

    // ── mount ─────────────────────────────────────────────────────────────

    #[test]
    fn mount_registers_three_viewports_and_one_timeline() {
        let (compositor, binder, _lab, _) = setup();
        assert_eq!(compositor.viewports().live_count(), 3);
        assert_eq!(binder.len(), 1);
    }

    #[test]
    fn scenes_match_their_items() {
        let (compositor, _, lab, _) = setup();
        for (item, handle) in lab.handles() {
            let layer = compositor.layer(LayerKey::Viewport(handle)).unwrap();
            match item {
                LabItem::Sleeve => {
                    assert_eq!(layer.background, Some(Color::hex(0xe0e0e0)));
                    assert_eq!(layer.camera.fov_y, 40.0);
                    assert!(!layer.controls.as_ref().unwrap().enable_zoom);
                }
                LabItem::Grain => {
                    assert_eq!(layer.background, Some(Color::WHITE));
                    assert_eq!(layer.camera.position.z, 4.0);
                }
                LabItem::Fiber => {
                    assert!(layer.controls.as_ref().unwrap().auto_rotate);
                    let mesh = layer.meshes().next().unwrap().1;
                    assert!(matches!(mesh.material, Material::Wireframe(_)));
                }
            }
        }
    }

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn update_places_elements_on_layout_circles() {
        let (_, _, mut lab, layout) = setup();
        lab.update(&layout, 0.0, None, 1.0 / 60.0);
        let rings = lab.rings();
        assert_eq!(rings.len(), 3);
        assert_eq!(rings[1].center, layout.lab_circles[1].center());
        assert_eq!(rings[1].radius, 176.0);
        assert!(rings[1].glow.is_some());
        assert!(rings[0].glow.is_none());
    }

    #[test]
    fn hover_grows_the_circle_around_its_centre() {
        let (_, _, mut lab, layout) = setup();
        let circle = layout.lab_circles[0];
        for _ in 0..60 {
            lab.update(&layout, 0.0, Some(circle.center()), 1.0 / 60.0);
        }
        let grown = lab.views[0].element.get().unwrap();
        assert!((grown.width() - circle.width() * 1.1).abs() < 1e-3);
        assert!((grown.center() - circle.center()).length() < 1e-3);

        for _ in 0..60 {
            lab.update(&layout, 0.0, None, 1.0 / 60.0);
        }
        assert_eq!(lab.views[0].element.get(), Some(circle));
    }

    // ── scroll ────────────────────────────────────────────────────────────

    #[test]
    fn grain_turns_half_way_through_the_section() {
        let (mut compositor, binder, lab, layout) = setup();
        let vh = layout.viewport.height;
        let end = layout.fabric_lab.max().y;
        for _ in 0..600 {
            binder.tick(end + 10.0, vh, 1.0 / 60.0, &layout, &mut compositor);
        }
        assert!((grain_rotation(&compositor, &lab) - PI).abs() < 1e-3);

        for _ in 0..600 {
            binder.tick(0.0, vh, 1.0 / 60.0, &layout, &mut compositor);
        }
        assert!(grain_rotation(&compositor, &lab).abs() < 1e-3);
    }

    #[test]
    fn unmount_releases_viewports_and_timeline() {
        let (mut compositor, binder, lab, _) = setup();
        lab.unmount(&mut compositor);
        assert!(compositor.viewports().is_empty());
        assert!(binder.is_empty());
    }
}
