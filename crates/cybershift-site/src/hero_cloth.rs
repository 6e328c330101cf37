//! Hero section: a tracked viewport holding the pulse cloth.
//!
//! Clicks on the hero are cast through the viewport camera onto the cloth plane and
//! the hit UV starts a ripple.

use std::rc::{Rc, Weak};

use glam::{Vec2, Vec3};

use cybershift_engine::compositor::Compositor;
use cybershift_engine::coords::SurfaceMetrics;
use cybershift_engine::paint::Color;
use cybershift_engine::pulse::ClothEffect;
use cybershift_engine::scene::{Geometry, Light, Material, Mesh, MeshId, PerspectiveCamera, Transform};
use cybershift_engine::scroll::TargetRef;
use cybershift_engine::viewport::{TrackedElement, ViewportHandle, ViewportScene};

use crate::page::{PageLayout, TrackedBox};

pub const NEON: u32 = 0x39ff14;

const CLOTH_SIZE: (f32, f32) = (14.0, 10.0);
const CLOTH_SEGMENTS: (u32, u32) = (80, 60);
const CLOTH_TILT: f32 = -0.1;

pub struct HeroCloth {
    element: Rc<TrackedBox>,
    handle: ViewportHandle,
    cloth: MeshId,
}

impl HeroCloth {
    pub fn mount(compositor: &mut Compositor) -> Self {
        let element = Rc::new(TrackedBox::new());

        let mut scene = ViewportScene::new(PerspectiveCamera::default())
            .light(Light::directional(Vec3::new(5.0, 10.0, 5.0), 1.5))
            .light(Light::ambient(0.7));
        let geometry = Geometry::plane(CLOTH_SIZE.0, CLOTH_SIZE.1, CLOTH_SEGMENTS.0, CLOTH_SEGMENTS.1);
        let cloth = scene.add_mesh(Mesh::new(
            Rc::new(geometry),
            Material::Cloth(ClothEffect::new(Color::hex(NEON), CLOTH_SIZE)),
            Transform::default().with_rotation(Vec3::new(CLOTH_TILT, 0.0, 0.0)),
        ));

        let tracked: Weak<dyn TrackedElement> = Rc::<TrackedBox>::downgrade(&element);
        let handle = compositor.register(tracked, scene);
        log::debug!("hero cloth mounted");

        Self { element, handle, cloth }
    }

    pub fn target(&self) -> TargetRef {
        TargetRef::viewport(self.handle, self.cloth)
    }

    pub fn layout(&self, layout: &PageLayout) {
        self.element.set(Some(layout.hero));
    }

    /// Emits a pulse where a click at `point` (window px) lands on the cloth.
    pub fn click(&self, compositor: &mut Compositor, metrics: &SurfaceMetrics, point: Vec2, time: f32) -> bool {
        let Some(hit) = compositor.pick_plane(metrics, point) else { return false };
        if hit.target != self.target() {
            return false;
        }
        compositor.emit_pulse(hit.target, hit.uv, time)
    }

    pub fn unmount(self, compositor: &mut Compositor) {
        compositor.unregister(self.handle);
    }
}
