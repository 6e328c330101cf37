use std::rc::Weak;

use glam::{Vec2, Vec3};

use crate::coords::SurfaceMetrics;
use crate::input::{InputFrame, InputState, MouseButton};
use crate::render::{
    BackdropRenderer, BlitRenderer, LayerDraw, MeshRenderer, OffscreenTarget, RenderCtx,
    RenderTarget,
};
use crate::scene::{MeshId, Ray, SceneLayer};
use crate::scroll::TargetRef;
use crate::time::{AdaptiveConfig, AdaptiveQuality, FrameTime};
use crate::viewport::{LayerKey, TrackedElement, ViewportHandle, ViewportRegistry, ViewportScene};

use super::plan::{effective_pixel_ratio, FramePlan};

/// A ray-cast hit on a plane mesh.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlaneHit {
    pub target: TargetRef,
    pub uv: Vec2,
    /// Distance from the ray origin on the camera's near plane.
    pub distance: f32,
}

#[derive(Debug, Copy, Clone)]
struct OrbitDrag {
    handle: ViewportHandle,
    /// Viewport height in logical px, which scales drag distance to rotation.
    height: f32,
    pending: Vec2,
}

/// The page's single 3D layer.
///
/// Owns the main full-window scene and the viewport registry, and draws both into one
/// offscreen target that is then composited under the page. The page never hands it
/// raw window events: it forwards pointer positions through [`pick_plane`],
/// [`emit_pulse`] and [`route_pointer`].
///
/// [`pick_plane`]: Self::pick_plane
/// [`emit_pulse`]: Self::emit_pulse
/// [`route_pointer`]: Self::route_pointer
pub struct Compositor {
    main: SceneLayer,
    viewports: ViewportRegistry,
    quality: AdaptiveQuality,
    frame_index: u64,
    drag: Option<OrbitDrag>,
    last_viewport_count: usize,

    meshes: MeshRenderer,
    backdrops: BackdropRenderer,
    offscreen: OffscreenTarget,
    blit: BlitRenderer,
}

impl Compositor {
    pub fn new(main: SceneLayer) -> Self {
        Self::with_quality(main, AdaptiveConfig::default())
    }

    pub fn with_quality(main: SceneLayer, config: AdaptiveConfig) -> Self {
        Self {
            main,
            viewports: ViewportRegistry::new(),
            quality: AdaptiveQuality::new(config),
            frame_index: 0,
            drag: None,
            last_viewport_count: 0,
            meshes: MeshRenderer::new(),
            backdrops: BackdropRenderer::new(),
            offscreen: OffscreenTarget::new(),
            blit: BlitRenderer::new(),
        }
    }

    pub fn main(&self) -> &SceneLayer {
        &self.main
    }

    pub fn main_mut(&mut self) -> &mut SceneLayer {
        &mut self.main
    }

    pub fn register(&mut self, element: Weak<dyn TrackedElement>, scene: ViewportScene) -> ViewportHandle {
        self.viewports.register(element, scene)
    }

    /// Idempotent. A drag in progress on the viewport ends.
    pub fn unregister(&mut self, handle: ViewportHandle) -> bool {
        if self.drag.is_some_and(|d| d.handle == handle) {
            self.drag = None;
        }
        self.viewports.unregister(handle)
    }

    pub fn viewports(&self) -> &ViewportRegistry {
        &self.viewports
    }

    pub fn layer(&self, key: LayerKey) -> Option<&SceneLayer> {
        match key {
            LayerKey::Main => Some(&self.main),
            LayerKey::Viewport(h) => self.viewports.scene(h),
        }
    }

    pub fn layer_mut(&mut self, key: LayerKey) -> Option<&mut SceneLayer> {
        match key {
            LayerKey::Main => Some(&mut self.main),
            LayerKey::Viewport(h) => self.viewports.scene_mut(h),
        }
    }

    pub fn quality(&self) -> &AdaptiveQuality {
        &self.quality
    }

    /// Per-frame update: feeds the frame time to adaptive quality, then advances orbit
    /// controls and cloth clocks in every layer.
    pub fn update(&mut self, time: &FrameTime) {
        self.frame_index = time.frame_index;
        self.quality.observe(time.dt);

        self.main.update(time.elapsed, time.dt);
        for (_, scene) in self.viewports.scenes_mut() {
            scene.update(time.elapsed, time.dt);
        }
    }

    // ── pointer ───────────────────────────────────────────────────────────

    /// Casts the pointer at `point` (logical window px) into whichever layer is under
    /// it and returns the nearest plane mesh hit.
    ///
    /// A point over a tracked viewport only ever hits that viewport's scene; anywhere
    /// else it hits the main scene.
    pub fn pick_plane(&self, metrics: &SurfaceMetrics, point: Vec2) -> Option<PlaneHit> {
        let (key, ndc, aspect) = match self.viewports.hit_test(metrics, point) {
            Some(hit) => (LayerKey::Viewport(hit.handle), hit.ndc(), hit.aspect()),
            None => {
                let v = metrics.logical;
                if !v.is_valid() {
                    return None;
                }
                let ndc = Vec2::new(point.x / v.width * 2.0 - 1.0, 1.0 - point.y / v.height * 2.0);
                (LayerKey::Main, ndc, v.aspect())
            }
        };

        let layer = self.layer(key)?;
        let ray = layer.camera.ray(ndc, aspect);
        let (mesh, uv, distance) = nearest_plane_hit(layer, &ray)?;
        Some(PlaneHit { target: TargetRef { layer: key, mesh }, uv, distance })
    }

    /// Records a pulse on a cloth mesh. `false` when the target is gone or not cloth.
    pub fn emit_pulse(&mut self, target: TargetRef, uv: Vec2, time: f32) -> bool {
        let Some(cloth) = self
            .layer_mut(target.layer)
            .and_then(|l| l.mesh_mut(target.mesh))
            .and_then(|m| m.material.as_cloth_mut())
        else {
            return false;
        };
        cloth.emit_pulse(uv, time);
        true
    }

    /// Drives orbit controls from pointer input.
    ///
    /// A left press over a viewport with controls starts a drag that follows the
    /// pointer until release, even outside the viewport. Movement is applied every
    /// frame, or every other frame while quality is degraded (accumulated, not lost).
    /// Returns `true` while a drag is active so the page can ignore the movement.
    pub fn route_pointer(&mut self, input: &InputState, frame: &InputFrame, metrics: &SurfaceMetrics) -> bool {
        if frame.buttons_pressed.contains(&MouseButton::Left) {
            self.drag = input.pointer_pos.and_then(|p| self.viewports.hit_test(metrics, p)).and_then(|hit| {
                let has_controls = self.viewports.scene(hit.handle)?.controls.is_some();
                has_controls.then_some(OrbitDrag { handle: hit.handle, height: hit.size.y, pending: Vec2::ZERO })
            });
        }

        let Some(mut drag) = self.drag else { return false };
        drag.pending += frame.pointer_delta;

        let released = !input.button_down(MouseButton::Left);
        if released || self.quality.samples_events(self.frame_index) {
            if let Some(controls) = self.viewports.scene_mut(drag.handle).and_then(|s| s.controls.as_mut()) {
                controls.rotate(drag.pending, drag.height);
            }
            drag.pending = Vec2::ZERO;
        }

        self.drag = (!released).then_some(drag);
        true
    }

    /// Wheel over a viewport whose controls zoom. Returns `true` when consumed, in
    /// which case the page must not scroll.
    pub fn route_wheel(&mut self, metrics: &SurfaceMetrics, point: Vec2, steps: f32) -> bool {
        let Some(hit) = self.viewports.hit_test(metrics, point) else { return false };
        let Some(controls) = self.viewports.scene_mut(hit.handle).and_then(|s| s.controls.as_mut()) else {
            return false;
        };
        if !controls.enable_zoom {
            return false;
        }
        controls.zoom(steps);
        true
    }

    // ── rendering ─────────────────────────────────────────────────────────

    /// Draws the main scene and every visible viewport into the offscreen target,
    /// then composites it over `target`.
    ///
    /// Each layer gets the viewport and scissor of its visible rect; the main scene
    /// draws first, viewports follow in document order.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, scroll: Vec2) {
        let ratio = effective_pixel_ratio(ctx.viewport, ctx.scale_factor, self.quality.scale(), ctx.max_texture_dimension);
        let metrics = SurfaceMetrics::new(ctx.viewport, ratio, scroll);
        let plan = FramePlan::build(metrics, &mut self.viewports);

        let viewport_count = plan.viewport_count();
        if viewport_count != self.last_viewport_count {
            log::debug!("3D layer drawing {viewport_count} viewport(s)");
            self.last_viewport_count = viewport_count;
        }

        self.offscreen.ensure(ctx, plan.target_size);

        let draws: Vec<LayerDraw<'_>> = plan
            .layers
            .iter()
            .filter_map(|l| {
                let layer = match l.key {
                    LayerKey::Main => &self.main,
                    LayerKey::Viewport(h) => self.viewports.scene(h)?,
                };
                Some(LayerDraw { key: l.key, layer, rect: l.rect })
            })
            .collect();

        let mut backgrounds = Vec::new();
        let backdrop_slots: Vec<Option<usize>> = draws
            .iter()
            .map(|d| {
                d.layer.background.map(|c| {
                    backgrounds.push(c);
                    backgrounds.len() - 1
                })
            })
            .collect();

        self.meshes.prepare(ctx, &draws);
        self.backdrops.prepare(ctx, &backgrounds);

        let Some(view) = self.offscreen.view() else { return };
        {
            let mut pass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("cybershift 3d pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for (i, (draw, backdrop)) in draws.iter().zip(&backdrop_slots).enumerate() {
                let v = draw.rect.visible;
                pass.set_viewport(v.x as f32, v.y as f32, v.w as f32, v.h as f32, 0.0, 1.0);
                pass.set_scissor_rect(v.x, v.y, v.w, v.h);
                if let Some(slot) = backdrop {
                    self.backdrops.draw(&mut pass, *slot);
                }
                self.meshes.draw(&mut pass, i, draw);
            }
        }

        self.blit.render(ctx, target, &self.offscreen);
    }
}

/// Nearest visible plane mesh along `ray`, as (mesh, uv, distance).
fn nearest_plane_hit(layer: &SceneLayer, ray: &Ray) -> Option<(MeshId, Vec2, f32)> {
    layer
        .meshes()
        .filter(|(_, m)| m.visible)
        .filter_map(|(id, m)| {
            let (w, h) = m.geometry.plane_size()?;
            let model = m.transform.matrix();
            let uv = ray.hit_plane_uv(model, w, h)?;
            let local = Vec3::new((uv.x - 0.5) * w, (uv.y - 0.5) * h, 0.0);
            let distance = model.transform_point3(local).distance(ray.origin);
            Some((id, uv, distance))
        })
        .min_by(|a, b| a.2.total_cmp(&b.2))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Instant;

    use super::*;
    use crate::coords::{Rect, Viewport};
    use crate::input::{InputEvent, Modifiers, MouseButtonState, PointerButtonEvent};
    use crate::paint::Color;
    use crate::pulse::ClothEffect;
    use crate::scene::{Geometry, Material, Mesh, OrbitControls, PerspectiveCamera, StandardMaterial, Transform};

    struct Probe(Cell<Option<Rect>>);

    impl TrackedElement for Probe {
        fn document_rect(&self) -> Option<Rect> {
            self.0.get()
        }
    }

    fn tracked(rect: Rect) -> (Rc<Probe>, Weak<dyn TrackedElement>) {
        let probe = Rc::new(Probe(Cell::new(Some(rect))));
        let as_dyn: Rc<dyn TrackedElement> = probe.clone();
        let weak = Rc::downgrade(&as_dyn);
        (probe, weak)
    }

    fn metrics() -> SurfaceMetrics {
        SurfaceMetrics::new(Viewport::new(800.0, 600.0), 1.0, Vec2::ZERO)
    }

    fn cloth_scene() -> (ViewportScene, MeshId) {
        let mut scene = ViewportScene::new(PerspectiveCamera::new(Vec3::new(0.0, 0.0, 5.0), 75.0));
        let id = scene.add_mesh(Mesh::new(
            Rc::new(Geometry::plane(14.0, 10.0, 4, 4)),
            Material::Cloth(ClothEffect::new(Color::WHITE, (14.0, 10.0))),
            Transform::default(),
        ));
        (scene, id)
    }

    fn press(state: MouseButtonState, at: Vec2) -> InputEvent {
        InputEvent::PointerButton(PointerButtonEvent {
            button: MouseButton::Left,
            state,
            position: at,
            modifiers: Modifiers::default(),
        })
    }

    // ── picking ───────────────────────────────────────────────────────────

    #[test]
    fn click_at_viewport_centre_hits_cloth_centre() {
        let mut c = Compositor::new(SceneLayer::new(PerspectiveCamera::default()));
        let (_el, weak) = tracked(Rect::new(0.0, 0.0, 800.0, 600.0));
        let (scene, mesh) = cloth_scene();
        let h = c.register(weak, scene);

        let hit = c.pick_plane(&metrics(), Vec2::new(400.0, 300.0)).unwrap();
        assert_eq!(hit.target, TargetRef::viewport(h, mesh));
        assert!(hit.uv.abs_diff_eq(Vec2::splat(0.5), 1e-4));
        // Rays start on the near plane.
        assert!((hit.distance - 4.9).abs() < 1e-3);
    }

    #[test]
    fn upper_half_of_viewport_maps_to_upper_uv() {
        let mut c = Compositor::new(SceneLayer::new(PerspectiveCamera::default()));
        let (_el, weak) = tracked(Rect::new(0.0, 0.0, 800.0, 600.0));
        c.register(weak, cloth_scene().0);

        let hit = c.pick_plane(&metrics(), Vec2::new(400.0, 200.0)).unwrap();
        assert!(hit.uv.y > 0.5);
    }

    #[test]
    fn point_outside_viewports_uses_main_scene() {
        let mut main = SceneLayer::new(PerspectiveCamera::default());
        let mesh = main.add_mesh(Mesh::new(
            Rc::new(Geometry::plane(2.0, 2.0, 1, 1)),
            Material::Standard(StandardMaterial::default()),
            Transform::default(),
        ));
        let c = Compositor::new(main);
        let hit = c.pick_plane(&metrics(), Vec2::new(400.0, 300.0)).unwrap();
        assert_eq!(hit.target, TargetRef::main(mesh));
    }

    #[test]
    fn miss_returns_none() {
        let c = Compositor::new(SceneLayer::new(PerspectiveCamera::default()));
        assert!(c.pick_plane(&metrics(), Vec2::new(10.0, 10.0)).is_none());
    }

    // ── pulses ────────────────────────────────────────────────────────────

    #[test]
    fn pulse_reaches_cloth_and_not_other_materials() {
        let mut main = SceneLayer::new(PerspectiveCamera::default());
        let plain = main.add_mesh(Mesh::new(
            Rc::new(Geometry::plane(2.0, 2.0, 1, 1)),
            Material::Standard(StandardMaterial::default()),
            Transform::default(),
        ));
        let mut c = Compositor::new(main);
        let (_el, weak) = tracked(Rect::new(0.0, 0.0, 100.0, 100.0));
        let (scene, cloth) = cloth_scene();
        let h = c.register(weak, scene);

        assert!(c.emit_pulse(TargetRef::viewport(h, cloth), Vec2::splat(0.5), 1.0));
        assert!(!c.emit_pulse(TargetRef::main(plain), Vec2::splat(0.5), 1.0));

        c.unregister(h);
        assert!(!c.emit_pulse(TargetRef::viewport(h, cloth), Vec2::splat(0.5), 1.0));
    }

    // ── orbit drag ────────────────────────────────────────────────────────

    #[test]
    fn drag_over_viewport_rotates_its_camera() {
        let mut c = Compositor::new(SceneLayer::new(PerspectiveCamera::default()));
        let (_el, weak) = tracked(Rect::new(100.0, 100.0, 200.0, 200.0));
        let scene = ViewportScene::new(PerspectiveCamera::default()).orbit(|o: OrbitControls| o);
        let h = c.register(weak, scene);

        let mut input = InputState::default();
        let mut frame = InputFrame::default();
        input.apply_event(&mut frame, InputEvent::PointerMoved(Vec2::new(200.0, 200.0)));
        input.apply_event(&mut frame, press(MouseButtonState::Pressed, Vec2::new(200.0, 200.0)));
        assert!(c.route_pointer(&input, &frame, &metrics()));

        frame.clear();
        input.apply_event(&mut frame, InputEvent::PointerMoved(Vec2::new(260.0, 200.0)));
        assert!(c.route_pointer(&input, &frame, &metrics()));

        let before = c.layer(LayerKey::Viewport(h)).unwrap().camera.position;
        c.update(&FrameTime { dt: 1.0 / 60.0, elapsed: 1.0, now: Instant::now(), frame_index: 1 });
        let after = c.layer(LayerKey::Viewport(h)).unwrap().camera.position;
        assert!(before.distance(after) > 1e-3);

        frame.clear();
        input.apply_event(&mut frame, press(MouseButtonState::Released, Vec2::new(260.0, 200.0)));
        assert!(c.route_pointer(&input, &frame, &metrics()));
        assert!(c.drag.is_none());
    }

    #[test]
    fn press_outside_viewports_does_not_drag() {
        let mut c = Compositor::new(SceneLayer::new(PerspectiveCamera::default()));
        let mut input = InputState::default();
        let mut frame = InputFrame::default();
        input.apply_event(&mut frame, press(MouseButtonState::Pressed, Vec2::new(10.0, 10.0)));
        assert!(!c.route_pointer(&input, &frame, &metrics()));
    }

    #[test]
    fn wheel_passes_through_when_zoom_is_disabled() {
        let mut c = Compositor::new(SceneLayer::new(PerspectiveCamera::default()));
        let (_a, wa) = tracked(Rect::new(0.0, 0.0, 100.0, 100.0));
        let (_b, wb) = tracked(Rect::new(200.0, 0.0, 100.0, 100.0));
        c.register(wa, ViewportScene::new(PerspectiveCamera::default()).orbit(|o| o.with_zoom(false)));
        c.register(wb, ViewportScene::new(PerspectiveCamera::default()).orbit(|o| o.with_zoom(true)));

        assert!(!c.route_wheel(&metrics(), Vec2::new(50.0, 50.0), 1.0));
        assert!(c.route_wheel(&metrics(), Vec2::new(250.0, 50.0), 1.0));
        assert!(!c.route_wheel(&metrics(), Vec2::new(500.0, 500.0), 1.0));
    }
}
