use glam::Vec2;

use crate::coords::{Rect, SurfaceMetrics, Viewport, ViewportRect};
use crate::viewport::{LayerKey, ViewportRegistry};

/// Physical pixels per logical pixel on the 3D layer's target.
///
/// The window scale factor times the adaptive render scale, lowered further if the
/// result would exceed the device's texture size limit on the longer axis.
pub fn effective_pixel_ratio(logical: Viewport, scale_factor: f32, scale: f32, max_dimension: u32) -> f32 {
    let scale_factor = if scale_factor.is_finite() && scale_factor > 0.0 { scale_factor } else { 1.0 };
    let scale = if scale.is_finite() { scale.clamp(0.01, 1.0) } else { 1.0 };

    let ratio = scale_factor * scale;
    let longest = logical.width.max(logical.height);
    if longest > 0.0 && max_dimension > 0 {
        ratio.min(max_dimension as f32 / longest)
    } else {
        ratio
    }
}

/// One layer to draw and where.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlannedLayer {
    pub key: LayerKey,
    pub rect: ViewportRect,
}

/// What the 3D layer draws this frame, in draw order: the main scene, then every
/// visible viewport in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub metrics: SurfaceMetrics,
    /// Offscreen target size in physical pixels.
    pub target_size: (u32, u32),
    pub layers: Vec<PlannedLayer>,
}

impl FramePlan {
    /// Reads every tracked element's current rect. Stale registrations are pruned as a
    /// side effect.
    pub fn build(metrics: SurfaceMetrics, registry: &mut ViewportRegistry) -> Self {
        let target_size = metrics.physical_size();
        let mut layers = Vec::new();

        let window = Rect::from_origin_size(metrics.scroll, Vec2::new(metrics.logical.width, metrics.logical.height));
        if let Some(rect) = ViewportRect::from_document(window, &metrics) {
            layers.push(PlannedLayer { key: LayerKey::Main, rect });
        }

        layers.extend(
            registry
                .frame_rects(&metrics)
                .into_iter()
                .map(|f| PlannedLayer { key: LayerKey::Viewport(f.handle), rect: f.rect }),
        );

        Self { metrics, target_size, layers }
    }

    pub fn viewport_count(&self) -> usize {
        self.layers.iter().filter(|l| matches!(l.key, LayerKey::Viewport(_))).count()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::{Rc, Weak};

    use super::*;
    use crate::coords::PixelRect;
    use crate::scene::PerspectiveCamera;
    use crate::viewport::{TrackedElement, ViewportScene};

    struct Probe(Cell<Option<Rect>>);

    impl TrackedElement for Probe {
        fn document_rect(&self) -> Option<Rect> {
            self.0.get()
        }
    }

    fn track(registry: &mut ViewportRegistry, rect: Rect) -> (Rc<Probe>, crate::viewport::ViewportHandle) {
        let probe = Rc::new(Probe(Cell::new(Some(rect))));
        let as_dyn: Rc<dyn TrackedElement> = probe.clone();
        let weak: Weak<dyn TrackedElement> = Rc::downgrade(&as_dyn);
        let handle = registry.register(weak, ViewportScene::new(PerspectiveCamera::default()));
        (probe, handle)
    }

    fn metrics(scroll_y: f32, ratio: f32) -> SurfaceMetrics {
        SurfaceMetrics::new(Viewport::new(800.0, 600.0), ratio, Vec2::new(0.0, scroll_y))
    }

    // ── pixel ratio ───────────────────────────────────────────────────────

    #[test]
    fn ratio_combines_scale_factor_and_render_scale() {
        let v = Viewport::new(800.0, 600.0);
        assert_eq!(effective_pixel_ratio(v, 2.0, 1.0, 8192), 2.0);
        assert_eq!(effective_pixel_ratio(v, 2.0, 0.5, 8192), 1.0);
    }

    #[test]
    fn ratio_respects_texture_limit() {
        let v = Viewport::new(4000.0, 1000.0);
        let r = effective_pixel_ratio(v, 4.0, 1.0, 8192);
        assert!((r - 2.048).abs() < 1e-5);
        let m = SurfaceMetrics::new(v, r, Vec2::ZERO);
        assert!(m.physical_size().0 <= 8192);
    }

    #[test]
    fn bad_inputs_fall_back_to_sane_ratio() {
        let v = Viewport::new(800.0, 600.0);
        assert_eq!(effective_pixel_ratio(v, f32::NAN, f32::INFINITY, 8192), 1.0);
        assert_eq!(effective_pixel_ratio(v, 0.0, 1.0, 8192), 1.0);
    }

    // ── planning ──────────────────────────────────────────────────────────

    #[test]
    fn main_scene_covers_the_target_and_comes_first() {
        let mut reg = ViewportRegistry::new();
        let _el = track(&mut reg, Rect::new(10.0, 10.0, 100.0, 100.0));
        let plan = FramePlan::build(metrics(500.0, 2.0), &mut reg);

        assert_eq!(plan.target_size, (1600, 1200));
        assert_eq!(plan.layers[0].key, LayerKey::Main);
        assert_eq!(plan.layers[0].rect.visible, PixelRect::full(1600, 1200));
    }

    #[test]
    fn offscreen_viewports_are_not_planned() {
        let mut reg = ViewportRegistry::new();
        let (_a, ha) = track(&mut reg, Rect::new(0.0, 0.0, 100.0, 100.0));
        let (_b, hb) = track(&mut reg, Rect::new(0.0, 2000.0, 100.0, 100.0));

        let top = FramePlan::build(metrics(0.0, 1.0), &mut reg);
        assert_eq!(top.viewport_count(), 1);
        assert_eq!(top.layers[1].key, LayerKey::Viewport(ha));

        let bottom = FramePlan::build(metrics(1800.0, 1.0), &mut reg);
        assert_eq!(bottom.viewport_count(), 1);
        assert_eq!(bottom.layers[1].key, LayerKey::Viewport(hb));
    }

    #[test]
    fn degraded_scale_shrinks_viewport_rects() {
        let mut reg = ViewportRegistry::new();
        let _el = track(&mut reg, Rect::new(100.0, 100.0, 200.0, 200.0));
        let plan = FramePlan::build(metrics(0.0, 0.5), &mut reg);
        assert_eq!(plan.target_size, (400, 300));
        assert_eq!(plan.layers[1].rect.visible, PixelRect::new(50, 50, 100, 100));
    }

    #[test]
    fn unregistered_viewport_disappears_next_frame() {
        let mut reg = ViewportRegistry::new();
        let (_el, h) = track(&mut reg, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(FramePlan::build(metrics(0.0, 1.0), &mut reg).viewport_count(), 1);
        reg.unregister(h);
        assert_eq!(FramePlan::build(metrics(0.0, 1.0), &mut reg).viewport_count(), 0);
    }
}
