use std::cmp::Ordering;
use std::rc::Weak;

use glam::Vec2;

use crate::coords::{Rect, SurfaceMetrics, ViewportRect};
use crate::scene::SceneLayer;

use super::{TrackedElement, ViewportScene};

/// Registration token returned by [`ViewportRegistry::register`].
///
/// Handles are never reused, so a stale handle can not address a newer viewport.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ViewportHandle(u64);

struct ViewportDescriptor {
    handle: ViewportHandle,
    element: Weak<dyn TrackedElement>,
    scene: SceneLayer,
}

/// Where one viewport is drawn this frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportFrame {
    pub handle: ViewportHandle,
    pub rect: ViewportRect,
}

/// Page elements paired with the sub-scenes drawn over them.
///
/// The registry holds elements weakly: an element dropped without an explicit
/// `unregister` is pruned at the next frame instead of being drawn stale.
#[derive(Default)]
pub struct ViewportRegistry {
    descriptors: Vec<ViewportDescriptor>,
    next_id: u64,
}

impl ViewportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, element: Weak<dyn TrackedElement>, scene: ViewportScene) -> ViewportHandle {
        let handle = ViewportHandle(self.next_id);
        self.next_id += 1;
        self.descriptors.push(ViewportDescriptor { handle, element, scene: scene.build() });
        log::debug!("viewport {handle:?} registered");
        handle
    }

    /// Removes a viewport. Unknown or already removed handles are ignored.
    pub fn unregister(&mut self, handle: ViewportHandle) -> bool {
        let before = self.descriptors.len();
        self.descriptors.retain(|d| d.handle != handle);
        let removed = self.descriptors.len() != before;
        if removed {
            log::debug!("viewport {handle:?} unregistered");
        }
        removed
    }

    pub fn contains(&self, handle: ViewportHandle) -> bool {
        self.descriptors.iter().any(|d| d.handle == handle)
    }

    /// Number of registered viewports whose element is still alive.
    pub fn live_count(&self) -> usize {
        self.descriptors.iter().filter(|d| d.element.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.live_count() == 0
    }

    pub fn scene(&self, handle: ViewportHandle) -> Option<&SceneLayer> {
        self.descriptors.iter().find(|d| d.handle == handle).map(|d| &d.scene)
    }

    pub fn scene_mut(&mut self, handle: ViewportHandle) -> Option<&mut SceneLayer> {
        self.descriptors.iter_mut().find(|d| d.handle == handle).map(|d| &mut d.scene)
    }

    pub fn scenes_mut(&mut self) -> impl Iterator<Item = (ViewportHandle, &mut SceneLayer)> {
        self.descriptors.iter_mut().map(|d| (d.handle, &mut d.scene))
    }

    /// Drops descriptors whose element no longer exists.
    pub fn prune(&mut self) {
        self.descriptors.retain(|d| {
            let alive = d.element.strong_count() > 0;
            if !alive {
                log::debug!("viewport {:?} pruned: element dropped", d.handle);
            }
            alive
        });
    }

    /// Viewports to draw this frame, in compositing order.
    ///
    /// Every element is re-measured. Elements that are gone, not laid out, zero-size or
    /// scrolled off the surface are left out for this frame only. Order is document
    /// order: top edge, then left edge, then registration order.
    pub fn frame_rects(&mut self, metrics: &SurfaceMetrics) -> Vec<ViewportFrame> {
        self.prune();

        let mut frames: Vec<(Rect, ViewportFrame)> = self
            .descriptors
            .iter()
            .filter_map(|d| {
                let element = d.element.upgrade()?;
                let doc = element.document_rect()?;
                let rect = ViewportRect::from_document(doc, metrics)?;
                Some((doc, ViewportFrame { handle: d.handle, rect }))
            })
            .collect();

        frames.sort_by(|(a, fa), (b, fb)| document_order(*a, fa.handle, *b, fb.handle));
        frames.into_iter().map(|(_, f)| f).collect()
    }

    /// Topmost viewport under a window point (logical px).
    ///
    /// "Topmost" is the last one in compositing order, matching what is drawn on top.
    pub fn hit_test(&self, metrics: &SurfaceMetrics, point: Vec2) -> Option<ViewportHit> {
        let doc_point = point + metrics.scroll;
        let mut best: Option<(Rect, ViewportHandle)> = None;

        for d in &self.descriptors {
            let Some(element) = d.element.upgrade() else { continue };
            let Some(doc) = element.document_rect() else { continue };
            if doc.is_empty() || !doc.contains(doc_point) {
                continue;
            }
            let later = match best {
                None => true,
                Some((b, h)) => document_order(doc, d.handle, b, h) == Ordering::Greater,
            };
            if later {
                best = Some((doc, d.handle));
            }
        }

        best.map(|(doc, handle)| ViewportHit {
            handle,
            local: doc.normalize_point(doc_point),
            size: doc.size,
        })
    }
}

fn document_order(a: Rect, ha: ViewportHandle, b: Rect, hb: ViewportHandle) -> Ordering {
    a.min()
        .y
        .total_cmp(&b.min().y)
        .then(a.min().x.total_cmp(&b.min().x))
        .then(ha.cmp(&hb))
}

/// Result of [`ViewportRegistry::hit_test`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportHit {
    pub handle: ViewportHandle,
    /// Point inside the element, `(0, 0)` top-left to `(1, 1)` bottom-right.
    pub local: Vec2,
    /// Element size in logical px.
    pub size: Vec2,
}

impl ViewportHit {
    /// The hit point in NDC of the viewport (`+Y` up).
    pub fn ndc(&self) -> Vec2 {
        Vec2::new(self.local.x * 2.0 - 1.0, 1.0 - self.local.y * 2.0)
    }

    pub fn aspect(&self) -> f32 {
        if self.size.y > 0.0 { self.size.x / self.size.y } else { 1.0 }
    }
}
