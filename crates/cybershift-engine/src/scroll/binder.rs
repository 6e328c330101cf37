use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::anim::{Ease, SmoothDamp};
use crate::coords::Rect;

use super::{PropertyPath, PropertyTargets, ScrollPosition, TargetRef};

/// A page section that can trigger timelines.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u32);

/// Resolves trigger regions to their current document rect.
pub trait RegionSource {
    /// `None` while the region is not laid out; timelines on it are skipped.
    fn region_rect(&self, region: RegionId) -> Option<Rect>;
}

/// How progress follows the raw scroll fraction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Scrub {
    /// Progress equals the raw fraction.
    Immediate,
    /// Progress approaches the raw fraction, catching up in about this many seconds.
    Lag(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollTrigger {
    pub region: RegionId,
    pub start: ScrollPosition,
    pub end: ScrollPosition,
    pub scrub: Scrub,
    pub pin: bool,
}

impl ScrollTrigger {
    pub fn new(region: RegionId, start: ScrollPosition, end: ScrollPosition) -> Self {
        Self { region, start, end, scrub: Scrub::Immediate, pin: false }
    }

    pub fn scrub(mut self, lag: f32) -> Self {
        self.scrub = if lag > 0.0 { Scrub::Lag(lag) } else { Scrub::Immediate };
        self
    }

    pub fn pinned(mut self) -> Self {
        self.pin = true;
        self
    }

    /// `(start, end)` in document scroll px.
    pub fn resolve(&self, region: Rect, viewport_height: f32) -> (f32, f32) {
        let start = self.start.resolve(region, viewport_height, None);
        let end = self.end.resolve(region, viewport_height, Some(start));
        (start, end)
    }
}

/// One animated property of a timeline.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PropertyTween {
    pub target: TargetRef,
    pub path: PropertyPath,
    /// Start value; `None` takes the property's value when the timeline first runs.
    pub from: Option<f32>,
    pub to: f32,
    pub ease: Ease,
}

impl PropertyTween {
    pub fn to(target: TargetRef, path: PropertyPath, to: f32) -> Self {
        Self { target, path, from: None, to, ease: Ease::None }
    }

    pub fn from(mut self, from: f32) -> Self {
        self.from = Some(from);
        self
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }
}

/// Raw scroll fraction: `clamp((scroll - start) / (end - start), 0, 1)`.
///
/// A zero-length range is a step at `start`.
pub fn progress(scroll: f32, start: f32, end: f32) -> f32 {
    let span = end - start;
    if !(span > 0.0) {
        return if scroll >= start { 1.0 } else { 0.0 };
    }
    ((scroll - start) / span).clamp(0.0, 1.0)
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TimelineId(u64);

/// Resolved pin of a region: fixed at the viewport top while scroll is in
/// `[start, end]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PinSpan {
    pub timeline: TimelineId,
    pub region: RegionId,
    pub start: f32,
    pub end: f32,
}

impl PinSpan {
    /// Spacing the page inserts after the pinned region.
    pub fn duration(&self) -> f32 {
        (self.end - self.start).max(0.0)
    }

    /// How far the pinned region is pushed down at `scroll`.
    pub fn offset(&self, scroll: f32) -> f32 {
        (scroll - self.start).clamp(0.0, self.duration())
    }
}

struct BoundTween {
    spec: PropertyTween,
    /// Value before the timeline first touched the property.
    original: Option<f32>,
}

struct TimelineState {
    id: TimelineId,
    trigger: ScrollTrigger,
    tweens: Vec<BoundTween>,
    smooth: Option<SmoothDamp>,
    progress: Option<f32>,
}

#[derive(Default)]
struct Shared {
    timelines: RefCell<Vec<TimelineState>>,
    /// Disposals requested while `timelines` was borrowed by a tick.
    deferred: RefCell<Vec<TimelineId>>,
    next_id: Cell<u64>,
}

impl Shared {
    fn remove(&self, id: TimelineId) {
        match self.timelines.try_borrow_mut() {
            Ok(mut timelines) => {
                timelines.retain(|t| t.id != id);
            }
            Err(_) => self.deferred.borrow_mut().push(id),
        }
    }

    fn apply_deferred(&self, timelines: &mut Vec<TimelineState>) {
        let ids: Vec<TimelineId> = self.deferred.borrow_mut().drain(..).collect();
        if !ids.is_empty() {
            timelines.retain(|t| !ids.contains(&t.id));
        }
    }
}

/// Binds scene properties to the scroll position of page regions.
///
/// Each binding is owned by the [`TimelineHandle`] returned from [`ScrollBinder::bind`];
/// dropping or disposing the handle removes the binding and any pin it holds.
#[derive(Default)]
pub struct ScrollBinder {
    shared: Rc<Shared>,
}

impl ScrollBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, trigger: ScrollTrigger, tweens: Vec<PropertyTween>) -> TimelineHandle {
        let id = TimelineId(self.shared.next_id.get());
        self.shared.next_id.set(id.0 + 1);

        let state = TimelineState {
            id,
            trigger,
            tweens: tweens.into_iter().map(|spec| BoundTween { spec, original: None }).collect(),
            smooth: None,
            progress: None,
        };
        match self.shared.timelines.try_borrow_mut() {
            Ok(mut timelines) => timelines.push(state),
            Err(_) => {
                log::warn!("timeline bound during a scroll tick; ignored");
                return TimelineHandle { id, shared: None };
            }
        }
        log::debug!("timeline {id:?} bound");

        TimelineHandle { id, shared: Some(Rc::downgrade(&self.shared)) }
    }

    pub fn len(&self) -> usize {
        self.shared.timelines.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advances every timeline to `scroll` and writes the interpolated properties.
    ///
    /// Trigger positions are resolved from the region's current rect on every call.
    pub fn tick(
        &self,
        scroll: f32,
        viewport_height: f32,
        dt: f32,
        regions: &dyn RegionSource,
        targets: &mut dyn PropertyTargets,
    ) {
        let Ok(mut timelines) = self.shared.timelines.try_borrow_mut() else {
            log::warn!("nested scroll tick skipped");
            return;
        };
        self.shared.apply_deferred(&mut timelines);

        for tl in timelines.iter_mut() {
            let Some(rect) = regions.region_rect(tl.trigger.region) else { continue };
            let (start, end) = tl.trigger.resolve(rect, viewport_height);
            let raw = progress(scroll, start, end);

            let p = match tl.trigger.scrub {
                Scrub::Immediate => raw,
                Scrub::Lag(lag) => match tl.smooth.as_mut() {
                    Some(smooth) => smooth.step(raw, lag, dt),
                    None => {
                        tl.smooth = Some(SmoothDamp::new(raw));
                        raw
                    }
                },
            };
            tl.progress = Some(p);

            for tween in tl.tweens.iter_mut() {
                let spec = tween.spec;
                if tween.original.is_none() {
                    tween.original = targets.get(spec.target, spec.path);
                }
                let Some(from) = spec.from.or(tween.original) else { continue };
                let t = spec.ease.apply(p);
                targets.set(spec.target, spec.path, from + (spec.to - from) * t);
            }
        }

        self.shared.apply_deferred(&mut timelines);
    }

    /// Pins of every live pinned timeline, resolved against current region rects,
    /// ordered by start.
    pub fn pin_spans(&self, regions: &dyn RegionSource, viewport_height: f32) -> Vec<PinSpan> {
        let timelines = self.shared.timelines.borrow();
        let mut spans: Vec<PinSpan> = timelines
            .iter()
            .filter(|t| t.trigger.pin)
            .filter_map(|t| {
                let rect = regions.region_rect(t.trigger.region)?;
                let (start, end) = t.trigger.resolve(rect, viewport_height);
                Some(PinSpan { timeline: t.id, region: t.trigger.region, start, end })
            })
            .collect();
        spans.sort_by(|a, b| a.start.total_cmp(&b.start));
        spans
    }
}

/// Ownership of one timeline. Dropping it disposes the timeline.
#[derive(Debug)]
pub struct TimelineHandle {
    id: TimelineId,
    shared: Option<Weak<Shared>>,
}

impl TimelineHandle {
    pub fn id(&self) -> TimelineId {
        self.id
    }

    pub fn is_live(&self) -> bool {
        self.shared
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|s| s.timelines.try_borrow().map_or(true, |t| t.iter().any(|t| t.id == self.id)))
    }

    /// Smoothed progress from the latest tick, `None` before the first tick.
    pub fn progress(&self) -> Option<f32> {
        let shared = self.shared.as_ref()?.upgrade()?;
        let timelines = shared.timelines.try_borrow().ok()?;
        timelines.iter().find(|t| t.id == self.id)?.progress
    }

    /// Removes the timeline and its pin. Properties keep their current values.
    /// Calling it again does nothing.
    pub fn dispose(&mut self) {
        let Some(shared) = self.shared.take().and_then(|w| w.upgrade()) else { return };
        shared.remove(self.id);
        log::debug!("timeline {:?} disposed", self.id);
    }

    /// Restores every property to its value before the timeline first ran, then
    /// disposes.
    pub fn revert(&mut self, targets: &mut dyn PropertyTargets) {
        if let Some(shared) = self.shared.as_ref().and_then(Weak::upgrade) {
            let originals: Vec<(TargetRef, PropertyPath, f32)> = match shared.timelines.try_borrow() {
                Ok(timelines) => timelines
                    .iter()
                    .filter(|t| t.id == self.id)
                    .flat_map(|t| t.tweens.iter())
                    .filter_map(|tw| Some((tw.spec.target, tw.spec.path, tw.original?)))
                    .collect(),
                Err(_) => Vec::new(),
            };
            // Reverse so the first tween's original wins when two share a property.
            for (target, path, value) in originals.into_iter().rev() {
                targets.set(target, path, value);
            }
        }
        self.dispose();
    }
}

impl Drop for TimelineHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::scene::MeshId;
    use crate::scroll::{Anchor, Axis};

    #[derive(Default)]
    struct Props(HashMap<(TargetRef, PropertyPath), f32>);

    impl PropertyTargets for Props {
        fn get(&self, target: TargetRef, path: PropertyPath) -> Option<f32> {
            self.0.get(&(target, path)).copied()
        }

        fn set(&mut self, target: TargetRef, path: PropertyPath, value: f32) -> bool {
            match self.0.get_mut(&(target, path)) {
                Some(v) => {
                    *v = value;
                    true
                }
                None => false,
            }
        }
    }

    struct Regions(HashMap<RegionId, Rect>);

    impl RegionSource for Regions {
        fn region_rect(&self, region: RegionId) -> Option<Rect> {
            self.0.get(&region).copied()
        }
    }

    const LAB: RegionId = RegionId(1);
    const Z: PropertyPath = PropertyPath::Position(Axis::Z);

    fn target() -> TargetRef {
        TargetRef::main(MeshId(0))
    }

    fn props(z: f32) -> Props {
        let mut p = Props::default();
        p.0.insert((target(), Z), z);
        p
    }

    fn regions() -> Regions {
        Regions(HashMap::from([(LAB, Rect::new(0.0, 1000.0, 800.0, 800.0))]))
    }

    fn absolute(start: f32, end: f32) -> ScrollTrigger {
        ScrollTrigger::new(LAB, ScrollPosition::Absolute(start), ScrollPosition::Absolute(end))
    }

    // ── progress ──────────────────────────────────────────────────────────

    #[test]
    fn progress_is_clamped_fraction_of_range() {
        assert_eq!(progress(0.0, 0.0, 1000.0), 0.0);
        assert_eq!(progress(500.0, 0.0, 1000.0), 0.5);
        assert_eq!(progress(1000.0, 0.0, 1000.0), 1.0);
        assert_eq!(progress(1200.0, 0.0, 1000.0), 1.0);
        assert_eq!(progress(-100.0, 0.0, 1000.0), 0.0);
    }

    #[test]
    fn empty_range_is_a_step() {
        assert_eq!(progress(99.0, 100.0, 100.0), 0.0);
        assert_eq!(progress(100.0, 100.0, 100.0), 1.0);
    }

    // ── ticking ───────────────────────────────────────────────────────────

    #[test]
    fn tick_sets_lerped_value_without_scrub() {
        let binder = ScrollBinder::new();
        let mut p = props(0.0);
        let _tl = binder.bind(absolute(0.0, 1000.0), vec![PropertyTween::to(target(), Z, 3.0)]);

        for (scroll, expected) in [(0.0, 0.0), (500.0, 1.5), (1000.0, 3.0), (1200.0, 3.0), (-100.0, 0.0)] {
            binder.tick(scroll, 800.0, 1.0 / 60.0, &regions(), &mut p);
            assert!((p.get(target(), Z).unwrap() - expected).abs() < 1e-5, "scroll {scroll}");
        }
    }

    #[test]
    fn from_is_captured_on_first_tick() {
        let binder = ScrollBinder::new();
        let mut p = props(-2.0);
        let _tl = binder.bind(absolute(0.0, 100.0), vec![PropertyTween::to(target(), Z, 2.0)]);
        binder.tick(50.0, 800.0, 0.016, &regions(), &mut p);
        assert!((p.get(target(), Z).unwrap() - 0.0).abs() < 1e-5);
        binder.tick(0.0, 800.0, 0.016, &regions(), &mut p);
        assert!((p.get(target(), Z).unwrap() + 2.0).abs() < 1e-5);
    }

    #[test]
    fn scrub_lags_then_converges() {
        let binder = ScrollBinder::new();
        let mut p = props(0.0);
        let tl = binder.bind(absolute(0.0, 1000.0).scrub(1.0), vec![PropertyTween::to(target(), Z, 1.0)]);

        binder.tick(0.0, 800.0, 0.016, &regions(), &mut p);
        binder.tick(1000.0, 800.0, 0.016, &regions(), &mut p);
        let lagged = tl.progress().unwrap();
        assert!(lagged > 0.0 && lagged < 0.5, "{lagged}");

        for _ in 0..600 {
            binder.tick(1000.0, 800.0, 0.016, &regions(), &mut p);
        }
        assert!((tl.progress().unwrap() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn positions_follow_region_each_tick() {
        let binder = ScrollBinder::new();
        let mut p = props(0.0);
        let trigger = ScrollTrigger::new(
            LAB,
            ScrollPosition::relative(Anchor::Top, Anchor::Top),
            ScrollPosition::relative(Anchor::Bottom, Anchor::Top),
        );
        let tl = binder.bind(trigger, vec![PropertyTween::to(target(), Z, 1.0)]);

        binder.tick(1400.0, 800.0, 0.016, &regions(), &mut p);
        assert_eq!(tl.progress(), Some(0.5));

        let moved = Regions(HashMap::from([(LAB, Rect::new(0.0, 1400.0, 800.0, 800.0))]));
        binder.tick(1400.0, 800.0, 0.016, &moved, &mut p);
        assert_eq!(tl.progress(), Some(0.0));
    }

    #[test]
    fn missing_region_skips_timeline() {
        let binder = ScrollBinder::new();
        let mut p = props(7.0);
        let tl = binder.bind(absolute(0.0, 10.0), vec![PropertyTween::to(target(), Z, 1.0)]);
        binder.tick(5.0, 800.0, 0.016, &Regions(HashMap::new()), &mut p);
        assert_eq!(tl.progress(), None);
        assert_eq!(p.get(target(), Z), Some(7.0));
    }

    #[test]
    fn eased_tween_uses_curve() {
        let binder = ScrollBinder::new();
        let mut p = props(0.0);
        let _tl = binder.bind(
            absolute(0.0, 100.0),
            vec![PropertyTween::to(target(), Z, 1.0).ease(Ease::POWER1_IN)],
        );
        binder.tick(50.0, 800.0, 0.016, &regions(), &mut p);
        assert!((p.get(target(), Z).unwrap() - 0.25).abs() < 1e-5);
    }

    // ── disposal ──────────────────────────────────────────────────────────

    #[test]
    fn dispose_is_idempotent_and_drop_disposes() {
        let binder = ScrollBinder::new();
        let mut a = binder.bind(absolute(0.0, 1.0), Vec::new());
        let b = binder.bind(absolute(0.0, 1.0), Vec::new());
        assert_eq!(binder.len(), 2);

        a.dispose();
        a.dispose();
        assert!(!a.is_live());
        assert_eq!(binder.len(), 1);

        drop(b);
        assert!(binder.is_empty());
    }

    #[test]
    fn revert_restores_original_values() {
        let binder = ScrollBinder::new();
        let mut p = props(-2.0);
        let mut tl = binder.bind(absolute(0.0, 100.0), vec![PropertyTween::to(target(), Z, 3.0)]);
        binder.tick(100.0, 800.0, 0.016, &regions(), &mut p);
        assert_eq!(p.get(target(), Z), Some(3.0));

        tl.revert(&mut p);
        assert_eq!(p.get(target(), Z), Some(-2.0));
        assert!(binder.is_empty());
    }

    #[test]
    fn handle_outliving_binder_is_harmless() {
        let binder = ScrollBinder::new();
        let mut tl = binder.bind(absolute(0.0, 1.0), Vec::new());
        drop(binder);
        assert!(!tl.is_live());
        tl.dispose();
    }

    struct DisposingTargets {
        inner: Props,
        victim: Option<TimelineHandle>,
    }

    impl PropertyTargets for DisposingTargets {
        fn get(&self, target: TargetRef, path: PropertyPath) -> Option<f32> {
            self.inner.get(target, path)
        }

        fn set(&mut self, target: TargetRef, path: PropertyPath, value: f32) -> bool {
            self.victim = None;
            self.inner.set(target, path, value)
        }
    }

    #[test]
    fn disposal_during_tick_is_deferred() {
        let binder = ScrollBinder::new();
        let _driver = binder.bind(absolute(0.0, 1.0), vec![PropertyTween::to(target(), Z, 1.0)]);
        let victim = binder.bind(absolute(0.0, 1.0), Vec::new());
        let mut t = DisposingTargets { inner: props(0.0), victim: Some(victim) };

        binder.tick(1.0, 800.0, 0.016, &regions(), &mut t);
        assert!(t.victim.is_none());
        assert_eq!(binder.len(), 1);
    }

    // ── pins ──────────────────────────────────────────────────────────────

    fn pinned_lab() -> ScrollTrigger {
        ScrollTrigger::new(
            LAB,
            ScrollPosition::relative(Anchor::Top, Anchor::Top),
            ScrollPosition::relative(Anchor::Bottom, Anchor::Top),
        )
        .pinned()
    }

    #[test]
    fn pin_span_offsets_region() {
        let binder = ScrollBinder::new();
        let _tl = binder.bind(pinned_lab(), Vec::new());
        let spans = binder.pin_spans(&regions(), 800.0);
        assert_eq!(spans.len(), 1);
        let s = spans[0];
        assert_eq!((s.start, s.end, s.duration()), (1000.0, 1800.0, 800.0));
        assert_eq!(s.offset(500.0), 0.0);
        assert_eq!(s.offset(1300.0), 300.0);
        assert_eq!(s.offset(5000.0), 800.0);
    }

    #[test]
    fn unmounting_releases_pin_across_cycles() {
        let binder = ScrollBinder::new();
        for _ in 0..2 {
            let tl = binder.bind(pinned_lab(), Vec::new());
            assert_eq!(binder.pin_spans(&regions(), 800.0).len(), 1);
            drop(tl);
            assert!(binder.pin_spans(&regions(), 800.0).is_empty());
        }
        assert!(binder.is_empty());
    }
}
