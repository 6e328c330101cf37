//! Page layout.
//!
//! Sections stack vertically in document space: hero, fabric lab, lookbook, footer.
//! Pinned timelines add spacing after their region so the page scrolls through the
//! pin before the next section arrives.

use std::cell::Cell;

use glam::Vec2;

use cybershift_engine::coords::{Rect, Viewport};
use cybershift_engine::scroll::{PinSpan, RegionId, RegionSource, ScrollBinder};
use cybershift_engine::viewport::TrackedElement;

pub const HERO: RegionId = RegionId(0);
pub const FABRIC_LAB: RegionId = RegionId(1);
pub const LOOKBOOK: RegionId = RegionId(2);
pub const FOOTER: RegionId = RegionId(3);

/// Breakpoint above which the fabric lab circles sit in a row.
const WIDE_BREAKPOINT: f32 = 768.0;

const LAB_PADDING_Y: f32 = 80.0;
/// Title, subtitle and the gap below them.
const LAB_HEADER: f32 = 188.0;
const LAB_GAP: f32 = 48.0;
/// Label under each circle, including its top margin.
const LAB_LABEL: f32 = 44.0;
/// Circle diameters: Sleeve, Grain, Fiber.
pub const LAB_DIAMETERS: [f32; 3] = [256.0, 352.0, 256.0];

/// A page element whose rect is written by layout and read by a tracked viewport.
#[derive(Debug, Default)]
pub struct TrackedBox {
    rect: Cell<Option<Rect>>,
}

impl TrackedBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, rect: Option<Rect>) {
        self.rect.set(rect);
    }

    pub fn get(&self) -> Option<Rect> {
        self.rect.get()
    }
}

impl TrackedElement for TrackedBox {
    fn document_rect(&self) -> Option<Rect> {
        self.rect.get()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub viewport: Viewport,
    pub hero: Rect,
    pub fabric_lab: Rect,
    /// Fabric lab circles before pinning and hover scaling.
    pub lab_circles: [Rect; 3],
    pub lookbook: Rect,
    pub footer: Rect,
    /// Document height including pin spacing.
    pub height: f32,
    pins: Vec<PinSpan>,
}

impl PageLayout {
    /// Lays out the sections with `spacing` inserted after each pinned region.
    pub fn compute(viewport: Viewport, spacing: &[PinSpan]) -> Self {
        let w = viewport.width.max(0.0);
        let vh = viewport.height.max(0.0);
        let spacing_after = |region: RegionId| -> f32 {
            spacing.iter().filter(|p| p.region == region).map(PinSpan::duration).sum()
        };

        let mut y = 0.0;

        let hero = Rect::new(0.0, y, w, vh);
        y += hero.height() + spacing_after(HERO);

        let (fabric_lab, lab_circles) = layout_fabric_lab(y, w, vh);
        y += fabric_lab.height() + spacing_after(FABRIC_LAB);

        let lookbook = Rect::new(0.0, y, w, vh);
        y += lookbook.height() + spacing_after(LOOKBOOK);

        let footer = Rect::new(0.0, y, w, vh * 0.5);
        y += footer.height();

        Self { viewport, hero, fabric_lab, lab_circles, lookbook, footer, height: y, pins: Vec::new() }
    }

    /// Lays out against the binder's current pins.
    ///
    /// Spacing only depends on pin durations, so the first pass measures the regions
    /// and the second places everything; pin positions are then re-read from the final
    /// layout.
    pub fn with_pins(viewport: Viewport, binder: &ScrollBinder) -> Self {
        let measured = Self::compute(viewport, &[]);
        let spacing = binder.pin_spans(&measured, viewport.height);
        let mut layout = Self::compute(viewport, &spacing);
        layout.pins = binder.pin_spans(&layout, viewport.height);
        layout
    }

    pub fn max_scroll(&self) -> f32 {
        (self.height - self.viewport.height).max(0.0)
    }

    pub fn pins(&self) -> &[PinSpan] {
        &self.pins
    }

    /// How far `region` is pushed down at `scroll` to stay pinned.
    pub fn pin_offset(&self, region: RegionId, scroll: f32) -> f32 {
        self.pins.iter().filter(|p| p.region == region).map(|p| p.offset(scroll)).sum()
    }

    /// `rect` inside `region` as displayed at `scroll`.
    pub fn displayed(&self, region: RegionId, rect: Rect, scroll: f32) -> Rect {
        rect.translated(Vec2::new(0.0, self.pin_offset(region, scroll)))
    }
}

impl RegionSource for PageLayout {
    fn region_rect(&self, region: RegionId) -> Option<Rect> {
        let rect = match region {
            HERO => self.hero,
            FABRIC_LAB => self.fabric_lab,
            LOOKBOOK => self.lookbook,
            FOOTER => self.footer,
            _ => return None,
        };
        (!rect.is_empty()).then_some(rect)
    }
}

/// `rect` grown or shrunk by `scale` around its centre.
pub fn scale_about_center(rect: Rect, scale: f32) -> Rect {
    let size = rect.size * scale;
    Rect::from_origin_size(rect.center() - size * 0.5, size)
}

fn layout_fabric_lab(top: f32, w: f32, vh: f32) -> (Rect, [Rect; 3]) {
    let wide = w >= WIDE_BREAKPOINT;
    let items_h = if wide {
        LAB_DIAMETERS.iter().fold(0.0f32, |m, d| m.max(*d)) + LAB_LABEL
    } else {
        LAB_DIAMETERS.iter().map(|d| d + LAB_LABEL).sum::<f32>() + LAB_GAP * 2.0
    };
    let content_h = LAB_PADDING_Y * 2.0 + LAB_HEADER + items_h;
    let section = Rect::new(0.0, top, w, content_h.max(vh));

    let items_top = top + (section.height() - content_h) * 0.5 + LAB_PADDING_Y + LAB_HEADER;
    let mut circles = [Rect::default(); 3];

    if wide {
        let row_w = LAB_DIAMETERS.iter().sum::<f32>() + LAB_GAP * 2.0;
        let mut x = (w - row_w) * 0.5;
        for (circle, d) in circles.iter_mut().zip(LAB_DIAMETERS) {
            let item_top = items_top + (items_h - (d + LAB_LABEL)) * 0.5;
            *circle = Rect::new(x, item_top, d, d);
            x += d + LAB_GAP;
        }
    } else {
        let mut y = items_top;
        for (circle, d) in circles.iter_mut().zip(LAB_DIAMETERS) {
            *circle = Rect::new((w - d) * 0.5, y, d, d);
            y += d + LAB_LABEL + LAB_GAP;
        }
    }

    (section, circles)
}

#[cfg(test)]
mod tests {
    use cybershift_engine::scroll::{ScrollPosition, ScrollTrigger};

    use super::*;

    fn desktop() -> Viewport {
        Viewport::new(1280.0, 800.0)
    }

    // ── sections ──────────────────────────────────────────────────────────

    #[test]
    fn sections_stack_in_order() {
        let l = PageLayout::compute(desktop(), &[]);
        assert_eq!(l.hero, Rect::new(0.0, 0.0, 1280.0, 800.0));
        assert_eq!(l.fabric_lab.min().y, 800.0);
        assert_eq!(l.lookbook.min().y, l.fabric_lab.max().y);
        assert_eq!(l.footer.min().y, l.lookbook.max().y);
        assert_eq!(l.footer.height(), 400.0);
        assert_eq!(l.height, l.footer.max().y);
        assert_eq!(l.max_scroll(), l.height - 800.0);
    }

    #[test]
    fn fabric_lab_is_at_least_one_screen() {
        let short = PageLayout::compute(Viewport::new(1280.0, 400.0), &[]);
        assert!(short.fabric_lab.height() > 400.0);
        let tall = PageLayout::compute(Viewport::new(1280.0, 1400.0), &[]);
        assert_eq!(tall.fabric_lab.height(), 1400.0);
    }

    #[test]
    fn wide_lab_puts_circles_in_a_centred_row() {
        let l = PageLayout::compute(desktop(), &[]);
        let [a, b, c] = l.lab_circles;
        assert_eq!(a.size, Vec2::splat(256.0));
        assert_eq!(b.size, Vec2::splat(352.0));
        assert_eq!(b.min().x, a.max().x + LAB_GAP);
        assert_eq!(c.min().x, b.max().x + LAB_GAP);
        assert!((a.min().x - (1280.0 - c.max().x)).abs() < 1e-3);
        assert!((a.center().y - b.center().y).abs() < 1e-3);
        assert!(l.fabric_lab.contains(b.center()));
    }

    #[test]
    fn narrow_lab_stacks_circles() {
        let l = PageLayout::compute(Viewport::new(400.0, 800.0), &[]);
        let [a, b, c] = l.lab_circles;
        assert!(b.min().y > a.max().y);
        assert!(c.min().y > b.max().y);
        assert!((a.center().x - 200.0).abs() < 1e-3);
    }

    // ── pins ──────────────────────────────────────────────────────────────

    fn pin_fabric_lab(binder: &ScrollBinder) -> cybershift_engine::scroll::TimelineHandle {
        let trigger = ScrollTrigger::new(
            FABRIC_LAB,
            "top top".parse::<ScrollPosition>().unwrap(),
            "bottom top".parse::<ScrollPosition>().unwrap(),
        )
        .pinned();
        binder.bind(trigger, Vec::new())
    }

    #[test]
    fn pin_inserts_spacing_after_region() {
        let binder = ScrollBinder::new();
        let plain = PageLayout::with_pins(desktop(), &binder);
        let _pin = pin_fabric_lab(&binder);
        let pinned = PageLayout::with_pins(desktop(), &binder);

        let duration = pinned.fabric_lab.height();
        assert_eq!(pinned.fabric_lab, plain.fabric_lab);
        assert_eq!(pinned.lookbook.min().y, plain.lookbook.min().y + duration);
        assert_eq!(pinned.height, plain.height + duration);
        assert_eq!(pinned.pins().len(), 1);
    }

    #[test]
    fn pinned_region_follows_scroll_between_start_and_end() {
        let binder = ScrollBinder::new();
        let _pin = pin_fabric_lab(&binder);
        let l = PageLayout::with_pins(desktop(), &binder);
        let top = l.fabric_lab.min().y;
        let h = l.fabric_lab.height();

        assert_eq!(l.pin_offset(FABRIC_LAB, top - 100.0), 0.0);
        assert_eq!(l.pin_offset(FABRIC_LAB, top + 50.0), 50.0);
        assert_eq!(l.pin_offset(FABRIC_LAB, top + h + 500.0), h);
        assert_eq!(l.pin_offset(HERO, top + 50.0), 0.0);

        let shown = l.displayed(FABRIC_LAB, l.lab_circles[1], top + 50.0);
        assert_eq!(shown.min().y, l.lab_circles[1].min().y + 50.0);
    }

    #[test]
    fn dropping_the_pin_removes_spacing() {
        let binder = ScrollBinder::new();
        let plain = PageLayout::with_pins(desktop(), &binder);
        let pin = pin_fabric_lab(&binder);
        drop(pin);
        assert_eq!(PageLayout::with_pins(desktop(), &binder), plain);
    }

    // ── regions ───────────────────────────────────────────────────────────

    #[test]
    fn regions_resolve_to_sections() {
        let l = PageLayout::compute(desktop(), &[]);
        assert_eq!(l.region_rect(LOOKBOOK), Some(l.lookbook));
        assert_eq!(l.region_rect(RegionId(42)), None);
        assert_eq!(PageLayout::compute(Viewport::new(0.0, 0.0), &[]).region_rect(HERO), None);
    }

    #[test]
    fn tracked_box_reports_what_layout_wrote() {
        let b = TrackedBox::new();
        assert_eq!(b.document_rect(), None);
        b.set(Some(Rect::new(1.0, 2.0, 3.0, 4.0)));
        assert_eq!(b.document_rect(), Some(Rect::new(1.0, 2.0, 3.0, 4.0)));
    }
}
