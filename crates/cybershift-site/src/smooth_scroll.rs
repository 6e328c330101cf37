//! Smoothed page scrolling.

use std::collections::HashSet;

use cybershift_engine::anim::{damp, lambda_for_lerp};
use cybershift_engine::input::Key;

/// Tuning for [`SmoothScroll`].
#[derive(Debug, Clone)]
pub struct SmoothScrollConfig {
    /// Fraction of the remaining distance covered per frame at 60 fps.
    pub lerp: f32,
    pub wheel_multiplier: f32,
    /// Pixels per wheel line (notched wheels).
    pub line_height: f32,
    /// Pixels per arrow key press.
    pub key_step: f32,
    /// Fraction of the viewport height per PageUp/PageDown/Space.
    pub page_fraction: f32,
}

impl Default for SmoothScrollConfig {
    fn default() -> Self {
        Self {
            lerp: 0.1,
            wheel_multiplier: 1.0,
            line_height: 80.0,
            key_step: 40.0,
            page_fraction: 0.9,
        }
    }
}

/// Scroll position that eases toward a target set by wheel and keyboard input.
///
/// The approach is exponential and frame-rate independent: with the default config,
/// one 60 fps frame covers 10% of the remaining distance.
#[derive(Debug, Clone)]
pub struct SmoothScroll {
    config: SmoothScrollConfig,
    lambda: f32,
    current: f32,
    target: f32,
    limit: f32,
}

/// Below this distance the position snaps onto the target.
const SETTLE: f32 = 0.05;

impl SmoothScroll {
    pub fn new(config: SmoothScrollConfig) -> Self {
        let lambda = lambda_for_lerp(config.lerp, 60.0);
        Self { config, lambda, current: 0.0, target: 0.0, limit: 0.0 }
    }

    pub fn config(&self) -> &SmoothScrollConfig {
        &self.config
    }

    /// Rendered scroll offset.
    pub fn position(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_scrolling(&self) -> bool {
        self.current != self.target
    }

    /// Sets the largest reachable offset. Position and target are clamped to it, so a
    /// shrinking document never leaves the page scrolled past its end.
    pub fn set_limit(&mut self, limit: f32) {
        self.limit = if limit.is_finite() { limit.max(0.0) } else { 0.0 };
        self.target = self.target.clamp(0.0, self.limit);
        self.current = self.current.clamp(0.0, self.limit);
    }

    pub fn scroll_by(&mut self, delta: f32) {
        if delta.is_finite() {
            self.scroll_to(self.target + delta);
        }
    }

    pub fn scroll_to(&mut self, offset: f32) {
        if offset.is_finite() {
            self.target = offset.clamp(0.0, self.limit);
        }
    }

    /// Vertical wheel input in px, positive scrolling down the page.
    pub fn wheel(&mut self, delta: f32) {
        self.scroll_by(delta * self.config.wheel_multiplier);
    }

    /// Keyboard scrolling. Returns `true` when any key moved the target.
    pub fn keys(&mut self, pressed: &HashSet<Key>, shift: bool, viewport_height: f32) -> bool {
        let page = viewport_height * self.config.page_fraction;
        let before = self.target;
        for key in pressed {
            match key {
                Key::ArrowDown => self.scroll_by(self.config.key_step),
                Key::ArrowUp => self.scroll_by(-self.config.key_step),
                Key::PageDown => self.scroll_by(page),
                Key::PageUp => self.scroll_by(-page),
                Key::Space if shift => self.scroll_by(-page),
                Key::Space => self.scroll_by(page),
                Key::Home => self.scroll_to(0.0),
                Key::End => self.scroll_to(self.limit),
                _ => {}
            }
        }
        self.target != before
    }

    /// Advances by `dt` seconds and returns the new position.
    pub fn update(&mut self, dt: f32) -> f32 {
        if dt.is_finite() && dt > 0.0 {
            self.current = damp(self.current, self.target, self.lambda, dt);
        }
        if (self.target - self.current).abs() < SETTLE {
            self.current = self.target;
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scroller(limit: f32) -> SmoothScroll {
        let mut s = SmoothScroll::new(SmoothScrollConfig::default());
        s.set_limit(limit);
        s
    }

    // ── damping ───────────────────────────────────────────────────────────

    #[test]
    fn one_frame_at_60fps_covers_a_tenth() {
        let mut s = scroller(1000.0);
        s.scroll_to(100.0);
        let y = s.update(1.0 / 60.0);
        assert!((y - 10.0).abs() < 1e-3, "{y}");
    }

    #[test]
    fn approach_is_frame_rate_independent() {
        let mut a = scroller(1000.0);
        let mut b = scroller(1000.0);
        a.scroll_to(500.0);
        b.scroll_to(500.0);
        a.update(1.0 / 60.0);
        b.update(1.0 / 120.0);
        b.update(1.0 / 120.0);
        assert!((a.position() - b.position()).abs() < 1e-2);
    }

    #[test]
    fn settles_exactly_on_target() {
        let mut s = scroller(1000.0);
        s.scroll_to(300.0);
        for _ in 0..600 {
            s.update(1.0 / 60.0);
        }
        assert_eq!(s.position(), 300.0);
        assert!(!s.is_scrolling());
    }

    #[test]
    fn zero_or_bad_dt_does_not_move() {
        let mut s = scroller(1000.0);
        s.scroll_to(300.0);
        assert_eq!(s.update(0.0), 0.0);
        assert_eq!(s.update(f32::NAN), 0.0);
    }

    // ── limits ────────────────────────────────────────────────────────────

    #[test]
    fn target_is_clamped_to_the_document() {
        let mut s = scroller(500.0);
        s.scroll_by(-50.0);
        assert_eq!(s.target(), 0.0);
        s.scroll_by(10_000.0);
        assert_eq!(s.target(), 500.0);
    }

    #[test]
    fn shrinking_limit_pulls_position_back() {
        let mut s = scroller(1000.0);
        s.scroll_to(900.0);
        for _ in 0..600 {
            s.update(1.0 / 60.0);
        }
        s.set_limit(400.0);
        assert_eq!(s.position(), 400.0);
        assert_eq!(s.target(), 400.0);
    }

    // ── input ─────────────────────────────────────────────────────────────

    #[test]
    fn wheel_applies_the_multiplier() {
        let mut s = SmoothScroll::new(SmoothScrollConfig { wheel_multiplier: 2.0, ..Default::default() });
        s.set_limit(1000.0);
        s.wheel(80.0);
        assert_eq!(s.target(), 160.0);
        s.wheel(-60.0);
        assert_eq!(s.target(), 40.0);
    }

    #[test]
    fn keys_move_by_step_and_page() {
        let mut s = scroller(5000.0);
        assert!(s.keys(&HashSet::from([Key::PageDown]), false, 800.0));
        assert_eq!(s.target(), 720.0);
        s.keys(&HashSet::from([Key::ArrowUp]), false, 800.0);
        assert_eq!(s.target(), 680.0);
        s.keys(&HashSet::from([Key::Space]), true, 800.0);
        assert_eq!(s.target(), 0.0);
        s.keys(&HashSet::from([Key::End]), false, 800.0);
        assert_eq!(s.target(), 5000.0);
        assert!(!s.keys(&HashSet::from([Key::Escape]), false, 800.0));
    }
}
