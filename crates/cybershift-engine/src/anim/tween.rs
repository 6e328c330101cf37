use glam::Vec3;

use crate::paint::Color;

use super::Ease;

/// Values that can be interpolated by a tween.
pub trait Lerp: Copy {
    fn lerp(self, to: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    #[inline]
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Lerp for Vec3 {
    #[inline]
    fn lerp(self, to: Self, t: f32) -> Self {
        Vec3::lerp(self, to, t)
    }
}

impl Lerp for Color {
    #[inline]
    fn lerp(self, to: Self, t: f32) -> Self {
        Color::lerp(self, to, t)
    }
}

/// Wall-clock tween between two values.
///
/// Retargeting mid-flight starts the new tween from the current value, so there
/// is never a visible jump.
#[derive(Debug, Clone)]
pub struct Tween<T: Lerp> {
    from: T,
    to: T,
    duration: f32,
    elapsed: f32,
    ease: Ease,
}

impl<T: Lerp> Tween<T> {
    /// A tween already at rest on `value`.
    pub fn settled(value: T) -> Self {
        Self { from: value, to: value, duration: 0.0, elapsed: 0.0, ease: Ease::None }
    }

    pub fn value(&self) -> T {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = self.ease.apply(self.elapsed / self.duration);
        self.from.lerp(self.to, t)
    }

    pub fn target(&self) -> T {
        self.to
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Starts a new tween from the current value to `to`.
    pub fn retarget(&mut self, to: T, duration: f32, ease: Ease) {
        self.from = self.value();
        self.to = to;
        self.duration = duration.max(0.0);
        self.elapsed = 0.0;
        self.ease = ease;
    }

    /// Advances by `dt` seconds and returns the new value.
    pub fn advance(&mut self, dt: f32) -> T {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed = (self.elapsed + dt).min(self.duration);
        }
        self.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaches_target_after_duration() {
        let mut t = Tween::settled(0.0f32);
        t.retarget(10.0, 0.8, Ease::POWER2_OUT);
        for _ in 0..100 {
            t.advance(0.01);
        }
        assert!(t.is_finished());
        assert_eq!(t.value(), 10.0);
    }

    #[test]
    fn retarget_mid_flight_continues_from_current_value() {
        let mut t = Tween::settled(0.0f32);
        t.retarget(10.0, 1.0, Ease::None);
        t.advance(0.5);
        t.retarget(0.0, 1.0, Ease::None);
        assert!((t.value() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn colors_interpolate() {
        let mut t = Tween::settled(Color::BLACK);
        t.retarget(Color::WHITE, 1.0, Ease::None);
        let c = t.advance(0.5);
        assert!((c.r - 0.5).abs() < 1e-5);
    }
}
