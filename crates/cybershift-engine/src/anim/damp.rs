//! Frame-rate independent smoothing.

/// Exponential approach of `current` toward `target`.
///
/// `lambda` is the decay rate per second. Equivalent to a per-frame lerp of
/// `1 - exp(-lambda * dt)`, so the result does not depend on the frame rate.
#[inline]
pub fn damp(current: f32, target: f32, lambda: f32, dt: f32) -> f32 {
    current + (target - current) * (1.0 - (-lambda * dt).exp())
}

/// Decay rate equivalent to lerping by `factor` every frame at `fps`.
///
/// `lambda_for_lerp(0.1, 60.0)` reproduces "move 10% of the remaining distance per
/// frame at 60 fps".
pub fn lambda_for_lerp(factor: f32, fps: f32) -> f32 {
    let factor = factor.clamp(1e-4, 0.9999);
    -(1.0 - factor).ln() * fps
}

/// Critically damped spring toward a moving target.
///
/// Reaches the target in roughly `smooth_time` seconds without overshooting.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SmoothDamp {
    pub value: f32,
    pub velocity: f32,
}

impl SmoothDamp {
    pub fn new(value: f32) -> Self {
        Self { value, velocity: 0.0 }
    }

    /// Advances by `dt` seconds and returns the new value.
    pub fn step(&mut self, target: f32, smooth_time: f32, dt: f32) -> f32 {
        if smooth_time <= 0.0 || dt <= 0.0 {
            if smooth_time <= 0.0 {
                self.value = target;
                self.velocity = 0.0;
            }
            return self.value;
        }

        let omega = 2.0 / smooth_time;
        let x = omega * dt;
        // Padé approximation of exp(-x).
        let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);
        let change = self.value - target;
        let temp = (self.velocity + omega * change) * dt;

        self.velocity = (self.velocity - omega * temp) * decay;
        let mut next = target + (change + temp) * decay;

        // Never overshoot.
        if (target - self.value > 0.0) == (next > target) {
            next = target;
            self.velocity = 0.0;
        }

        self.value = next;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damp_matches_per_frame_lerp_at_reference_rate() {
        let lambda = lambda_for_lerp(0.1, 60.0);
        let v = damp(0.0, 100.0, lambda, 1.0 / 60.0);
        assert!((v - 10.0).abs() < 1e-3);
    }

    #[test]
    fn damp_is_frame_rate_independent() {
        let lambda = lambda_for_lerp(0.1, 60.0);
        let mut a = 0.0;
        for _ in 0..60 {
            a = damp(a, 1.0, lambda, 1.0 / 60.0);
        }
        let mut b = 0.0;
        for _ in 0..144 {
            b = damp(b, 1.0, lambda, 1.0 / 144.0);
        }
        assert!((a - b).abs() < 1e-3);
    }

    #[test]
    fn smooth_damp_converges_without_overshoot() {
        let mut s = SmoothDamp::new(0.0);
        let mut max = 0.0f32;
        for _ in 0..600 {
            max = max.max(s.step(1.0, 1.0, 1.0 / 60.0));
        }
        assert!(max <= 1.0);
        assert!((s.value - 1.0).abs() < 1e-3);
    }

    #[test]
    fn zero_smooth_time_snaps() {
        let mut s = SmoothDamp::new(0.0);
        assert_eq!(s.step(0.7, 0.0, 1.0 / 60.0), 0.7);
    }
}
