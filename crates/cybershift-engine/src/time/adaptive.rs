/// Tuning for [`AdaptiveQuality`].
#[derive(Debug, Clone)]
pub struct AdaptiveConfig {
    /// Lowest render scale (fraction of the window's device pixel ratio).
    pub min_scale: f32,
    /// Highest render scale; `1.0` renders at native resolution.
    pub max_scale: f32,
    /// Target frame time in seconds.
    pub frame_budget: f32,
    /// Scale change per adjustment.
    pub step: f32,
    /// Consecutive on-budget frames required before scaling back up.
    pub recover_frames: u32,
    /// Frames to wait after any adjustment before judging again.
    pub cooldown_frames: u32,
    /// EMA weight of the newest frame time.
    pub smoothing: f32,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.5,
            max_scale: 1.0,
            frame_budget: 1.0 / 60.0,
            step: 0.1,
            recover_frames: 30,
            cooldown_frames: 10,
            smoothing: 0.1,
        }
    }
}

/// Average frame time, relative to the budget, above which the scale steps down.
const DEGRADE_RATIO: f32 = 1.2;
/// Average frame time, relative to the budget, at or below which a frame counts as fast.
const RECOVER_RATIO: f32 = 1.05;

/// Render-resolution and event-density controller.
///
/// This is a continuous control, not a failure path: visual fidelity may drop, but
/// every frame is still rendered.
#[derive(Debug, Clone)]
pub struct AdaptiveQuality {
    config: AdaptiveConfig,
    scale: f32,
    avg_dt: Option<f32>,
    fast_streak: u32,
    cooldown: u32,
}

impl AdaptiveQuality {
    pub fn new(config: AdaptiveConfig) -> Self {
        let scale = config.max_scale;
        Self {
            config,
            scale,
            avg_dt: None,
            fast_streak: 0,
            cooldown: 0,
        }
    }

    /// Current render scale in `[min_scale, max_scale]`.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn is_degraded(&self) -> bool {
        self.scale < self.config.max_scale
    }

    /// Pointer-move events are processed every `event_stride()` frames.
    pub fn event_stride(&self) -> u64 {
        if self.is_degraded() { 2 } else { 1 }
    }

    pub fn samples_events(&self, frame_index: u64) -> bool {
        frame_index % self.event_stride() == 0
    }

    /// Feeds one frame time. Returns `true` when the render scale changed.
    pub fn observe(&mut self, dt: f32) -> bool {
        if !dt.is_finite() || dt <= 0.0 {
            return false;
        }

        let avg = match self.avg_dt {
            None => dt,
            Some(prev) => prev + (dt - prev) * self.config.smoothing,
        };
        self.avg_dt = Some(avg);

        if self.cooldown > 0 {
            self.cooldown -= 1;
            return false;
        }

        let budget = self.config.frame_budget;
        if avg > budget * DEGRADE_RATIO {
            self.fast_streak = 0;
            return self.adjust(-self.config.step);
        }

        // Vsync holds frames at the budget, so on-budget counts toward recovery.
        if avg <= budget * RECOVER_RATIO {
            self.fast_streak += 1;
            if self.fast_streak >= self.config.recover_frames {
                self.fast_streak = 0;
                return self.adjust(self.config.step);
            }
        } else {
            self.fast_streak = 0;
        }
        false
    }

    fn adjust(&mut self, delta: f32) -> bool {
        let next = (self.scale + delta).clamp(self.config.min_scale, self.config.max_scale);
        if (next - self.scale).abs() < f32::EPSILON {
            return false;
        }
        log::debug!("adaptive render scale {:.2} -> {:.2}", self.scale, next);
        self.scale = next;
        self.cooldown = self.config.cooldown_frames;
        // Re-warm the average so the next decision reflects the new scale.
        self.avg_dt = None;
        true
    }
}

impl Default for AdaptiveQuality {
    fn default() -> Self {
        Self::new(AdaptiveConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLOW: f32 = 1.0 / 20.0;
    const FAST: f32 = 1.0 / 120.0;
    const VSYNC: f32 = 1.0 / 60.0;

    #[test]
    fn sustained_slow_frames_degrade_to_min_scale() {
        let mut q = AdaptiveQuality::default();
        for _ in 0..500 {
            q.observe(SLOW);
        }
        assert!((q.scale() - 0.5).abs() < 1e-5);
        assert!(q.is_degraded());
        assert_eq!(q.event_stride(), 2);
    }

    #[test]
    fn fast_frames_recover_to_max_scale() {
        let mut q = AdaptiveQuality::default();
        for _ in 0..200 {
            q.observe(SLOW);
        }
        for _ in 0..2000 {
            q.observe(FAST);
        }
        assert!((q.scale() - 1.0).abs() < 1e-5);
        assert!(q.samples_events(7));
    }

    #[test]
    fn one_hitch_recovers_at_the_vsync_cap() {
        let mut q = AdaptiveQuality::default();
        q.observe(0.25);
        assert!(q.is_degraded());
        assert_eq!(q.event_stride(), 2);

        for _ in 0..200 {
            q.observe(VSYNC);
        }
        assert_eq!(q.scale(), 1.0);
        assert_eq!(q.event_stride(), 1);
    }

    #[test]
    fn frames_between_the_thresholds_hold_the_scale() {
        let mut q = AdaptiveQuality::default();
        q.observe(0.25);
        let degraded = q.scale();
        for _ in 0..2000 {
            q.observe(VSYNC * 1.1);
        }
        assert_eq!(q.scale(), degraded);
    }

    #[test]
    fn invalid_frame_times_are_ignored() {
        let mut q = AdaptiveQuality::default();
        assert!(!q.observe(f32::NAN));
        assert!(!q.observe(0.0));
        assert_eq!(q.scale(), 1.0);
    }
}
