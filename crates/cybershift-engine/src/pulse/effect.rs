use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::paint::Color;

use super::{PulseBuffer, PulseEvent, DEFAULT_PULSE_DURATION, MAX_PULSES, RIPPLE_AMPLITUDE};

/// GPU mirror of the cloth state. Must match `Cloth` in `cloth.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ClothUniforms {
    pub time: f32,
    pub duration: f32,
    pub amplitude: f32,
    pub _pad0: f32,
    /// Plane width/height in local units (for finite-difference normals).
    pub size: [f32; 2],
    pub _pad1: [f32; 2],
    pub color: [f32; 4],
    /// xy = uv, z = start time, w unused.
    pub pulses: [[f32; 4]; MAX_PULSES],
}

/// Pulse-driven cloth material state.
///
/// Input handlers call [`emit_pulse`](Self::emit_pulse), which only touches the ring
/// buffer. Once per frame [`advance`](Self::advance) copies the ring and the clock into
/// [`uniforms`](Self::uniforms); nothing else writes them.
#[derive(Debug, Clone)]
pub struct ClothEffect {
    pulses: PulseBuffer,
    uniforms: ClothUniforms,
}

impl ClothEffect {
    pub fn new(color: Color, plane_size: (f32, f32)) -> Self {
        let mut uniforms = ClothUniforms::zeroed();
        uniforms.duration = DEFAULT_PULSE_DURATION;
        uniforms.amplitude = RIPPLE_AMPLITUDE;
        uniforms.size = [plane_size.0, plane_size.1];
        uniforms.color = color.to_array();

        let mut effect = Self { pulses: PulseBuffer::new(), uniforms };
        effect.sync_pulses();
        effect
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        if duration.is_finite() && duration > 0.0 {
            self.uniforms.duration = duration;
        }
        self
    }

    /// Records a ripple starting at `uv` at scene time `time`. Never fails.
    ///
    /// UVs are clamped into `[0, 1]²`; non-finite input is dropped.
    pub fn emit_pulse(&mut self, uv: Vec2, time: f32) {
        if !uv.is_finite() || !time.is_finite() {
            return;
        }
        self.pulses.emit(uv.clamp(Vec2::ZERO, Vec2::ONE), time);
    }

    /// Per-frame sync of the ring buffer and clock into the uniform block.
    pub fn advance(&mut self, time: f32) {
        if time.is_finite() {
            self.uniforms.time = time;
        }
        self.sync_pulses();
    }

    fn sync_pulses(&mut self) {
        for (dst, p) in self.uniforms.pulses.iter_mut().zip(self.pulses.slots()) {
            *dst = [p.uv.x, p.uv.y, p.start_time, 0.0];
        }
    }

    pub fn uniforms(&self) -> &ClothUniforms {
        &self.uniforms
    }

    pub fn pulses(&self) -> &PulseBuffer {
        &self.pulses
    }

    pub fn duration(&self) -> f32 {
        self.uniforms.duration
    }

    /// CPU evaluation of the vertex displacement at `uv` using the synced uniforms.
    pub fn displacement_at(&self, uv: Vec2) -> f32 {
        let u = &self.uniforms;
        let pulses = u.pulses.map(|p| PulseEvent { uv: Vec2::new(p[0], p[1]), start_time: p[2] });
        displacement(uv, u.time, &pulses, u.duration)
    }
}

// ── reference math (mirrors cloth.wgsl) ───────────────────────────────────

/// Remaining strength of a pulse `age` seconds old: 1 at birth, 0 at `duration`.
#[inline]
pub fn fade(age: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 0.0;
    }
    (1.0 - age / duration).clamp(0.0, 1.0)
}

/// Hermite smoothstep with `edge0 < edge1`.
#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Ring envelope: 1 on the expanding front (radius `age * 0.5`), 0 at 0.5 UV away.
#[inline]
pub fn ring_mask(dist: f32, age: f32) -> f32 {
    1.0 - smoothstep(0.0, 0.5, (dist - age * 0.5).abs())
}

/// Contribution of one pulse at `uv`; zero outside its lifetime.
pub fn pulse_contribution(uv: Vec2, pulse: &PulseEvent, now: f32, duration: f32) -> f32 {
    let age = now - pulse.start_time;
    if !pulse.is_active() || age <= 0.0 || age >= duration {
        return 0.0;
    }
    let dist = uv.distance(pulse.uv);
    let ripple = (dist * 20.0 - age * 10.0).sin();
    ripple * fade(age, duration) * ring_mask(dist, age) * RIPPLE_AMPLITUDE
}

/// Ambient wave that runs with or without pulses.
#[inline]
pub fn ambient_wave(uv: Vec2, time: f32) -> f32 {
    (uv.x * 10.0 + time * 1.5).sin() * 0.1 + (uv.y * 8.0 + time * 1.8).cos() * 0.1
}

/// Total z displacement: ambient wave plus every live pulse.
pub fn displacement(uv: Vec2, now: f32, pulses: &[PulseEvent], duration: f32) -> f32 {
    ambient_wave(uv, now) + pulses.iter().map(|p| pulse_contribution(uv, p, now, duration)).sum::<f32>()
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: f32 = DEFAULT_PULSE_DURATION;

    fn cloth() -> ClothEffect {
        ClothEffect::new(Color::hex(0x39ff14), (14.0, 10.0))
    }

    // ── fade law ──────────────────────────────────────────────────────────

    #[test]
    fn fade_is_one_half_zero() {
        assert_eq!(fade(0.0, D), 1.0);
        assert_eq!(fade(D / 2.0, D), 0.5);
        assert_eq!(fade(D, D), 0.0);
    }

    // ── lifetime window ───────────────────────────────────────────────────

    #[test]
    fn pulse_contributes_only_inside_lifetime() {
        let t = 3.0;
        let p = PulseEvent { uv: Vec2::splat(0.5), start_time: t };
        // Just outside the ring front at age 0.5, where both mask and ripple are non-zero.
        let uv = Vec2::new(0.8, 0.5);

        assert_eq!(pulse_contribution(uv, &p, t, D), 0.0);
        assert_eq!(pulse_contribution(uv, &p, t - 0.1, D), 0.0);
        assert_eq!(pulse_contribution(uv, &p, t + D, D), 0.0);
        assert_eq!(pulse_contribution(uv, &p, t + D + 1.0, D), 0.0);
        assert!(pulse_contribution(uv, &p, t + 0.5, D).abs() > 1e-3);
    }

    #[test]
    fn inactive_slot_never_contributes() {
        let p = PulseEvent { uv: Vec2::splat(0.5), start_time: 0.0 };
        assert_eq!(pulse_contribution(Vec2::splat(0.5), &p, 0.5, D), 0.0);
    }

    #[test]
    fn ring_mask_peaks_on_front() {
        assert_eq!(ring_mask(0.25, 0.5), 1.0);
        assert_eq!(ring_mask(0.75 + 0.01, 0.5), 0.0);
    }

    // ── bounds ────────────────────────────────────────────────────────────

    #[test]
    fn displacement_is_bounded_with_full_ring() {
        let mut c = cloth();
        for i in 0..MAX_PULSES {
            c.emit_pulse(Vec2::splat(0.5), 1.0 + i as f32 * 0.01);
        }
        c.advance(1.3);
        let bound = 0.2 + RIPPLE_AMPLITUDE * MAX_PULSES as f32;
        for iy in 0..=20 {
            for ix in 0..=20 {
                let d = c.displacement_at(Vec2::new(ix as f32 / 20.0, iy as f32 / 20.0));
                assert!(d.is_finite() && d.abs() <= bound);
            }
        }
    }

    // ── single writer ─────────────────────────────────────────────────────

    #[test]
    fn emit_does_not_touch_uniforms_until_advance() {
        let mut c = cloth();
        let before = *c.uniforms();
        c.emit_pulse(Vec2::new(0.2, 0.8), 1.5);
        assert_eq!(*c.uniforms(), before);

        c.advance(1.6);
        assert_eq!(c.uniforms().pulses[0], [0.2, 0.8, 1.5, 0.0]);
        assert_eq!(c.uniforms().time, 1.6);
    }

    #[test]
    fn custom_duration_shortens_every_ripple() {
        let mut c = cloth().with_duration(1.0);
        assert_eq!(c.duration(), 1.0);
        c.emit_pulse(Vec2::splat(0.5), 1.0);
        c.advance(2.5);
        let uv = Vec2::new(0.3, 0.7);
        assert!((c.displacement_at(uv) - ambient_wave(uv, 2.5)).abs() < 1e-6);

        assert_eq!(cloth().with_duration(-1.0).duration(), cloth().duration());
    }

    #[test]
    fn emitted_uv_is_clamped() {
        let mut c = cloth();
        c.emit_pulse(Vec2::new(1.5, -0.5), 1.0);
        assert_eq!(c.pulses().slots()[0].uv, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn no_pulses_leaves_only_the_ambient_wave() {
        let mut c = cloth();
        c.advance(2.0);
        let uv = Vec2::new(0.3, 0.7);
        assert!((c.displacement_at(uv) - ambient_wave(uv, 2.0)).abs() < 1e-6);
    }
}
