//! Interactive cloth: a vertex-displacement material driven by a bounded ring of
//! click pulses.
//!
//! The shader (`render/shaders/cloth.wgsl`) and the CPU functions in this module
//! implement the same displacement law; the CPU side exists for hit feedback and tests.

mod buffer;
mod effect;

pub use buffer::{PulseBuffer, PulseEvent};
pub use effect::{
    ambient_wave, displacement, fade, pulse_contribution, ring_mask, ClothEffect, ClothUniforms,
};

/// Ring capacity. Also baked into `cloth.wgsl`.
pub const MAX_PULSES: usize = 10;

/// Seconds a pulse stays visible.
pub const DEFAULT_PULSE_DURATION: f32 = 2.0;

/// Peak z displacement of a single pulse.
pub const RIPPLE_AMPLITUDE: f32 = 0.3;
