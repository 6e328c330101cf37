use glam::Vec2;

use super::MAX_PULSES;

/// One click ripple: where it started on the cloth and when.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PulseEvent {
    /// Position in UV space, `[0, 1]²`.
    pub uv: Vec2,
    /// Seconds on the scene clock. `<= 0` marks an empty slot.
    pub start_time: f32,
}

impl PulseEvent {
    /// Empty slot; placed far outside UV space and never active.
    pub const INACTIVE: PulseEvent = PulseEvent { uv: Vec2::new(-10.0, -10.0), start_time: -10.0 };

    #[inline]
    pub fn is_active(&self) -> bool {
        self.start_time > 0.0
    }
}

/// Fixed-capacity ring of pulse events.
///
/// Emitting always succeeds in O(1): the slot under the write cursor is overwritten,
/// so once the ring is full each new pulse silently evicts the oldest one.
#[derive(Debug, Clone)]
pub struct PulseBuffer {
    slots: [PulseEvent; MAX_PULSES],
    cursor: usize,
}

impl Default for PulseBuffer {
    fn default() -> Self {
        Self { slots: [PulseEvent::INACTIVE; MAX_PULSES], cursor: 0 }
    }
}

impl PulseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a pulse at the write cursor and advances the cursor modulo capacity.
    pub fn emit(&mut self, uv: Vec2, start_time: f32) {
        self.slots[self.cursor] = PulseEvent { uv, start_time };
        self.cursor = (self.cursor + 1) % MAX_PULSES;
    }

    /// Raw slots in storage order, including inactive ones.
    pub fn slots(&self) -> &[PulseEvent; MAX_PULSES] {
        &self.slots
    }

    /// Index the next emit will write to.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|p| p.is_active()).count()
    }
}
