//! Cancellable timer slots
//!
//! The controller never sleeps. It arms a slot and emits a token; whoever
//! runs the clock hands the token back when the delay elapses. Re-arming or
//! cancelling bumps the slot generation, so a late token from an earlier
//! arm is rejected on arrival. At most one timer per kind is ever live.

use serde::{Deserialize, Serialize};

/// The four timers a quiz session uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// Steady-state recompute, restarted on every sample
    Debounce,
    /// Lockout after a reactive change
    Cooldown,
    /// Clears the up/down indicator
    DirectionClear,
    /// Answer feedback finished, request the next question
    AnswerFeedback,
}

/// Handle for one arming of one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerToken {
    pub kind: TimerKind,
    pub generation: u64,
}

#[derive(Debug, Clone)]
struct TimerSlot {
    generation: u64,
    armed: bool,
}

impl TimerSlot {
    fn new() -> Self {
        Self { generation: 0, armed: false }
    }
}

/// One slot per [`TimerKind`]
#[derive(Debug, Clone)]
pub struct TimerSet {
    slots: [TimerSlot; 4],
}

impl Default for TimerSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerSet {
    pub fn new() -> Self {
        Self {
            slots: [TimerSlot::new(), TimerSlot::new(), TimerSlot::new(), TimerSlot::new()],
        }
    }

    fn slot_mut(&mut self, kind: TimerKind) -> &mut TimerSlot {
        &mut self.slots[kind as usize]
    }

    fn slot(&self, kind: TimerKind) -> &TimerSlot {
        &self.slots[kind as usize]
    }

    /// Arm (or re-arm) a slot, invalidating any earlier token
    pub fn arm(&mut self, kind: TimerKind) -> TimerToken {
        let slot = self.slot_mut(kind);
        slot.generation += 1;
        slot.armed = true;
        TimerToken { kind, generation: slot.generation }
    }

    /// Disarm a slot; returns whether it was live
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        let slot = self.slot_mut(kind);
        let was_armed = slot.armed;
        slot.generation += 1;
        slot.armed = false;
        was_armed
    }

    pub fn cancel_all(&mut self) {
        for kind in [
            TimerKind::Debounce,
            TimerKind::Cooldown,
            TimerKind::DirectionClear,
            TimerKind::AnswerFeedback,
        ] {
            self.cancel(kind);
        }
    }

    /// Consume a fired token; true only for the live arming of its slot
    pub fn fire(&mut self, token: TimerToken) -> bool {
        let slot = self.slot_mut(token.kind);
        if slot.armed && slot.generation == token.generation {
            slot.armed = false;
            true
        } else {
            false
        }
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.slot(kind).armed
    }
}
