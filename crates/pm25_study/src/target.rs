//! Burst-point targets and their contact bookkeeping.

use pm25_shared::Vec3;
use serde::{Deserialize, Serialize};

/// Stable handle of a target (declaration order).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub usize);

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Per-target state, derived from `touching` and `completed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetPhase {
    /// Not touched, not completed.
    Idle,
    /// Touched, still accumulating hold time.
    TouchingIncomplete,
    /// Touched after completion.
    TouchingComplete,
    /// Completed and no longer touched.
    NotTouching,
}

/// An interactive point that completes after enough continuous hold time.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    id: TargetId,
    name: String,
    position: Vec3,
    completed: bool,
    hold_time: f64,
    contact_count: u32,
}

impl Target {
    /// Creates an idle target.
    #[must_use]
    pub fn new(id: TargetId, name: impl Into<String>, position: Vec3) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            completed: false,
            hold_time: 0.0,
            contact_count: 0,
        }
    }

    /// Handle
    #[must_use]
    pub fn id(&self) -> TargetId {
        self.id
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// World position
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Completion is one-way until a reset.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Seconds of hold accumulated toward completion.
    #[must_use]
    pub fn hold_time(&self) -> f64 {
        self.hold_time
    }

    /// Open contacts.
    #[must_use]
    pub fn contact_count(&self) -> u32 {
        self.contact_count
    }

    /// At least one open contact.
    #[must_use]
    pub fn is_touching(&self) -> bool {
        self.contact_count > 0
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> TargetPhase {
        match (self.is_touching(), self.completed) {
            (true, false) => TargetPhase::TouchingIncomplete,
            (true, true) => TargetPhase::TouchingComplete,
            (false, true) => TargetPhase::NotTouching,
            (false, false) => TargetPhase::Idle,
        }
    }

    /// Registers a contact. Returns `true` when this started touching.
    pub fn contact_enter(&mut self) -> bool {
        self.contact_count = self.contact_count.saturating_add(1);
        self.contact_count == 1
    }

    /// Releases a contact (floored at zero). Returns `true` when this
    /// stopped touching.
    pub fn contact_exit(&mut self) -> bool {
        let was_touching = self.is_touching();
        self.contact_count = self.contact_count.saturating_sub(1);
        was_touching && !self.is_touching()
    }

    /// Adds hold time. Returns `true` on the call that completes the target.
    pub(crate) fn accumulate(&mut self, dt: f64, required: f64) -> bool {
        if self.completed {
            return false;
        }
        self.hold_time += dt;
        if self.hold_time + HOLD_EPSILON >= required {
            self.completed = true;
            return true;
        }
        false
    }

    /// Drops accumulated hold time unless completed.
    pub(crate) fn reset_hold(&mut self) {
        if !self.completed {
            self.hold_time = 0.0;
        }
    }

    /// Back to idle: not completed, no hold, no contacts.
    pub fn reset(&mut self) {
        self.completed = false;
        self.hold_time = 0.0;
        self.contact_count = 0;
    }
}

/// Tolerance for summed frame deltas reaching the hold threshold.
const HOLD_EPSILON: f64 = 1e-9;

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Target {
        Target::new(TargetId(0), "BurstPoint_1", Vec3::ZERO)
    }

    #[test]
    fn test_contact_count_never_negative() {
        let mut t = target();

        assert!(!t.contact_exit());
        assert_eq!(t.contact_count(), 0);
        assert!(!t.is_touching());

        let events = [true, true, false, false, false, true, false, false];
        for enter in events {
            if enter {
                t.contact_enter();
            } else {
                t.contact_exit();
            }
            assert_eq!(t.is_touching(), t.contact_count() > 0);
        }
        assert_eq!(t.contact_count(), 0);
    }

    #[test]
    fn test_edges_reported_once() {
        let mut t = target();
        assert!(t.contact_enter());
        assert!(!t.contact_enter());
        assert!(!t.contact_exit());
        assert!(t.contact_exit());
    }

    #[test]
    fn test_phases() {
        let mut t = target();
        assert_eq!(t.phase(), TargetPhase::Idle);
        t.contact_enter();
        assert_eq!(t.phase(), TargetPhase::TouchingIncomplete);
        assert!(t.accumulate(3.0, 3.0));
        assert_eq!(t.phase(), TargetPhase::TouchingComplete);
        t.contact_exit();
        assert_eq!(t.phase(), TargetPhase::NotTouching);
    }

    #[test]
    fn test_completion_is_one_way() {
        let mut t = target();
        assert!(!t.accumulate(2.0, 3.0));
        assert!(t.accumulate(1.0, 3.0));
        assert!(!t.accumulate(1.0, 3.0));

        t.reset_hold();
        assert!(t.is_completed());
        assert_eq!(t.hold_time(), 3.0);

        t.reset();
        assert!(!t.is_completed());
        assert_eq!(t.hold_time(), 0.0);
    }
}
