//! Emission sources and their budget timer.

use pm25_shared::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::EmissionConfig;

/// Stable handle of an emission source (its registration index).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub usize);

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// A stationary point that spawns particles while emitting.
///
/// The budget timer counts down only while emitting. Starting an exhausted
/// source refills it; stopping never does, so a source that is stopped and
/// restarted mid-burst continues with what is left.
#[derive(Debug, Clone)]
pub struct EmissionSource {
    /// Handle
    id: SourceId,
    /// World position
    pub position: Vec3,
    /// Budget and launch parameters
    pub config: EmissionConfig,
    /// Emission requested
    emitting: bool,
    /// Seconds of emission left in the current budget
    timer: f32,
}

impl EmissionSource {
    /// Creates a stopped source with a full budget.
    #[must_use]
    pub fn new(id: SourceId, position: Vec3, config: EmissionConfig) -> Self {
        let timer = config.duration;
        Self {
            id,
            position,
            config,
            emitting: false,
            timer,
        }
    }

    /// Returns the handle
    #[must_use]
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Requests emission. Refills the budget if it ran out.
    pub fn start(&mut self) {
        if !self.emitting {
            self.emitting = true;
            if self.timer <= 0.0 {
                self.reset_timer();
            }
        }
    }

    /// Stops emission; the budget is kept.
    pub fn stop(&mut self) {
        self.emitting = false;
    }

    /// Refills the budget to one full duration.
    pub fn reset_timer(&mut self) {
        self.timer = self.config.duration;
    }

    /// Emission requested (regardless of budget).
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.emitting
    }

    /// Emission requested and budget left.
    #[must_use]
    pub fn is_emitting(&self) -> bool {
        self.emitting && self.timer > 0.0
    }

    /// Seconds of emission left.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.timer
    }

    /// Consumes `dt` of budget and returns how many particles to spawn.
    pub fn tick(&mut self, dt: f32) -> usize {
        if !self.is_emitting() || !dt.is_finite() || dt <= 0.0 {
            return 0;
        }
        let count = self.config.spawn_count(dt);
        self.timer -= dt;
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(duration: f32) -> EmissionSource {
        EmissionSource::new(
            SourceId(0),
            Vec3::ZERO,
            EmissionConfig {
                total_budget: 100,
                duration,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_stopped_source_spawns_nothing() {
        let mut source = source(1.0);
        assert!(!source.is_emitting());
        assert_eq!(source.tick(0.1), 0);
        assert_eq!(source.remaining(), 1.0);
    }

    #[test]
    fn test_budget_exhaustion() {
        let mut source = source(0.5);
        source.start();

        let mut total = 0;
        for _ in 0..10 {
            total += source.tick(0.125);
        }
        // 4 frames of ceil(200 * 0.125) = 25 before the timer runs out
        assert_eq!(total, 100);
        assert!(!source.is_emitting());
        assert!(source.is_requested());
    }

    #[test]
    fn test_restart_refills_only_when_exhausted() {
        let mut source = source(0.5);
        source.start();
        source.tick(0.25);
        source.stop();
        source.start();
        assert_eq!(source.remaining(), 0.25);

        source.tick(0.25);
        assert!(!source.is_emitting());
        source.stop();
        source.start();
        assert_eq!(source.remaining(), 0.5);
        assert!(source.is_emitting());
    }
}
