//! # Training Cycle
//!
//! Drives one designated target through repeated bursts without participant
//! input:
//!
//! ```text
//! Waiting(resume_at) ──> Bursting(elapsed) ──> Waiting(resume_at) ──> ... ──> Finished
//! ```
//!
//! The cycle is an explicit state machine resumed by the session tick, so
//! cancelling it (mode switch, restart, disable) leaves nothing pending.

use serde::{Deserialize, Serialize};

/// Training schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Index of the target used for training (clamped into range).
    pub target_index: usize,
    /// Seconds between the end of one burst and the start of the next.
    pub interval: f64,
    /// Seconds each burst lasts.
    pub burst_duration: f64,
    /// Number of bursts.
    pub iterations: u32,
    /// Repeat until cancelled, ignoring `iterations`.
    pub loop_forever: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            target_index: 0,
            interval: 3.0,
            burst_duration: 2.0,
            iterations: 5,
            loop_forever: false,
        }
    }
}

/// Where the cycle is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrainingPhase {
    /// Not started or cancelled.
    Inactive,
    /// Suspended until the clock reaches `resume_at`.
    Waiting {
        /// Clock value at which the next burst may start.
        resume_at: f64,
    },
    /// Emitting.
    Bursting {
        /// Seconds into the current burst.
        elapsed: f64,
    },
    /// All iterations done.
    Finished,
}

/// What happened during one [`TrainingCycle::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrainingTick {
    /// A burst started (1-based iteration number).
    pub started: Option<u32>,
    /// The training source emits during this tick.
    pub bursting: bool,
    /// The burst ended with this tick; stop emission after it.
    pub burst_ended: bool,
    /// The last iteration's wait elapsed; the cycle is over.
    pub finished: bool,
}

/// Autonomous burst schedule.
#[derive(Clone, Debug)]
pub struct TrainingCycle {
    config: TrainingConfig,
    phase: TrainingPhase,
    iteration: u32,
    clock: f64,
}

impl TrainingCycle {
    /// Creates an inactive cycle.
    #[must_use]
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            phase: TrainingPhase::Inactive,
            iteration: 0,
            clock: 0.0,
        }
    }

    /// Schedule in use.
    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> TrainingPhase {
        self.phase
    }

    /// Bursts started since the last (re)start.
    #[must_use]
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Running or waiting between bursts.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.phase, TrainingPhase::Waiting { .. } | TrainingPhase::Bursting { .. })
    }

    /// Starts from iteration zero; the first burst begins on the next tick.
    pub fn start(&mut self) {
        self.iteration = 0;
        self.phase = TrainingPhase::Waiting { resume_at: self.clock };
        tracing::info!("Training cycle started");
    }

    /// Drops any pending resumption.
    pub fn cancel(&mut self) {
        if self.is_running() {
            tracing::info!("Training cycle cancelled at iteration {}", self.iteration);
        }
        self.phase = TrainingPhase::Inactive;
    }

    fn has_more(&self) -> bool {
        self.config.loop_forever || self.iteration < self.config.iterations
    }

    /// Advances the schedule by `dt`.
    pub fn tick(&mut self, dt: f64) -> TrainingTick {
        let mut tick = TrainingTick::default();
        if !self.is_running() {
            return tick;
        }
        self.clock += dt;

        if let TrainingPhase::Waiting { resume_at } = self.phase {
            if self.clock < resume_at {
                return tick;
            }
            if !self.has_more() {
                tracing::info!("Training sequence completed after {} bursts", self.iteration);
                self.phase = TrainingPhase::Finished;
                tick.finished = true;
                return tick;
            }
            self.iteration += 1;
            tracing::info!("Training burst {} started", self.iteration);
            tick.started = Some(self.iteration);
            self.phase = TrainingPhase::Bursting { elapsed: 0.0 };
        }

        if let TrainingPhase::Bursting { elapsed } = self.phase {
            let elapsed = elapsed + dt;
            tick.bursting = true;
            if elapsed >= self.config.burst_duration {
                tick.burst_ended = true;
                self.phase = TrainingPhase::Waiting {
                    resume_at: self.clock + self.config.interval,
                };
            } else {
                self.phase = TrainingPhase::Bursting { elapsed };
            }
        }
        tick
    }
}
