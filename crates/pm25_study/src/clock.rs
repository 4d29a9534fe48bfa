//! Injected frame clock.

use std::time::Instant;

/// Longest frame a [`WallClock`] reports; larger gaps (debugger, window
/// drag) are clamped.
pub const MAX_FRAME_DELTA: f64 = 0.1;

/// Yields the `dt` of each tick.
pub trait TimeSource {
    /// Seconds since the previous call.
    fn next_dt(&mut self) -> f64;
}

/// Constant step, for tests and deterministic headless runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedStep {
    dt: f64,
}

impl FixedStep {
    /// Creates a clock advancing by `dt` per tick.
    #[must_use]
    pub fn new(dt: f64) -> Self {
        Self { dt }
    }

    /// Creates a clock running at `hz` ticks per second.
    #[must_use]
    pub fn from_rate(hz: u32) -> Self {
        Self::new(1.0 / f64::from(hz.max(1)))
    }

    /// The step.
    #[must_use]
    pub fn dt(&self) -> f64 {
        self.dt
    }
}

impl TimeSource for FixedStep {
    fn next_dt(&mut self) -> f64 {
        self.dt
    }
}

/// Real time between calls, clamped to [`MAX_FRAME_DELTA`].
#[derive(Clone, Copy, Debug)]
pub struct WallClock {
    last: Instant,
}

impl WallClock {
    /// Starts measuring now.
    #[must_use]
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for WallClock {
    fn next_dt(&mut self) -> f64 {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f64().min(MAX_FRAME_DELTA);
        self.last = now;
        dt
    }
}
