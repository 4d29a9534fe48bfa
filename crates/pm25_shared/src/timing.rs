//! Fixed-rate cadences driven by the simulation clock.
//!
//! A [`Cadence`] fires after an initial delay and then once per interval.
//! It is advanced with the same `dt` as the rest of the tick so low-frequency
//! passes (density recompute, environment drift) stay deterministic and never
//! run concurrently with the physics step.

/// Repeating timer advanced by simulation time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cadence {
    /// Seconds between firings.
    interval: f32,
    /// Seconds until the next firing.
    remaining: f32,
}

impl Cadence {
    /// Creates a cadence that first fires after `delay`, then every `interval`.
    ///
    /// Non-positive intervals are raised to one millisecond.
    #[must_use]
    pub fn new(delay: f32, interval: f32) -> Self {
        Self {
            interval: interval.max(0.001),
            remaining: delay.max(0.0),
        }
    }

    /// Returns the interval in seconds.
    #[inline]
    #[must_use]
    pub const fn interval(&self) -> f32 {
        self.interval
    }

    /// Advances by `dt` and returns how many times the cadence fired.
    ///
    /// A long frame can cover several intervals; callers that only care about
    /// the latest state can treat any non-zero result as a single firing.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }

        self.remaining -= dt;
        let mut fired = 0;
        while self.remaining <= 0.0 {
            fired += 1;
            self.remaining += self.interval;
        }
        fired
    }

    /// Restarts the cadence with a fresh initial delay.
    pub fn restart(&mut self, delay: f32) {
        self.remaining = delay.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_then_interval() {
        let mut cadence = Cadence::new(0.5, 1.0);

        assert_eq!(cadence.advance(0.25), 0);
        assert_eq!(cadence.advance(0.25), 1); // t = 0.5
        assert_eq!(cadence.advance(0.5), 0); // t = 1.0
        assert_eq!(cadence.advance(0.5), 1); // t = 1.5
    }

    #[test]
    fn test_long_frame_fires_multiple() {
        let mut cadence = Cadence::new(0.0, 0.25);
        // Fires at t = 0, 0.25, 0.5, 0.75 and 1.0
        assert_eq!(cadence.advance(1.0), 5);
    }

    #[test]
    fn test_invalid_dt_is_ignored() {
        let mut cadence = Cadence::new(0.1, 0.1);
        assert_eq!(cadence.advance(-1.0), 0);
        assert_eq!(cadence.advance(f32::NAN), 0);
        assert_eq!(cadence.advance(0.1), 1);
    }
}
