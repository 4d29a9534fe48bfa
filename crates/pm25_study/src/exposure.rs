//! Exposure reading ("PM2.5" on the participant's display).
//!
//! Each tick with active emission adds `k / (1 + c t)` where `t` is the
//! cumulative active-emission time, so the reading rises quickly at first and
//! flattens during long bursts. The increment is applied per tick.

use serde::{Deserialize, Serialize};

/// Exposure rates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureConfig {
    /// Reading at session start and after a reset.
    pub initial: f64,
    /// `k` while drilling in Study mode.
    pub study_rate: f64,
    /// `k` during training bursts.
    pub training_rate: f64,
    /// `c` in both modes.
    pub decay: f64,
    /// Lower bound of the passive-construction pulse.
    pub passive_min: f64,
    /// Upper bound of the passive-construction pulse.
    pub passive_max: f64,
    /// Seconds between passive-construction pulses.
    pub passive_interval: f64,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            initial: 1.0,
            study_rate: 0.01,
            training_rate: 0.028,
            decay: 0.1,
            passive_min: 0.1,
            passive_max: 1.0,
            passive_interval: 1.5,
        }
    }
}

/// `k / (1 + c t)`.
#[must_use]
pub fn increment(k: f64, c: f64, t: f64) -> f64 {
    k / (1.0 + c * t)
}

/// Cumulative exposure reading.
#[derive(Clone, Debug)]
pub struct ExposureMeter {
    config: ExposureConfig,
    value: f64,
    active_time: f64,
    passive_time: f64,
}

impl ExposureMeter {
    /// Creates a meter at the initial reading.
    #[must_use]
    pub fn new(config: ExposureConfig) -> Self {
        Self {
            value: config.initial,
            config,
            active_time: 0.0,
            passive_time: 0.0,
        }
    }

    /// Current reading.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Cumulative active-emission time.
    #[must_use]
    pub fn active_time(&self) -> f64 {
        self.active_time
    }

    /// Rates in use.
    #[must_use]
    pub fn config(&self) -> &ExposureConfig {
        &self.config
    }

    /// One tick of active emission at rate `k`.
    pub fn accumulate(&mut self, dt: f64, k: f64) {
        self.active_time += dt;
        self.value += increment(k, self.config.decay, self.active_time);
    }

    /// One tick of Study-mode emission.
    pub fn accumulate_study(&mut self, dt: f64) {
        self.accumulate(dt, self.config.study_rate);
    }

    /// One tick of a training burst.
    pub fn accumulate_training(&mut self, dt: f64) {
        self.accumulate(dt, self.config.training_rate);
    }

    /// Nothing emitted this tick: the active-emission clock restarts.
    pub fn idle(&mut self) {
        self.active_time = 0.0;
    }

    /// Passive-construction pulse: `sample / (1 + c t_passive)`, where
    /// `t_passive` grows by the frame `dt` of each pulsing tick.
    pub fn passive_pulse(&mut self, sample: f64, dt: f64) {
        self.passive_time += dt;
        self.value += increment(sample, self.config.decay, self.passive_time);
    }

    /// Back to the initial reading with both clocks cleared.
    pub fn reset(&mut self) {
        self.value = self.config.initial;
        self.active_time = 0.0;
        self.passive_time = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_decays() {
        assert_eq!(increment(0.01, 0.1, 0.0), 0.01);
        assert!((increment(0.028, 0.1, 10.0) - 0.014).abs() < 1e-12);
        assert!(increment(0.01, 0.1, 100.0) < increment(0.01, 0.1, 1.0));
    }

    #[test]
    fn test_accumulate_uses_cumulative_time() {
        let mut meter = ExposureMeter::new(ExposureConfig::default());
        meter.accumulate_study(1.0);
        meter.accumulate_study(1.0);

        let expected = 1.0 + 0.01 / 1.1 + 0.01 / 1.2;
        assert!((meter.value() - expected).abs() < 1e-12);
        assert_eq!(meter.active_time(), 2.0);

        meter.idle();
        assert_eq!(meter.active_time(), 0.0);
        assert!((meter.value() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_passive_pulse() {
        let mut meter = ExposureMeter::new(ExposureConfig::default());
        let dt = 1.0 / 60.0;
        meter.passive_pulse(0.5, dt);
        let first = 1.0 + 0.5 / (1.0 + 0.1 * dt);
        assert!((meter.value() - first).abs() < 1e-12);

        // The passive clock only advances by the pulsing frame, not the interval.
        meter.passive_pulse(0.5, dt);
        let second = first + 0.5 / (1.0 + 0.1 * 2.0 * dt);
        assert!((meter.value() - second).abs() < 1e-12);
        assert!(meter.value() > 1.0 + 0.5 / 1.15 * 2.0);
    }

    #[test]
    fn test_reset_restores_initial() {
        let mut meter = ExposureMeter::new(ExposureConfig {
            initial: 2.5,
            ..Default::default()
        });
        meter.accumulate_training(0.1);
        meter.passive_pulse(1.0, 1.5);
        meter.reset();
        assert_eq!(meter.value(), 2.5);
        assert_eq!(meter.active_time(), 0.0);
    }
}
