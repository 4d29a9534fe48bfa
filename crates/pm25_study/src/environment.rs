//! Environment telemetry drift (wind speed, humidity, temperature).
//!
//! Values are displayed to the participant only; they do not feed the
//! transport model.

use pm25_shared::Cadence;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Baselines and drift limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Baseline wind speed (m/s).
    pub base_wind_speed: f32,
    /// Baseline relative humidity (%).
    pub base_humidity: f32,
    /// Baseline temperature (°C).
    pub base_temperature: f32,
    /// Random walk within a band around baseline; otherwise each update
    /// jumps to `base + U(-variation, variation) * base`.
    pub subtle_changes: bool,
    /// Relative jump size used when `subtle_changes` is off.
    pub variation: f32,
    /// Per-update wind step bound.
    pub wind_step: f32,
    /// Per-update humidity step bound.
    pub humidity_step: f32,
    /// Per-update temperature step bound.
    pub temperature_step: f32,
    /// Maximum wind drift from baseline.
    pub wind_band: f32,
    /// Maximum humidity drift from baseline.
    pub humidity_band: f32,
    /// Maximum temperature drift from baseline.
    pub temperature_band: f32,
    /// Seconds before the first update.
    pub delay: f32,
    /// Seconds between updates.
    pub interval: f32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            base_wind_speed: 0.2,
            base_humidity: 60.0,
            base_temperature: 25.0,
            subtle_changes: true,
            variation: 1.0,
            wind_step: 0.01,
            humidity_step: 0.1,
            temperature_step: 0.01,
            wind_band: 0.3,
            humidity_band: 0.1,
            temperature_band: 0.2,
            delay: 0.5,
            interval: 1.0,
        }
    }
}

impl EnvironmentConfig {
    /// Non-finite values fall back to their defaults; steps and bands are
    /// floored at zero so every drift band is well ordered.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.base_wind_speed = finite_or("base_wind_speed", self.base_wind_speed, defaults.base_wind_speed);
        self.base_humidity = finite_or("base_humidity", self.base_humidity, defaults.base_humidity);
        self.base_temperature =
            finite_or("base_temperature", self.base_temperature, defaults.base_temperature);
        self.variation = floored("variation", self.variation, defaults.variation);
        self.wind_step = floored("wind_step", self.wind_step, defaults.wind_step);
        self.humidity_step = floored("humidity_step", self.humidity_step, defaults.humidity_step);
        self.temperature_step =
            floored("temperature_step", self.temperature_step, defaults.temperature_step);
        self.wind_band = floored("wind_band", self.wind_band, defaults.wind_band);
        self.humidity_band = floored("humidity_band", self.humidity_band, defaults.humidity_band);
        self.temperature_band =
            floored("temperature_band", self.temperature_band, defaults.temperature_band);
        self.delay = floored("delay", self.delay, defaults.delay);
        if !(self.interval.is_finite() && self.interval > 0.0) {
            tracing::warn!("environment.interval {} clamped to {}", self.interval, defaults.interval);
            self.interval = defaults.interval;
        }
        self
    }
}

fn finite_or(name: &str, value: f32, default: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        tracing::warn!("environment.{name} {value} reset to {default}");
        default
    }
}

fn floored(name: &str, value: f32, default: f32) -> f32 {
    let value = finite_or(name, value, default);
    if value < 0.0 {
        tracing::warn!("environment.{name} {value} clamped to 0");
        0.0
    } else {
        value
    }
}

/// One set of telemetry values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentReading {
    /// Wind speed (m/s, signed).
    pub wind_speed: f32,
    /// Relative humidity (%).
    pub humidity: f32,
    /// Temperature (°C).
    pub temperature: f32,
}

/// Drifting telemetry driven by its own cadence.
#[derive(Clone, Debug)]
pub struct Environment {
    config: EnvironmentConfig,
    current: EnvironmentReading,
    cadence: Cadence,
    rng: ChaCha8Rng,
}

impl Environment {
    /// Creates telemetry at baseline.
    #[must_use]
    pub fn new(config: EnvironmentConfig, seed: u64) -> Self {
        Self {
            current: baseline(&config),
            cadence: Cadence::new(config.delay, config.interval),
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
        }
    }

    /// Current values.
    #[must_use]
    pub fn reading(&self) -> EnvironmentReading {
        self.current
    }

    /// Advances the cadence; drifts once if it fired. Returns whether it did.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.cadence.advance(dt) > 0 {
            self.drift();
            true
        } else {
            false
        }
    }

    /// Applies one drift update.
    pub fn drift(&mut self) {
        let c = &self.config;
        if c.subtle_changes {
            let wind = self.current.wind_speed + symmetric(&mut self.rng, c.wind_step);
            let humidity = self.current.humidity + symmetric(&mut self.rng, c.humidity_step);
            let temperature = self.current.temperature + symmetric(&mut self.rng, c.temperature_step);

            self.current = EnvironmentReading {
                wind_speed: wind.clamp(c.base_wind_speed - c.wind_band, c.base_wind_speed + c.wind_band),
                humidity: humidity.clamp(c.base_humidity - c.humidity_band, c.base_humidity + c.humidity_band),
                temperature: temperature
                    .clamp(c.base_temperature - c.temperature_band, c.base_temperature + c.temperature_band),
            };
        } else {
            self.current = EnvironmentReading {
                wind_speed: c.base_wind_speed + symmetric(&mut self.rng, c.variation) * c.base_wind_speed,
                humidity: c.base_humidity + symmetric(&mut self.rng, c.variation) * c.base_humidity,
                temperature: c.base_temperature
                    + symmetric(&mut self.rng, c.variation) * c.base_temperature,
            };
        }
        tracing::trace!(
            "environment: wind {:.2} humidity {:.1} temperature {:.1}",
            self.current.wind_speed,
            self.current.humidity,
            self.current.temperature
        );
    }

    /// Back to baseline; the cadence restarts.
    pub fn reset(&mut self) {
        self.current = baseline(&self.config);
        self.cadence.restart(self.config.delay);
    }
}

fn baseline(config: &EnvironmentConfig) -> EnvironmentReading {
    EnvironmentReading {
        wind_speed: config.base_wind_speed,
        humidity: config.base_humidity,
        temperature: config.base_temperature,
    }
}

/// `U(-bound, bound)`, zero for a non-positive bound.
fn symmetric(rng: &mut ChaCha8Rng, bound: f32) -> f32 {
    if bound > 0.0 {
        rng.gen_range(-bound..bound)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_baseline() {
        let env = Environment::new(EnvironmentConfig::default(), 123);
        let reading = env.reading();
        assert_eq!(reading.wind_speed, 0.2);
        assert_eq!(reading.humidity, 60.0);
        assert_eq!(reading.temperature, 25.0);
    }

    #[test]
    fn test_cadence() {
        let mut env = Environment::new(EnvironmentConfig::default(), 123);
        assert!(!env.tick(0.25));
        assert!(env.tick(0.25));
        assert!(!env.tick(0.5));
        assert!(env.tick(0.5));
    }

    #[test]
    fn test_subtle_drift_stays_in_band() {
        let config = EnvironmentConfig::default();
        let mut env = Environment::new(config.clone(), 123);

        for _ in 0..10_000 {
            env.drift();
            let r = env.reading();
            assert!((r.wind_speed - config.base_wind_speed).abs() <= config.wind_band + 1e-5);
            assert!((r.humidity - config.base_humidity).abs() <= config.humidity_band + 1e-4);
            assert!((r.temperature - config.base_temperature).abs() <= config.temperature_band + 1e-4);
        }
    }

    #[test]
    fn test_coarse_drift_around_baseline() {
        let config = EnvironmentConfig {
            subtle_changes: false,
            variation: 0.5,
            ..Default::default()
        };
        let mut env = Environment::new(config, 9);

        for _ in 0..1000 {
            env.drift();
            let r = env.reading();
            assert!((0.1..=0.3).contains(&r.wind_speed));
            assert!((30.0..=90.0).contains(&r.humidity));
        }
    }

    #[test]
    fn test_reset_restores_baseline() {
        let mut env = Environment::new(EnvironmentConfig::default(), 123);
        for _ in 0..20 {
            env.drift();
        }
        env.reset();
        assert_eq!(env.reading(), baseline(&EnvironmentConfig::default()));
    }

    #[test]
    fn test_sanitized_floors_bands() {
        let config = EnvironmentConfig {
            wind_band: -0.1,
            humidity_band: f32::NAN,
            temperature_step: -1.0,
            base_temperature: f32::INFINITY,
            interval: 0.0,
            ..Default::default()
        }
        .sanitized();

        assert_eq!(config.wind_band, 0.0);
        assert_eq!(config.humidity_band, 0.1);
        assert_eq!(config.temperature_step, 0.0);
        assert_eq!(config.base_temperature, 25.0);
        assert_eq!(config.interval, 1.0);

        let mut env = Environment::new(config.clone(), 5);
        for _ in 0..100 {
            env.drift();
        }
        assert_eq!(env.reading().wind_speed, config.base_wind_speed);
        assert_eq!(env.reading().temperature, config.base_temperature);
    }

    #[test]
    fn test_sanitized_keeps_valid_config() {
        assert_eq!(EnvironmentConfig::default().sanitized(), EnvironmentConfig::default());
    }
}
