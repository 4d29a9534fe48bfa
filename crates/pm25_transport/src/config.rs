//! # Transport Configuration
//!
//! One parameterised model replaces the family of near-identical dispersion
//! variants: every knob they differed on (velocity carry, sub-stepping, speed
//! multiplier, clamping) is a field here.
//!
//! All structs deserialize from TOML with `#[serde(default)]`, so a config
//! file only has to name the values it changes.

use pm25_shared::{Color, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{TransportError, TransportResult};

/// Physical parameters of the convection–diffusion–settling step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Constant wind velocity (m/s).
    pub wind: Vec3,
    /// Diffusion coefficient `D` (m²/s).
    pub diffusion_coefficient: f32,
    /// Gravitational settling speed (m/s, applied downward).
    pub gravity_strength: f32,
    /// Whether particles carry a decaying launch velocity.
    pub carry_velocity: bool,
    /// Per-second blend factor of the launch velocity toward zero.
    pub velocity_decay: f32,
    /// Equal sub-steps per frame (>= 1).
    pub substeps: u32,
    /// Scale applied to the summed displacement.
    pub movement_multiplier: f32,
    /// Per-component displacement bound for a single (sub-)step.
    pub max_step: f32,
    /// Diffusion samples are clamped to this many standard deviations.
    pub clamp_sigma: f32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            wind: Vec3::new(0.2, 0.0, 0.0),
            diffusion_coefficient: 0.15,
            gravity_strength: 0.2,
            carry_velocity: false,
            velocity_decay: 0.5,
            substeps: 1,
            movement_multiplier: 1.0,
            max_step: 10.0,
            clamp_sigma: 3.0,
        }
    }
}

impl TransportConfig {
    /// Preset used for drilling bursts: launch velocity carried and decayed,
    /// three sub-steps per frame for dense trajectories, and a small
    /// multiplier keeping the plume near the drill bit.
    #[must_use]
    pub fn drilling_burst() -> Self {
        Self {
            carry_velocity: true,
            substeps: 3,
            movement_multiplier: 0.04,
            ..Self::default()
        }
    }

    /// Checks every parameter, returning the first problem found.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] naming the offending parameter.
    pub fn validate(&self) -> TransportResult<()> {
        if !self.wind.is_finite() {
            return Err(TransportError::NonFiniteVector("wind"));
        }
        non_negative("diffusion_coefficient", self.diffusion_coefficient)?;
        non_negative("gravity_strength", self.gravity_strength)?;
        non_negative("velocity_decay", self.velocity_decay)?;
        non_negative("movement_multiplier", self.movement_multiplier)?;
        positive("max_step", self.max_step)?;
        positive("clamp_sigma", self.clamp_sigma)?;
        if self.substeps == 0 {
            return Err(TransportError::ZeroSubsteps);
        }
        Ok(())
    }

    /// Returns a copy with every invalid parameter replaced by a usable value.
    ///
    /// Invalid configuration is clamped, never fatal.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if let Err(err) = self.validate() {
            tracing::warn!("transport config clamped: {err}");
            let defaults = Self::default();
            if !self.wind.is_finite() {
                self.wind = Vec3::ZERO;
            }
            self.diffusion_coefficient = clamp_non_negative(self.diffusion_coefficient);
            self.gravity_strength = clamp_non_negative(self.gravity_strength);
            self.velocity_decay = clamp_non_negative(self.velocity_decay);
            self.movement_multiplier = clamp_non_negative(self.movement_multiplier);
            self.max_step = or_default(self.max_step, defaults.max_step);
            self.clamp_sigma = or_default(self.clamp_sigma, defaults.clamp_sigma);
            self.substeps = self.substeps.max(1);
        }
        self
    }
}

/// Emission budget and launch parameters for one source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionConfig {
    /// Particles spread over one full emission duration.
    pub total_budget: u32,
    /// Seconds of emission a full budget lasts.
    pub duration: f32,
    /// Spawn jitter radius around the source (m).
    pub radius: f32,
    /// Base upward launch speed (m/s).
    pub burst_force: f32,
    /// Horizontal launch spread (m/s, symmetric).
    pub burst_spread: f32,
    /// Upper bound on live particles per source, if any.
    pub max_particles: Option<usize>,
}

impl Default for EmissionConfig {
    fn default() -> Self {
        Self {
            total_budget: 500,
            duration: 2.0,
            radius: 0.01,
            burst_force: 3.0,
            burst_spread: 1.5,
            max_particles: None,
        }
    }
}

impl EmissionConfig {
    /// Checks every parameter, returning the first problem found.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] naming the offending parameter.
    pub fn validate(&self) -> TransportResult<()> {
        positive("duration", self.duration)?;
        non_negative("radius", self.radius)?;
        non_negative("burst_force", self.burst_force)?;
        non_negative("burst_spread", self.burst_spread)?;
        Ok(())
    }

    /// Returns a copy with every invalid parameter replaced by a usable value.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if let Err(err) = self.validate() {
            tracing::warn!("emission config clamped: {err}");
            self.duration = or_default(self.duration, Self::default().duration);
            self.radius = clamp_non_negative(self.radius);
            self.burst_force = clamp_non_negative(self.burst_force);
            self.burst_spread = clamp_non_negative(self.burst_spread);
        }
        self
    }

    /// Particles to spawn during a frame of length `dt`.
    ///
    /// `ceil(total_budget / duration * dt)`, zero for degenerate input.
    #[must_use]
    pub fn spawn_count(&self, dt: f32) -> usize {
        if !dt.is_finite() || dt <= 0.0 || self.duration <= 0.0 {
            return 0;
        }
        let rate = self.total_budget as f32 / self.duration;
        let count = (rate * dt).ceil();
        if count.is_finite() && count > 0.0 {
            count as usize
        } else {
            0
        }
    }
}

/// Density-to-colour mapping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    /// Neighbour search radius (m).
    pub radius: f32,
    /// Neighbour count mapped to the high-density colour.
    pub max_density: u32,
    /// Contrast exponent applied to the normalised density.
    pub color_power: f32,
    /// Appearance of an isolated particle.
    pub low_color: Color,
    /// Appearance at or above `max_density` neighbours.
    pub high_color: Color,
    /// Seconds before the first density pass.
    pub delay: f32,
    /// Seconds between density passes.
    pub interval: f32,
    /// Whether static collider spheres count as neighbours.
    pub count_colliders: bool,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            radius: 0.05,
            max_density: 15,
            color_power: 0.7,
            low_color: Color::new(1.0, 1.0, 1.0, 0.2),
            high_color: Color::new(0.0, 0.0, 0.0, 0.9),
            delay: 0.1,
            interval: 0.2,
            count_colliders: true,
        }
    }
}

impl DensityConfig {
    /// Returns a copy with every invalid parameter replaced by a usable value.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.radius.is_finite() && self.radius > 0.0) {
            tracing::warn!("density radius {} clamped to {}", self.radius, defaults.radius);
            self.radius = defaults.radius;
        }
        if self.max_density == 0 {
            tracing::warn!("max_density 0 clamped to 1");
            self.max_density = 1;
        }
        self.color_power = or_default(self.color_power, defaults.color_power);
        self.delay = clamp_non_negative(self.delay);
        self.interval = or_default(self.interval, defaults.interval);
        self
    }

    /// Maps a neighbour count to a colour.
    #[must_use]
    pub fn color_for(&self, density: u32) -> Color {
        let t = (density as f32 / self.max_density.max(1) as f32).clamp(0.0, 1.0);
        let t = t.powf(self.color_power);
        self.low_color.lerp(self.high_color, t)
    }
}

fn non_negative(name: &'static str, value: f32) -> TransportResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TransportError::NegativeParameter { name, value })
    }
}

fn positive(name: &'static str, value: f32) -> TransportResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TransportError::NonPositiveParameter { name, value })
    }
}

fn clamp_non_negative(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

fn or_default(value: f32, default: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(TransportConfig::default().validate().is_ok());
        assert!(TransportConfig::drilling_burst().validate().is_ok());
        assert!(EmissionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_reports_parameter() {
        let config = TransportConfig {
            diffusion_coefficient: -1.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(TransportError::NegativeParameter {
                name: "diffusion_coefficient",
                value: -1.0
            })
        );

        let config = TransportConfig {
            substeps: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(TransportError::ZeroSubsteps));
    }

    #[test]
    fn test_sanitize_clamps_instead_of_failing() {
        let config = TransportConfig {
            wind: Vec3::new(f32::NAN, 0.0, 0.0),
            diffusion_coefficient: -0.5,
            substeps: 0,
            max_step: 0.0,
            ..Default::default()
        }
        .sanitized();

        assert!(config.validate().is_ok());
        assert_eq!(config.wind, Vec3::ZERO);
        assert_eq!(config.diffusion_coefficient, 0.0);
        assert_eq!(config.substeps, 1);
        assert_eq!(config.max_step, 10.0);
    }

    #[test]
    fn test_spawn_count_distributes_budget() {
        let emission = EmissionConfig {
            total_budget: 500,
            duration: 2.0,
            ..Default::default()
        };
        // 250 particles/s * 0.1 s = 25
        assert_eq!(emission.spawn_count(0.1), 25);
        // ceil(250 * 0.001) = ceil(0.25) = 1
        assert_eq!(emission.spawn_count(0.001), 1);
        assert_eq!(emission.spawn_count(0.0), 0);
        assert_eq!(emission.spawn_count(f32::NAN), 0);
    }

    #[test]
    fn test_color_mapping_endpoints() {
        let density = DensityConfig::default();
        assert_eq!(density.color_for(0), density.low_color);
        assert_eq!(density.color_for(15), density.high_color);
        assert_eq!(density.color_for(100), density.high_color);

        // power < 1 pushes mid densities toward the high colour
        let mid = density.color_for(7);
        let linear = density.low_color.lerp(density.high_color, 7.0 / 15.0);
        assert!(mid.a > linear.a);
    }
}
