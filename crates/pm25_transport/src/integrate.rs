//! Convection–diffusion–settling step for a single particle.
//!
//! ```text
//! delta = (velocity + wind) * dt        velocity term only when carried
//!       + N(0, sqrt(2 D dt)) per axis
//!       + down * gravity * dt
//! delta *= movement_multiplier
//! ```

use pm25_shared::Vec3;

use crate::config::TransportConfig;
use crate::particle::Particle;
use crate::sampler::GaussianSampler;

/// Displacement of one (sub-)step before clamping.
pub fn displacement(
    config: &TransportConfig,
    velocity: Vec3,
    dt: f32,
    sampler: &mut GaussianSampler,
) -> Vec3 {
    let mut convection = config.wind * dt;
    if config.carry_velocity {
        convection += velocity * dt;
    }
    let diffusion = sampler.diffusion_step(config.diffusion_coefficient, dt);
    let settling = Vec3::DOWN * (config.gravity_strength * dt);

    (convection + diffusion + settling) * config.movement_multiplier
}

/// Advances one live particle by `dt`, split into `config.substeps` equal
/// sub-steps.
///
/// A sub-step whose displacement is not finite leaves the particle where it
/// is. Finite displacements are clamped per component to `±max_step`.
pub fn advance(particle: &mut Particle, config: &TransportConfig, dt: f32, sampler: &mut GaussianSampler) {
    if !particle.alive || !dt.is_finite() || dt <= 0.0 {
        return;
    }

    let substeps = config.substeps.max(1);
    let sub_dt = dt / substeps as f32;

    for _ in 0..substeps {
        let delta = displacement(config, particle.velocity, sub_dt, sampler);
        if delta.is_finite() {
            particle.position += delta.clamp_components(config.max_step);
        }

        if config.carry_velocity {
            particle.velocity = particle
                .velocity
                .lerp(Vec3::ZERO, config.velocity_decay * sub_dt);
            if !particle.velocity.is_finite() {
                particle.velocity = Vec3::ZERO;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::SourceId;
    use pm25_shared::Color;

    fn still_air() -> TransportConfig {
        TransportConfig {
            wind: Vec3::ZERO,
            diffusion_coefficient: 0.0,
            ..Default::default()
        }
    }

    fn particle_at_origin() -> Particle {
        Particle::spawn(SourceId(0), Vec3::ZERO, Vec3::ZERO, 0.0, Color::WHITE)
    }

    #[test]
    fn test_pure_gravity_settling() {
        let config = still_air();
        let mut sampler = GaussianSampler::new(123, 3.0);
        let mut particle = particle_at_origin();

        let dt = 0.1;
        advance(&mut particle, &config, dt, &mut sampler);

        assert_eq!(particle.position.x, 0.0);
        assert_eq!(particle.position.z, 0.0);
        assert_eq!(particle.position.y, -(config.gravity_strength * dt));
    }

    #[test]
    fn test_wind_convection() {
        let config = TransportConfig {
            wind: Vec3::new(0.5, 0.0, 0.0),
            diffusion_coefficient: 0.0,
            gravity_strength: 0.0,
            ..Default::default()
        };
        let mut sampler = GaussianSampler::new(123, 3.0);
        let mut particle = particle_at_origin();

        advance(&mut particle, &config, 0.5, &mut sampler);
        assert_eq!(particle.position, Vec3::new(0.25, 0.0, 0.0));
    }

    #[test]
    fn test_nonpositive_dt_is_noop() {
        let config = TransportConfig::default();
        let mut sampler = GaussianSampler::new(123, 3.0);
        let mut particle = particle_at_origin();

        advance(&mut particle, &config, 0.0, &mut sampler);
        advance(&mut particle, &config, -1.0, &mut sampler);
        advance(&mut particle, &config, f32::NAN, &mut sampler);
        assert_eq!(particle.position, Vec3::ZERO);
    }

    #[test]
    fn test_nonfinite_step_leaves_particle_in_place() {
        let config = TransportConfig {
            carry_velocity: true,
            ..still_air()
        };
        let mut sampler = GaussianSampler::new(123, 3.0);
        let mut particle = particle_at_origin();
        particle.velocity = Vec3::new(f32::INFINITY, 0.0, 0.0);

        advance(&mut particle, &config, 0.1, &mut sampler);

        assert_eq!(particle.position, Vec3::ZERO);
        // lerp of an infinite velocity is NaN and gets zeroed
        assert_eq!(particle.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_step_is_clamped() {
        let config = TransportConfig {
            carry_velocity: true,
            max_step: 10.0,
            ..still_air()
        };
        let mut sampler = GaussianSampler::new(123, 3.0);
        let mut particle = particle_at_origin();
        particle.velocity = Vec3::new(1000.0, 0.0, 0.0);

        advance(&mut particle, &config, 0.1, &mut sampler);
        assert_eq!(particle.position.x, 10.0);
    }

    #[test]
    fn test_velocity_decays_toward_zero() {
        let config = TransportConfig {
            carry_velocity: true,
            substeps: 3,
            ..still_air()
        };
        let mut sampler = GaussianSampler::new(123, 3.0);
        let mut particle = particle_at_origin();
        particle.velocity = Vec3::new(0.0, 10.0, 0.0);

        advance(&mut particle, &config, 0.1, &mut sampler);

        assert!(particle.velocity.y < 10.0);
        assert!(particle.velocity.y > 9.0);
        assert!(particle.position.y > 0.0);
    }

    #[test]
    fn test_dead_particle_never_moves() {
        let config = TransportConfig::default();
        let mut sampler = GaussianSampler::new(123, 3.0);
        let mut particle = particle_at_origin();
        particle.alive = false;

        advance(&mut particle, &config, 0.1, &mut sampler);
        assert_eq!(particle.position, Vec3::ZERO);
    }
}
