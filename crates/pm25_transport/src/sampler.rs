//! Seeded random sampling for the transport model.
//!
//! Everything stochastic in a [`crate::TransportSystem`] draws from one
//! `ChaCha8Rng`, so two systems built with the same seed and driven with the
//! same `dt` sequence produce identical particle trajectories.

use pm25_shared::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Lower bound for the Box–Muller radius sample; keeps `ln(u1)` finite.
const U1_MIN: f32 = 0.0001;
/// Upper bound for the Box–Muller radius sample.
const U1_MAX: f32 = 0.9999;

/// Deterministic sampler for Gaussian diffusion and launch jitter.
#[derive(Clone, Debug)]
pub struct GaussianSampler {
    rng: ChaCha8Rng,
    clamp_sigma: f32,
}

impl GaussianSampler {
    /// Creates a sampler from a seed. Standard-normal draws are clamped to
    /// `±clamp_sigma`.
    #[must_use]
    pub fn new(seed: u64, clamp_sigma: f32) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            clamp_sigma: clamp_sigma.abs(),
        }
    }

    /// Standard-normal sample via Box–Muller, clamped to `±clamp_sigma`.
    pub fn standard_normal(&mut self) -> f32 {
        let u1: f32 = self.rng.gen_range(U1_MIN..U1_MAX);
        let u2: f32 = self.rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos();
        z.clamp(-self.clamp_sigma, self.clamp_sigma)
    }

    /// Isotropic diffusion displacement for one step: each axis is
    /// `N(0, 1) * sqrt(2 D dt)`.
    ///
    /// Exactly zero when `D` or `dt` is not positive.
    pub fn diffusion_step(&mut self, coefficient: f32, dt: f32) -> Vec3 {
        if coefficient <= 0.0 || dt <= 0.0 {
            return Vec3::ZERO;
        }
        let std_dev = (2.0 * coefficient * dt).sqrt();
        Vec3::new(
            self.standard_normal() * std_dev,
            self.standard_normal() * std_dev,
            self.standard_normal() * std_dev,
        )
    }

    /// Uniform sample in `[low, high)`; returns `low` for an empty range.
    pub fn uniform(&mut self, low: f32, high: f32) -> f32 {
        if high > low {
            self.rng.gen_range(low..high)
        } else {
            low
        }
    }

    /// Uniform point inside the unit sphere (rejection sampling).
    pub fn inside_unit_sphere(&mut self) -> Vec3 {
        loop {
            let candidate = Vec3::new(
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-1.0..1.0),
            );
            if candidate.length_squared() <= 1.0 {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diffusion_statistics() {
        let mut sampler = GaussianSampler::new(123, 3.0);
        let d: f32 = 0.15;
        let dt: f32 = 0.02;
        let expected_std = (2.0 * d * dt).sqrt();
        let bound = 3.0 * expected_std + 1e-6;

        let n = 20_000;
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        for _ in 0..n {
            let step = sampler.diffusion_step(d, dt);
            assert!(step.is_finite());
            for c in step.to_array() {
                assert!(c.abs() <= bound, "sample {c} outside clamp band");
                sum += f64::from(c);
                sum_sq += f64::from(c) * f64::from(c);
            }
        }

        let count = f64::from(n * 3);
        let mean = sum / count;
        let std = (sum_sq / count - mean * mean).sqrt();
        let expected = f64::from(expected_std);

        assert!(mean.abs() < 0.05 * expected, "mean {mean} too far from 0");
        // Clamping at 3 sigma trims ~1% of the variance
        assert!((std - expected).abs() < 0.05 * expected, "std {std} vs {expected}");
    }

    #[test]
    fn test_zero_coefficient_is_exact_zero() {
        let mut sampler = GaussianSampler::new(1, 3.0);
        assert_eq!(sampler.diffusion_step(0.0, 0.1), Vec3::ZERO);
        assert_eq!(sampler.diffusion_step(0.15, 0.0), Vec3::ZERO);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = GaussianSampler::new(123, 3.0);
        let mut b = GaussianSampler::new(123, 3.0);
        for _ in 0..100 {
            assert_eq!(a.standard_normal(), b.standard_normal());
        }
    }

    #[test]
    fn test_sphere_and_uniform_bounds() {
        let mut sampler = GaussianSampler::new(7, 3.0);
        for _ in 0..1000 {
            assert!(sampler.inside_unit_sphere().length_squared() <= 1.0);
            let u = sampler.uniform(-5.0, 5.0);
            assert!((-5.0..5.0).contains(&u));
        }
        assert_eq!(sampler.uniform(2.0, 2.0), 2.0);
    }
}
