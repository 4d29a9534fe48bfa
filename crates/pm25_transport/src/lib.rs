//! # PM25 Transport
//!
//! Stochastic PM2.5 particle transport: particles spawned at emission sources
//! drift with the wind, spread by Gaussian diffusion and settle under gravity.
//! A periodic density pass derives a colour from each particle's local
//! neighbour count.
//!
//! ## Design Principles
//!
//! 1. **One model**: velocity carry, sub-stepping and speed scaling are config
//! 2. **Deterministic**: one seeded `ChaCha8Rng` per system
//! 3. **Never fails mid-step**: non-finite displacements are skipped per particle
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pm25_transport::{TransportSystem, TransportConfig, DensityConfig, EmissionConfig};
//!
//! let mut system = TransportSystem::new(TransportConfig::default(), DensityConfig::default(), 123);
//! let source = system.add_source(Vec3::ZERO, EmissionConfig::default());
//! system.start_emission(source)?;
//! system.step(1.0 / 60.0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod density;
pub mod emitter;
pub mod error;
pub mod integrate;
pub mod particle;
pub mod sampler;
pub mod system;

pub use config::{DensityConfig, EmissionConfig, TransportConfig};
pub use density::ColliderSphere;
pub use emitter::{EmissionSource, SourceId};
pub use error::{TransportError, TransportResult};
pub use particle::{Particle, ParticleInstance};
pub use sampler::GaussianSampler;
pub use system::{TransportStats, TransportSystem};
