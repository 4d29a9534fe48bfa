//! # Transport System
//!
//! Owns every emission source and particle and advances them once per frame:
//!
//! 1. Emission: each emitting source spawns its share of the budget
//! 2. Integration: every live particle takes its convection–diffusion–settling step
//! 3. Density: on its own cadence, neighbour counts and colours are refreshed
//!
//! Single-threaded and frame-stepped. Nothing in here knows about targets,
//! modes or the event log.

use pm25_shared::{Cadence, Vec3};

use crate::config::{DensityConfig, EmissionConfig, TransportConfig};
use crate::density::{self, ColliderSphere};
use crate::emitter::{EmissionSource, SourceId};
use crate::error::{TransportError, TransportResult};
use crate::integrate;
use crate::particle::{Particle, ParticleInstance};
use crate::sampler::GaussianSampler;

/// Statistics from the transport system
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransportStats {
    /// Particle slots in use (live + not yet compacted)
    pub slot_count: u32,
    /// Currently alive particles
    pub alive_count: u32,
    /// Particles spawned this frame
    pub spawned_this_frame: u32,
    /// Spawns dropped this frame by a `max_particles` cap
    pub dropped_this_frame: u32,
    /// Sources emitting this frame
    pub emitting_sources: u32,
    /// Density passes run since creation
    pub density_passes: u64,
}

/// The particle transport model.
#[derive(Debug)]
pub struct TransportSystem {
    config: TransportConfig,
    density: DensityConfig,
    sources: Vec<EmissionSource>,
    particles: Vec<Particle>,
    colliders: Vec<ColliderSphere>,
    instances: Vec<ParticleInstance>,
    sampler: GaussianSampler,
    density_cadence: Cadence,
    time: f32,
    stats: TransportStats,
}

impl TransportSystem {
    /// Creates an empty system. Invalid configuration is clamped.
    #[must_use]
    pub fn new(config: TransportConfig, density: DensityConfig, seed: u64) -> Self {
        let config = config.sanitized();
        let density = density.sanitized();
        Self {
            sampler: GaussianSampler::new(seed, config.clamp_sigma),
            density_cadence: Cadence::new(density.delay, density.interval),
            config,
            density,
            sources: Vec::new(),
            particles: Vec::new(),
            colliders: Vec::new(),
            instances: Vec::new(),
            time: 0.0,
            stats: TransportStats::default(),
        }
    }

    /// Registers a stopped emission source and returns its handle.
    pub fn add_source(&mut self, position: Vec3, emission: EmissionConfig) -> SourceId {
        let id = SourceId(self.sources.len());
        self.sources
            .push(EmissionSource::new(id, position, emission.sanitized()));
        id
    }

    /// Adds a static collider sphere counted by the density pass.
    pub fn add_collider(&mut self, collider: ColliderSphere) {
        self.colliders.push(collider);
    }

    /// Returns a source by handle.
    #[must_use]
    pub fn source(&self, id: SourceId) -> Option<&EmissionSource> {
        self.sources.get(id.0)
    }

    fn source_mut(&mut self, id: SourceId) -> TransportResult<&mut EmissionSource> {
        self.sources
            .get_mut(id.0)
            .ok_or(TransportError::SourceNotFound(id.0))
    }

    /// Number of registered sources.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Starts emission on a source.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::SourceNotFound`] for an unknown handle.
    pub fn start_emission(&mut self, id: SourceId) -> TransportResult<()> {
        self.source_mut(id)?.start();
        Ok(())
    }

    /// Stops emission on a source.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::SourceNotFound`] for an unknown handle.
    pub fn stop_emission(&mut self, id: SourceId) -> TransportResult<()> {
        self.source_mut(id)?.stop();
        Ok(())
    }

    /// Stops every source.
    pub fn stop_all(&mut self) {
        for source in &mut self.sources {
            source.stop();
        }
    }

    /// Whether a source is emitting (requested and budget left).
    #[must_use]
    pub fn is_emitting(&self, id: SourceId) -> bool {
        self.source(id).is_some_and(EmissionSource::is_emitting)
    }

    /// Whether any source is emitting.
    #[must_use]
    pub fn any_emitting(&self) -> bool {
        self.sources.iter().any(EmissionSource::is_emitting)
    }

    /// Destroys every particle spawned by a source and returns how many
    /// live ones were removed. Slots of other particles may shift.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::SourceNotFound`] for an unknown handle.
    pub fn clear_source(&mut self, id: SourceId) -> TransportResult<usize> {
        self.source_mut(id)?;
        let before = self.live_count_for(id);
        self.particles.retain(|p| p.source != id);
        tracing::debug!("cleared {before} particles of {id}");
        Ok(before)
    }

    /// Destroys every particle and refills every budget.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.instances.clear();
        for source in &mut self.sources {
            source.stop();
            source.reset_timer();
        }
        self.density_cadence.restart(self.density.delay);
    }

    /// Marks the particle in `slot` as destroyed.
    ///
    /// A destroyed particle is skipped by every later step and excluded from
    /// density counts. Returns `false` if the slot was already dead or does
    /// not exist.
    pub fn despawn(&mut self, slot: usize) -> bool {
        match self.particles.get_mut(slot) {
            Some(particle) if particle.alive => {
                particle.alive = false;
                true
            }
            _ => false,
        }
    }

    /// Drops dead slots. Slot numbers of survivors change.
    pub fn compact(&mut self) {
        self.particles.retain(Particle::is_alive);
    }

    /// Advances the system by `dt` seconds. Non-positive or non-finite `dt`
    /// is a no-op.
    pub fn step(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        self.time += dt;
        self.stats.spawned_this_frame = 0;
        self.stats.dropped_this_frame = 0;
        self.stats.emitting_sources = 0;

        self.emit(dt);

        for particle in &mut self.particles {
            integrate::advance(particle, &self.config, dt, &mut self.sampler);
        }

        if self.density_cadence.advance(dt) > 0 {
            density::update_densities(&mut self.particles, &self.colliders, &self.density);
            self.stats.density_passes += 1;
        }

        self.stats.slot_count = self.particles.len() as u32;
        self.stats.alive_count = self.live_count() as u32;
    }

    fn emit(&mut self, dt: f32) {
        for index in 0..self.sources.len() {
            if !self.sources[index].is_emitting() {
                continue;
            }
            self.stats.emitting_sources += 1;

            let requested = self.sources[index].tick(dt);
            let source = &self.sources[index];
            let id = source.id();
            let allowed = match source.config.max_particles {
                Some(cap) => requested.min(cap.saturating_sub(self.live_count_for(id))),
                None => requested,
            };
            if allowed < requested {
                tracing::debug!("{id} at particle cap, dropped {} spawns", requested - allowed);
                self.stats.dropped_this_frame += (requested - allowed) as u32;
            }

            let origin = source.position;
            let emission = source.config.clone();
            for _ in 0..allowed {
                let position = origin + self.sampler.inside_unit_sphere() * emission.radius;
                let velocity = Vec3::new(
                    self.sampler.uniform(-emission.burst_spread, emission.burst_spread),
                    emission.burst_force + self.sampler.uniform(0.0, 1.0),
                    self.sampler.uniform(-emission.burst_spread, emission.burst_spread),
                );
                self.particles.push(Particle::spawn(
                    id,
                    position,
                    velocity,
                    self.time,
                    self.density.low_color,
                ));
            }
            self.stats.spawned_this_frame += allowed as u32;
        }
    }

    /// All particle slots, including dead ones not yet compacted.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Live particles.
    pub fn live_particles(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.alive)
    }

    /// Number of live particles.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live_particles().count()
    }

    /// Number of live particles spawned by one source.
    #[must_use]
    pub fn live_count_for(&self, id: SourceId) -> usize {
        self.live_particles().filter(|p| p.source == id).count()
    }

    /// Rebuilds and returns the instance buffer of live particles.
    pub fn refresh_instances(&mut self) -> &[ParticleInstance] {
        self.instances.clear();
        self.instances
            .extend(self.particles.iter().filter(|p| p.alive).map(Particle::instance));
        &self.instances
    }

    /// Instance buffer as bytes for upload.
    #[must_use]
    pub fn instance_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    /// Returns current statistics
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        self.stats
    }

    /// Transport parameters in use.
    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Simulation time accumulated by [`Self::step`].
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still_system() -> TransportSystem {
        TransportSystem::new(
            TransportConfig {
                wind: Vec3::ZERO,
                diffusion_coefficient: 0.0,
                gravity_strength: 0.0,
                ..Default::default()
            },
            DensityConfig::default(),
            123,
        )
    }

    fn budget(total_budget: u32, duration: f32) -> EmissionConfig {
        EmissionConfig {
            total_budget,
            duration,
            ..Default::default()
        }
    }

    #[test]
    fn test_emission_count_per_tick() {
        let mut system = still_system();
        let source = system.add_source(Vec3::ZERO, budget(500, 2.0));

        system.step(0.1);
        assert_eq!(system.live_count(), 0);

        system.start_emission(source).unwrap();
        system.step(0.1);
        assert_eq!(system.stats().spawned_this_frame, 25);
        assert_eq!(system.stats().emitting_sources, 1);
        assert_eq!(system.live_count(), 25);
    }

    #[test]
    fn test_spawn_near_source() {
        let mut system = still_system();
        let origin = Vec3::new(1.0, 2.0, 3.0);
        let source = system.add_source(origin, budget(500, 2.0));
        system.start_emission(source).unwrap();

        system.step(0.01);
        for particle in system.live_particles() {
            // jitter radius 0.01; carry is off so nothing else moves them
            assert!(particle.position.distance_squared(origin) <= 0.01 * 0.01 + 1e-9);
            assert_eq!(particle.source, source);
        }
    }

    #[test]
    fn test_unknown_source_is_error() {
        let mut system = still_system();
        assert_eq!(
            system.start_emission(SourceId(3)),
            Err(TransportError::SourceNotFound(3))
        );
        assert!(!system.is_emitting(SourceId(3)));
    }

    #[test]
    fn test_particle_cap() {
        let mut system = still_system();
        let source = system.add_source(
            Vec3::ZERO,
            EmissionConfig {
                max_particles: Some(30),
                ..budget(500, 2.0)
            },
        );
        system.start_emission(source).unwrap();

        system.step(0.1);
        system.step(0.1);
        assert_eq!(system.live_count(), 30);
        assert_eq!(system.stats().dropped_this_frame, 20);
    }

    #[test]
    fn test_despawn_and_compact() {
        let mut system = still_system();
        let source = system.add_source(Vec3::ZERO, budget(500, 2.0));
        system.start_emission(source).unwrap();
        system.step(0.1);

        let before = system.particles()[0].position;
        assert!(system.despawn(0));
        assert!(!system.despawn(0));
        system.stop_all();
        system.step(0.1);

        assert_eq!(system.particles()[0].position, before);
        assert!(!system.particles()[0].alive);
        assert_eq!(system.live_count(), 24);

        system.compact();
        assert_eq!(system.particles().len(), 24);
    }

    #[test]
    fn test_clear_source_only_touches_its_particles() {
        let mut system = still_system();
        let a = system.add_source(Vec3::ZERO, budget(100, 1.0));
        let b = system.add_source(Vec3::new(5.0, 0.0, 0.0), budget(100, 1.0));
        system.start_emission(a).unwrap();
        system.start_emission(b).unwrap();
        system.step(0.1);

        assert_eq!(system.clear_source(a), Ok(10));
        assert_eq!(system.live_count_for(a), 0);
        assert_eq!(system.live_count_for(b), 10);
    }

    #[test]
    fn test_density_cadence() {
        let mut system = still_system();
        let source = system.add_source(Vec3::ZERO, budget(500, 2.0));
        system.start_emission(source).unwrap();

        // first pass after 0.1 s, then every 0.2 s
        system.step(0.05);
        assert_eq!(system.stats().density_passes, 0);
        system.step(0.05);
        assert_eq!(system.stats().density_passes, 1);
        system.step(0.1);
        assert_eq!(system.stats().density_passes, 1);
        system.step(0.1);
        assert_eq!(system.stats().density_passes, 2);

        // clustered inside 0.01 m: everyone sees everyone
        let crowded = system.live_particles().filter(|p| p.density > 0).count();
        assert!(crowded > 0);
    }

    #[test]
    fn test_instance_buffer() {
        let mut system = still_system();
        let source = system.add_source(Vec3::ZERO, budget(500, 2.0));
        system.start_emission(source).unwrap();
        system.step(0.1);
        system.despawn(0);

        let count = system.refresh_instances().len();
        assert_eq!(count, 24);
        assert_eq!(system.instance_bytes().len(), 24 * ParticleInstance::SIZE);
    }
}
