//! Particle storage and the render-facing instance layout.

use bytemuck::{Pod, Zeroable};
use pm25_shared::{Color, Vec3};

use crate::emitter::SourceId;

/// A single simulated PM2.5 particle.
///
/// Identity is its slot in the owning [`crate::TransportSystem`]; nothing
/// else refers to a particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// World position (m).
    pub position: Vec3,
    /// Carried launch velocity (m/s). Zero when velocity carry is off.
    pub velocity: Vec3,
    /// Simulation time at spawn (s).
    pub created_at: f32,
    /// Neighbour count from the latest density pass.
    pub density: u32,
    /// Appearance derived from `density`.
    pub color: Color,
    /// Cleared when the handle is destroyed. Dead particles never move again.
    pub alive: bool,
    /// Emission source that spawned this particle.
    pub source: SourceId,
}

impl Particle {
    /// Creates a live particle.
    #[must_use]
    pub fn spawn(source: SourceId, position: Vec3, velocity: Vec3, created_at: f32, color: Color) -> Self {
        Self {
            position,
            velocity,
            created_at,
            density: 0,
            color,
            alive: true,
            source,
        }
    }

    /// Is this particle alive?
    #[inline]
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// GPU/renderer view of this particle.
    #[must_use]
    pub fn instance(&self) -> ParticleInstance {
        ParticleInstance {
            position: self.position.to_array(),
            density: self.density as f32,
            color: [self.color.r, self.color.g, self.color.b, self.color.a],
        }
    }
}

/// Per-instance data handed to a renderer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    /// Position (xyz).
    pub position: [f32; 3],
    /// Neighbour count as float.
    pub density: f32,
    /// Colour (rgba).
    pub color: [f32; 4],
}

impl ParticleInstance {
    /// Size of an instance in bytes
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_layout() {
        assert_eq!(ParticleInstance::SIZE, 32);
        assert_eq!(ParticleInstance::SIZE % 16, 0);
    }

    #[test]
    fn test_instance_mirrors_particle() {
        let mut particle = Particle::spawn(
            SourceId(0),
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::ZERO,
            0.0,
            Color::new(0.5, 0.5, 0.5, 1.0),
        );
        particle.density = 4;

        let instance = particle.instance();
        assert_eq!(instance.position, [1.0, 2.0, 3.0]);
        assert_eq!(instance.density, 4.0);
        assert_eq!(instance.color, [0.5, 0.5, 0.5, 1.0]);
    }
}
