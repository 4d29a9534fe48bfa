//! Density pass: neighbour counts and density-derived colour.
//!
//! A uniform hash grid with cell size equal to the search radius limits each
//! query to the 27 surrounding cells. Results match a brute-force scan.

use std::collections::HashMap;

use pm25_shared::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::DensityConfig;
use crate::particle::Particle;

/// A static sphere that counts as a neighbour when it overlaps the search
/// radius (scene geometry near the drilling point).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColliderSphere {
    /// Centre
    pub center: Vec3,
    /// Radius
    pub radius: f32,
}

type CellKey = (i32, i32, i32);

/// Spatial hash over particle slots.
#[derive(Debug, Default)]
pub struct DensityGrid {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl DensityGrid {
    /// Builds a grid over every live particle.
    #[must_use]
    pub fn build(particles: &[Particle], cell_size: f32) -> Self {
        let mut grid = Self {
            cell_size: cell_size.max(f32::EPSILON),
            cells: HashMap::new(),
        };
        for (slot, particle) in particles.iter().enumerate() {
            if particle.alive {
                grid.cells
                    .entry(grid.key(particle.position))
                    .or_default()
                    .push(slot);
            }
        }
        grid
    }

    fn key(&self, position: Vec3) -> CellKey {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
            (position.z / self.cell_size).floor() as i32,
        )
    }

    /// Counts live particles within `radius` of `slot`, excluding itself.
    #[must_use]
    pub fn neighbours(&self, particles: &[Particle], slot: usize, radius: f32) -> u32 {
        let Some(center) = particles.get(slot).map(|p| p.position) else {
            return 0;
        };
        let radius_sq = radius * radius;
        let (cx, cy, cz) = self.key(center);

        let mut count = 0;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    count += bucket
                        .iter()
                        .filter(|&&other| other != slot)
                        .filter(|&&other| particles[other].position.distance_squared(center) <= radius_sq)
                        .count() as u32;
                }
            }
        }
        count
    }
}

/// Colliders overlapping the sphere of `radius` around `center`.
fn overlapping_colliders(colliders: &[ColliderSphere], center: Vec3, radius: f32) -> u32 {
    colliders
        .iter()
        .filter(|c| {
            let reach = c.radius + radius;
            c.center.distance_squared(center) <= reach * reach
        })
        .count() as u32
}

/// Recomputes density and colour of every live particle.
///
/// Pure function of positions; velocities are untouched.
pub fn update_densities(particles: &mut [Particle], colliders: &[ColliderSphere], config: &DensityConfig) {
    let grid = DensityGrid::build(particles, config.radius);

    let densities: Vec<Option<u32>> = (0..particles.len())
        .map(|slot| {
            if !particles[slot].alive {
                return None;
            }
            let mut count = grid.neighbours(particles, slot, config.radius);
            if config.count_colliders {
                count += overlapping_colliders(colliders, particles[slot].position, config.radius);
            }
            Some(count)
        })
        .collect();

    for (particle, density) in particles.iter_mut().zip(densities) {
        if let Some(density) = density {
            particle.density = density;
            particle.color = config.color_for(density);
        }
    }
}
