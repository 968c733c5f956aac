//! Verlet integration sweep with terrain collision detection

use cinder_core::{CinderError, Vec3};
use cinder_terrain::TerrainField;

use crate::config::VerletConfig;
use crate::observer::{CollisionEvent, SimulationObserver};
use crate::pool::ParticlePool;
use crate::probe::TerrainCollisionProbe;

/// Counters for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Particles admitted from spawners
    pub spawned: usize,
    /// Particles released because their time ran out
    pub expired: usize,
    pub collisions: usize,
    pub consistency_errors: usize,
    /// Active particles after the tick
    pub active: usize,
}

impl std::ops::AddAssign for TickStats {
    /// Sums the counters; `active` takes the newer value
    fn add_assign(&mut self, other: Self) {
        self.spawned += other.spawned;
        self.expired += other.expired;
        self.collisions += other.collisions;
        self.consistency_errors += other.consistency_errors;
        self.active = other.active;
    }
}

/// Advances every active particle by one step.
///
/// Position update is the discrete Verlet form
/// `x' = x + (x - x_prev) + (f / m + g) * dt²`.
pub struct Integrator {
    particle_mass: f32,
    base_acceleration: Vec3,
    collision_error: f32,
    print_terrain_coordinates: bool,
    world_offset: Vec3,
}

impl Integrator {
    pub fn from_config(config: &VerletConfig) -> Self {
        Self {
            particle_mass: config.particle_mass,
            base_acceleration: config.base_acceleration,
            collision_error: config.collision_error,
            print_terrain_coordinates: config.print_terrain_coordinates,
            world_offset: config.world_offset,
        }
    }

    pub fn set_world_offset(&mut self, world_offset: Vec3) {
        self.world_offset = world_offset;
    }

    /// Sweep the active list back to front: release particles whose time
    /// runs out within this step, integrate the rest.
    ///
    /// A particle with `time_to_live <= dt` is released before it is
    /// decremented, so it never reaches zero while still alive.
    pub fn sweep(
        &self,
        pool: &mut ParticlePool,
        dt: f32,
        terrain: Option<&dyn TerrainField>,
        observer: &mut dyn SimulationObserver,
        stats: &mut TickStats,
    ) {
        let t_squared = dt * dt;
        let probe = terrain.map(TerrainCollisionProbe::new);

        for position in (0..pool.active_count()).rev() {
            let Some(slot) = pool.active().get(position) else {
                continue;
            };

            if !pool.is_in_use(slot) {
                let err = CinderError::Consistency { slot, position };
                log::error!("{err}");
                observer.on_consistency_error(&err);
                stats.consistency_errors += 1;
            }

            let j = slot as usize;
            if pool.time_to_live[j] <= dt {
                // A free slot fails here too; it was reported above
                if pool.release(position, slot).is_ok() {
                    stats.expired += 1;
                }
            } else {
                pool.time_to_live[j] -= dt;
                self.update_particle(pool, slot, t_squared, probe.as_ref(), observer, stats);
            }
        }
    }

    fn update_particle(
        &self,
        pool: &mut ParticlePool,
        slot: u32,
        t_squared: f32,
        probe: Option<&TerrainCollisionProbe<'_>>,
        observer: &mut dyn SimulationObserver,
        stats: &mut TickStats,
    ) {
        let j = slot as usize;

        let verlet_acceleration =
            (pool.forces[j] / self.particle_mass + self.base_acceleration) * t_squared;

        let current = pool.positions[j];
        let implicit_velocity = current - pool.prior_positions[j];
        let next = current + implicit_velocity + verlet_acceleration;

        if let Some(probe) = probe {
            if self.print_terrain_coordinates {
                observer.on_probe(slot, &probe.sample(current + self.world_offset));
            }

            let next_world = next + self.world_offset;
            let normalized = probe.world_to_normalized(next_world);
            let height = probe.height_at(normalized);
            let height_diff = next_world.y - height;

            // Detection only: the particle keeps its course
            if height_diff <= self.collision_error {
                stats.collisions += 1;
                observer.on_collision(&CollisionEvent {
                    slot,
                    world_position: next_world,
                    terrain_height: height,
                    height_diff,
                    normal: probe.normal_at(normalized),
                });
            }
        }

        pool.positions[j] = next;
        pool.prior_positions[j] = current;
    }
}
