//! The particle system: owns the pool and drives it once per fixed step

use cinder_core::{CinderError, Result, Vec3};
use cinder_runtime::RuntimeSystem;
use cinder_terrain::TerrainField;

use crate::config::VerletConfig;
use crate::force::ForceSampler;
use crate::integrator::{Integrator, TickStats};
use crate::mesh::PointMesh;
use crate::observer::{LogObserver, SimulationObserver};
use crate::pool::ParticlePool;
use crate::spawner::{CreationRequest, Spawner};

/// What a renderer reads after a tick.
///
/// `positions` is dense and indexed by slot, including free slots whose
/// entries are stale; only slots listed in `indices` are meaningful.
pub struct RenderSnapshot<'a> {
    pub positions: &'a [Vec3],
    pub indices: &'a [u32],
    /// Particles were added or removed since the previous snapshot
    pub topology_changed: bool,
}

/// A fixed-capacity Verlet particle system.
///
/// Single-threaded: the host calls [`tick`](Self::tick) once per fixed step
/// and never reentrantly. A tick always runs to completion and never fails.
pub struct VerletParticleSystem {
    config: VerletConfig,
    pool: ParticlePool,
    integrator: Integrator,
    sampler: ForceSampler,
    spawners: Vec<Box<dyn Spawner>>,
    terrain: Option<Box<dyn TerrainField>>,
    observer: Box<dyn SimulationObserver>,
    paused: bool,
    config_errors: Vec<CinderError>,
    last_tick: TickStats,
    totals: TickStats,
    ticks: u64,
}

impl VerletParticleSystem {
    /// Build a system from `config`. Invalid settings are replaced by their
    /// defaults and kept in [`config_errors`](Self::config_errors).
    pub fn new(mut config: VerletConfig) -> Self {
        let config_errors = config.sanitize();

        let pool = ParticlePool::new(config.max_particles).unwrap_or_else(|err| {
            log::warn!("VerletParticleSystem: {err}, using full capacity");
            ParticlePool::with_max_capacity()
        });
        config.max_particles = pool.capacity();

        let sampler = match config.seed {
            Some(seed) => ForceSampler::from_seed(seed),
            None => ForceSampler::from_entropy(),
        };

        Self {
            integrator: Integrator::from_config(&config),
            config,
            pool,
            sampler,
            spawners: Vec::new(),
            terrain: None,
            observer: Box::new(LogObserver),
            paused: false,
            config_errors,
            last_tick: TickStats::default(),
            totals: TickStats::default(),
            ticks: 0,
        }
    }

    pub fn with_spawner(mut self, spawner: impl Spawner + 'static) -> Self {
        self.add_spawner(Box::new(spawner));
        self
    }

    pub fn with_terrain(mut self, terrain: impl TerrainField + 'static) -> Self {
        self.set_terrain(Some(Box::new(terrain)));
        self
    }

    pub fn with_observer(mut self, observer: impl SimulationObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn add_spawner(&mut self, spawner: Box<dyn Spawner>) {
        self.spawners.push(spawner);
    }

    /// Set or clear the terrain probed for collisions
    pub fn set_terrain(&mut self, terrain: Option<Box<dyn TerrainField>>) {
        self.terrain = terrain;
    }

    /// Move the owning object; affects the world-space collision test
    pub fn set_world_offset(&mut self, world_offset: Vec3) {
        self.config.world_offset = world_offset;
        self.integrator.set_world_offset(world_offset);
    }

    /// Ask every spawner for its initial particles, in registration order,
    /// until the pool is full. Returns the number created.
    pub fn generate_initial_particles(&mut self) -> usize {
        if self.spawners.is_empty() {
            log::warn!("VerletParticleSystem: no spawners registered");
        }

        let dt = self.config.fixed_timestep;
        let mut created = 0;
        for spawner in &mut self.spawners {
            if self.pool.remaining() == 0 {
                break;
            }
            let requests = spawner.generate_initial_particles();
            created += self.pool.allocate_batch(
                &requests,
                dt,
                &self.config.force_range,
                &mut self.sampler,
            );
        }
        log::info!(
            "VerletParticleSystem: {created} initial particle(s), capacity {}",
            self.pool.capacity()
        );
        created
    }

    /// Add particles directly. Requests beyond the remaining capacity are
    /// dropped; returns how many were accepted.
    pub fn add_particles(&mut self, requests: &[CreationRequest]) -> usize {
        self.pool.allocate_batch(
            requests,
            self.config.fixed_timestep,
            &self.config.force_range,
            &mut self.sampler,
        )
    }

    /// Remove the particle in `slot`, found at active list position `position`
    pub fn remove_particle(&mut self, position: usize, slot: u32) -> Result<()> {
        self.pool.release(position, slot)
    }

    /// Advance one fixed step of `dt` seconds. Does nothing while paused.
    pub fn tick(&mut self, dt: f32) -> TickStats {
        if self.paused {
            return TickStats {
                active: self.pool.active_count(),
                ..Default::default()
            };
        }

        let mut stats = TickStats::default();

        for spawner in &mut self.spawners {
            let requests = spawner.generate_particles();
            stats.spawned += self.pool.allocate_batch(
                &requests,
                dt,
                &self.config.force_range,
                &mut self.sampler,
            );
        }

        self.integrator.sweep(
            &mut self.pool,
            dt,
            self.terrain.as_deref(),
            self.observer.as_mut(),
            &mut stats,
        );

        stats.active = self.pool.active_count();
        self.last_tick = stats;
        self.totals += stats;
        self.ticks += 1;
        stats
    }

    /// Current buffers for the renderer. Reading clears the topology flag.
    pub fn snapshot(&mut self) -> RenderSnapshot<'_> {
        let topology_changed = self.pool.active_mut().take_dirty();
        RenderSnapshot {
            positions: self.pool.positions(),
            indices: self.pool.active().as_slice(),
            topology_changed,
        }
    }

    /// Push the current snapshot into `mesh`
    pub fn publish(&mut self, mesh: &mut PointMesh) {
        let snapshot = self.snapshot();
        mesh.upload(&snapshot);
    }

    /// True if particles were added or removed since the last snapshot
    pub fn is_topology_dirty(&self) -> bool {
        self.pool.active().is_dirty()
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn config(&self) -> &VerletConfig {
        &self.config
    }

    /// Settings that were invalid and replaced at construction
    pub fn config_errors(&self) -> &[CinderError] {
        &self.config_errors
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.pool.remaining()
    }

    pub fn last_tick(&self) -> TickStats {
        self.last_tick
    }

    /// Counters summed over every tick run so far
    pub fn totals(&self) -> TickStats {
        self.totals
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl RuntimeSystem for VerletParticleSystem {
    fn initialize(&mut self) -> Result<()> {
        self.generate_initial_particles();
        Ok(())
    }

    fn fixed_update(&mut self, dt: f64) -> Result<()> {
        self.tick(dt as f32);
        Ok(())
    }

    fn update(&mut self, _dt: f64) -> Result<()> {
        // Rendering pulls snapshots; nothing to do per frame
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        log::info!(
            "VerletParticleSystem: {} tick(s), {} spawned, {} expired, {} collision(s)",
            self.ticks,
            self.totals.spawned,
            self.totals.expired,
            self.totals.collisions
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "verlet-particles"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::force::ForceRange;
    use crate::observer::CollisionEvent;
    use cinder_terrain::Terrain;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Hands out pre-scripted batches, one per call
    #[derive(Default)]
    struct ScriptedSpawner {
        initial: Vec<CreationRequest>,
        batches: VecDeque<Vec<CreationRequest>>,
    }

    impl Spawner for ScriptedSpawner {
        fn generate_initial_particles(&mut self) -> Vec<CreationRequest> {
            std::mem::take(&mut self.initial)
        }

        fn generate_particles(&mut self) -> Vec<CreationRequest> {
            self.batches.pop_front().unwrap_or_default()
        }
    }

    #[derive(Clone, Default)]
    struct SharedCollisions(Rc<RefCell<Vec<CollisionEvent>>>);

    impl SimulationObserver for SharedCollisions {
        fn on_collision(&mut self, event: &CollisionEvent) {
            self.0.borrow_mut().push(*event);
        }
    }

    fn still(x: f32, ttl: f32) -> CreationRequest {
        CreationRequest::new(Vec3::new(x, 0.0, 0.0), Vec3::ZERO, ttl)
    }

    fn config(capacity: usize, dt: f32) -> VerletConfig {
        VerletConfig {
            max_particles: capacity,
            fixed_timestep: dt,
            seed: Some(11),
            ..Default::default()
        }
    }

    fn assert_pool_consistent(system: &VerletParticleSystem) {
        let pool = system.pool();
        assert_eq!(pool.active_count() + pool.remaining(), pool.capacity());
        let mut seen = std::collections::HashSet::new();
        for &slot in pool.active().as_slice() {
            assert!(seen.insert(slot), "slot {slot} active twice");
            assert!(pool.is_in_use(slot));
        }
    }

    #[test]
    fn invalid_config_is_substituted_not_fatal() {
        let system = VerletParticleSystem::new(VerletConfig {
            max_particles: 0,
            particle_mass: -1.0,
            ..Default::default()
        });
        assert_eq!(system.config_errors().len(), 2);
        assert_eq!(system.pool().capacity(), 65_000);
        assert_eq!(system.config().particle_mass, 1.0);
    }

    #[test]
    fn unbounded_force_ranges_still_spawn() {
        let table: toml::value::Table =
            toml::from_str("max_particles = 8\nx_range_force = [nan, 1.0]\ny_range_force = [-inf, inf]")
                .unwrap();
        let mut system = VerletParticleSystem::new(VerletConfig::from_toml(&table));
        assert_eq!(system.config_errors().len(), 2);

        assert_eq!(system.add_particles(&[still(0.0, 1.0), still(1.0, 1.0)]), 2);
        let dt = system.config().fixed_timestep;
        system.tick(dt);
        assert_eq!(system.active_count(), 2);
        for &slot in system.pool().active().as_slice() {
            assert!(system.pool().position(slot).is_finite());
        }
    }

    #[test]
    fn nan_lifetime_expires_on_first_tick() {
        let mut system = VerletParticleSystem::new(config(4, 0.25));
        system.add_particles(&[still(0.0, f32::NAN), still(1.0, 1.0)]);

        let stats = system.tick(0.25);
        assert_eq!(stats.expired, 1);
        assert_eq!(system.active_count(), 1);
        assert_pool_consistent(&system);
    }

    #[test]
    fn capacity_invariant_across_ticks() {
        let spawner = ScriptedSpawner {
            batches: (0..40)
                .map(|i| (0..(i % 9)).map(|k| still(k as f32, 0.1 * (1 + k % 4) as f32)).collect())
                .collect(),
            ..Default::default()
        };
        let mut system = VerletParticleSystem::new(config(20, 0.05)).with_spawner(spawner);
        system.generate_initial_particles();

        for _ in 0..40 {
            system.tick(0.05);
            assert_pool_consistent(&system);
        }
        assert!(system.totals().spawned > 20);
        assert!(system.totals().expired > 0);
    }

    #[test]
    fn lifetime_exact_multiple_of_step() {
        // T = 1.0, dt = 0.25 -> removed on tick 4
        let mut system = VerletParticleSystem::new(config(4, 0.25));
        system.add_particles(&[still(0.0, 1.0)]);

        for _ in 0..3 {
            system.tick(0.25);
            assert_eq!(system.active_count(), 1);
        }
        let stats = system.tick(0.25);
        assert_eq!(stats.expired, 1);
        assert_eq!(system.active_count(), 0);
    }

    #[test]
    fn lifetime_rounds_up_to_whole_ticks() {
        // T = 0.6, dt = 0.25 -> ceil(2.4) = 3 ticks
        let mut system = VerletParticleSystem::new(config(4, 0.25));
        system.add_particles(&[still(0.0, 0.6)]);

        system.tick(0.25);
        system.tick(0.25);
        assert_eq!(system.active_count(), 1);
        system.tick(0.25);
        assert_eq!(system.active_count(), 0);
    }

    #[test]
    fn constant_velocity_without_forces() {
        let dt = 0.25;
        let mut system = VerletParticleSystem::new(config(4, dt));
        let start = Vec3::new(1.0, 2.0, 3.0);
        let velocity = Vec3::new(2.0, -1.0, 0.5);
        system.add_particles(&[CreationRequest::new(start, velocity, 100.0)]);

        let n = 12;
        for _ in 0..n {
            system.tick(dt);
        }
        let expected = start + velocity * (n as f32 * dt);
        let actual = system.pool().position(0);
        assert!(actual.distance(&expected) < 1e-4, "{actual} != {expected}");
    }

    #[test]
    fn batch_beyond_remaining_is_truncated_in_order() {
        let mut system = VerletParticleSystem::new(config(10, 0.1));
        system.add_particles(&(0..7).map(|i| still(i as f32, 5.0)).collect::<Vec<_>>());
        assert_eq!(system.remaining_capacity(), 3);

        let spawner = ScriptedSpawner {
            batches: VecDeque::from(vec![(100..108).map(|i| still(i as f32, 5.0)).collect()]),
            ..Default::default()
        };
        system.add_spawner(Box::new(spawner));

        let stats = system.tick(0.1);
        assert_eq!(stats.spawned, 3);
        assert_eq!(system.remaining_capacity(), 0);

        let mut xs: Vec<f32> = system
            .pool()
            .active()
            .as_slice()
            .iter()
            .map(|&s| system.pool().position(s).x)
            .filter(|&x| x >= 100.0)
            .collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(xs, vec![100.0, 101.0, 102.0]);
    }

    #[test]
    fn spawners_are_served_in_registration_order() {
        let first = ScriptedSpawner {
            batches: VecDeque::from(vec![vec![still(1.0, 5.0), still(1.0, 5.0)]]),
            ..Default::default()
        };
        let second = ScriptedSpawner {
            batches: VecDeque::from(vec![vec![still(2.0, 5.0), still(2.0, 5.0)]]),
            ..Default::default()
        };
        let mut system = VerletParticleSystem::new(config(3, 0.1))
            .with_spawner(first)
            .with_spawner(second);

        system.tick(0.1);
        let from_second = system
            .pool()
            .active()
            .as_slice()
            .iter()
            .filter(|&&s| system.pool().position(s).x == 2.0)
            .count();
        assert_eq!(system.active_count(), 3);
        assert_eq!(from_second, 1);
    }

    #[test]
    fn initial_particles_stop_at_capacity() {
        let big = ScriptedSpawner {
            initial: (0..5).map(|i| still(i as f32, 1.0)).collect(),
            ..Default::default()
        };
        let mut system = VerletParticleSystem::new(config(3, 0.1)).with_spawner(big);
        assert_eq!(system.generate_initial_particles(), 3);
        assert_eq!(system.remaining_capacity(), 0);
    }

    #[test]
    fn dirty_flag_tracks_topology_changes() {
        let mut system = VerletParticleSystem::new(config(8, 0.1));
        system.add_particles(&[still(0.0, 10.0), still(1.0, 0.25)]);
        assert!(system.snapshot().topology_changed);

        // Nothing spawned, nothing expired
        system.tick(0.1);
        assert!(!system.is_topology_dirty());
        assert!(!system.snapshot().topology_changed);

        system.tick(0.1);
        // Second particle expires on the third tick
        system.tick(0.1);
        assert!(system.is_topology_dirty());
        let snapshot = system.snapshot();
        assert!(snapshot.topology_changed);
        assert_eq!(snapshot.indices.len(), 1);
        assert!(!system.is_topology_dirty());
    }

    #[test]
    fn publish_rebuilds_mesh_indices_only_when_dirty() {
        let mut system = VerletParticleSystem::new(config(8, 0.1));
        system.add_particles(&[CreationRequest::new(Vec3::ZERO, Vec3::UP, 10.0)]);
        let mut mesh = PointMesh::new();

        system.publish(&mut mesh);
        for _ in 0..5 {
            system.tick(0.1);
            system.publish(&mut mesh);
        }
        assert_eq!(mesh.index_rebuilds(), 1);
        assert_eq!(mesh.uploads(), 6);
        assert_eq!(mesh.indices(), &[0]);
        assert!((mesh.vertices()[0].position[1] - 0.5).abs() < 1e-5);
        assert_eq!(mesh.vertices().len(), 8);
    }

    #[test]
    fn collision_on_flat_terrain_at_exact_height() {
        let collisions = SharedCollisions::default();
        let mut system = VerletParticleSystem::new(config(4, 0.1))
            .with_terrain(Terrain::flat(100.0, 100.0, 3.0, Vec3::ZERO))
            .with_observer(collisions.clone());
        system.add_particles(&[
            CreationRequest::new(Vec3::new(50.0, 3.0, 50.0), Vec3::ZERO, 10.0),
            CreationRequest::new(Vec3::new(60.0, 3.5, 50.0), Vec3::ZERO, 10.0),
        ]);

        let stats = system.tick(0.1);
        assert_eq!(stats.collisions, 1);
        let events = collisions.0.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].world_position, Vec3::new(50.0, 3.0, 50.0));
    }

    #[test]
    fn collision_tolerance_widens_detection() {
        let mut cfg = config(4, 0.1);
        cfg.collision_error = 1.0;
        let mut system = VerletParticleSystem::new(cfg)
            .with_terrain(Terrain::flat(100.0, 100.0, 3.0, Vec3::ZERO));
        system.add_particles(&[CreationRequest::new(Vec3::new(50.0, 3.5, 50.0), Vec3::ZERO, 10.0)]);
        assert_eq!(system.tick(0.1).collisions, 1);
    }

    #[test]
    fn world_offset_is_applied_to_collision_test() {
        let mut system = VerletParticleSystem::new(config(4, 0.1))
            .with_terrain(Terrain::flat(100.0, 100.0, 3.0, Vec3::ZERO));
        system.add_particles(&[CreationRequest::new(Vec3::new(50.0, 0.0, 50.0), Vec3::ZERO, 10.0)]);
        assert_eq!(system.tick(0.1).collisions, 1);

        system.set_world_offset(Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(system.tick(0.1).collisions, 0);
    }

    #[test]
    fn paused_system_does_not_mutate() {
        let spawner = ScriptedSpawner {
            batches: (0..10).map(|_| vec![still(9.0, 1.0)]).collect(),
            ..Default::default()
        };
        let mut cfg = config(8, 0.1);
        cfg.base_acceleration = Vec3::new(0.0, -9.81, 0.0);
        cfg.force_range = ForceRange {
            x: [-1.0, 1.0],
            y: [-1.0, 1.0],
            z: [-1.0, 1.0],
        };
        let mut system = VerletParticleSystem::new(cfg).with_spawner(spawner);
        system.add_particles(&[CreationRequest::new(Vec3::ZERO, Vec3::UP, 0.35)]);
        system.tick(0.1);
        system.snapshot();

        let before_active = system.pool().active().as_slice().to_vec();
        let slot = before_active[0];
        let before = (
            system.pool().position(slot),
            system.pool().prior_position(slot),
            system.pool().force(slot),
            system.pool().time_to_live(slot),
        );

        system.set_paused(true);
        for _ in 0..100 {
            let stats = system.tick(0.1);
            assert_eq!(stats.spawned + stats.expired + stats.collisions, 0);
        }

        assert_eq!(system.pool().active().as_slice(), before_active.as_slice());
        assert_eq!(system.pool().position(slot), before.0);
        assert_eq!(system.pool().prior_position(slot), before.1);
        assert_eq!(system.pool().force(slot), before.2);
        assert_eq!(system.pool().time_to_live(slot), before.3);
        assert!(!system.is_topology_dirty());

        assert!(!system.toggle_pause());
        system.tick(0.1);
        assert_ne!(system.pool().position(slot), before.0);
    }

    #[test]
    fn remove_particle_frees_slot() {
        let mut system = VerletParticleSystem::new(config(4, 0.1));
        system.add_particles(&[still(0.0, 1.0), still(1.0, 1.0)]);
        system.remove_particle(0, 0).unwrap();
        assert_eq!(system.active_count(), 1);
        assert_eq!(system.remaining_capacity(), 3);
        assert!(system.remove_particle(0, 0).is_err());
    }

    #[test]
    fn runs_as_runtime_system() {
        let spawner = ScriptedSpawner {
            initial: vec![still(0.0, 1.0); 3],
            batches: VecDeque::from(vec![vec![still(0.0, 1.0)]]),
        };
        let mut system = VerletParticleSystem::new(config(16, 0.1)).with_spawner(spawner);
        RuntimeSystem::initialize(&mut system).unwrap();
        assert_eq!(system.active_count(), 3);

        system.fixed_update(0.1).unwrap();
        assert_eq!(system.active_count(), 4);
        assert_eq!(system.ticks(), 1);
        assert_eq!(system.last_tick().spawned, 1);
        assert_eq!(system.name(), "verlet-particles");
    }
}
