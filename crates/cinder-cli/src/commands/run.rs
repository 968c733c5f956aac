//! Headless simulation command

use anyhow::{Context, Result};
use cinder_core::Vec3;
use cinder_particles::{PointMesh, VerletParticleSystem};
use cinder_runtime::{GameClock, GameLoop};
use cinder_terrain::Terrain;
use serde::Serialize;

use crate::fountain::FountainSpawner;
use crate::scene::{load_scene, Scene};

pub struct RunArgs {
    pub scene: String,
    pub ticks: u64,
    pub seed: Option<u64>,
    pub format: String,
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub ticks: u64,
    pub capacity: usize,
    pub spawned: usize,
    pub expired: usize,
    pub collisions: usize,
    pub consistency_errors: usize,
    pub active: usize,
    pub remaining: usize,
    /// Times the renderer had to rebuild its index buffer
    pub index_rebuilds: u64,
    pub uploads: u64,
    /// Mean local position of the live particles
    pub centroid: Vec3,
    /// Settings that were invalid and replaced by defaults
    pub warnings: Vec<String>,
}

pub fn run(args: RunArgs) -> Result<()> {
    let scene = load_scene(&args.scene)?;
    let report = simulate(&scene, args.ticks, args.seed)?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&args.scene, &report);
    }
    Ok(())
}

/// Build the scene's system, run it for `ticks` fixed steps, and report.
/// `seed` overrides the scene's own seed; spawner `i` is seeded with `seed + i`.
pub fn simulate(scene: &Scene, ticks: u64, seed: Option<u64>) -> Result<RunReport> {
    let mut config = scene.system.clone();
    if seed.is_some() {
        config.seed = seed;
    }
    let base_seed = config.seed.unwrap_or_else(rand::random);

    let mut system = VerletParticleSystem::new(config);
    let mut warnings: Vec<String> = system.config_errors().iter().map(|e| e.to_string()).collect();

    for (i, spawner) in scene.spawners.iter().enumerate() {
        system.add_spawner(Box::new(FountainSpawner::new(
            spawner.clone(),
            base_seed.wrapping_add(i as u64),
        )));
    }

    if let Some(terrain_config) = &scene.terrain {
        let mut terrain_config = terrain_config.clone();
        warnings.extend(terrain_config.sanitize().iter().map(|e| e.to_string()));
        let terrain = Terrain::load(terrain_config, &scene.base_dir)
            .context("Failed to load terrain")?;
        system.set_terrain(Some(Box::new(terrain)));
    }

    let dt = f64::from(system.config().fixed_timestep);
    let mut game = GameLoop::new(system, GameClock::with_step(dt));
    game.initialize()?;
    let initial = game.system().active_count();

    let mut mesh = PointMesh::new();
    game.system_mut().publish(&mut mesh);
    // One frame per fixed step; the elapsed time equals the step, so each
    // frame drains exactly one step from the clock
    let step = game.clock().fixed_timestep();
    for _ in 0..ticks {
        game.advance(step);
        game.system_mut().publish(&mut mesh);
    }

    let system = game.shutdown()?;
    let totals = system.totals();
    let pool = system.pool();

    let active = pool.active().as_slice();
    let centroid = if active.is_empty() {
        Vec3::ZERO
    } else {
        let mut sum = Vec3::ZERO;
        for &slot in active {
            sum += pool.position(slot);
        }
        sum / active.len() as f32
    };

    Ok(RunReport {
        ticks: system.ticks(),
        capacity: pool.capacity(),
        spawned: initial + totals.spawned,
        expired: totals.expired,
        collisions: totals.collisions,
        consistency_errors: totals.consistency_errors,
        active: pool.active_count(),
        remaining: pool.remaining(),
        index_rebuilds: mesh.index_rebuilds(),
        uploads: mesh.uploads(),
        centroid,
        warnings,
    })
}

fn print_text(scene: &str, report: &RunReport) {
    println!("Scene: {}", scene);
    println!("  Ticks:        {}", report.ticks);
    println!(
        "  Particles:    {} active, {} free of {}",
        report.active, report.remaining, report.capacity
    );
    println!("  Spawned:      {}", report.spawned);
    println!("  Expired:      {}", report.expired);
    println!("  Collisions:   {}", report.collisions);
    if report.consistency_errors > 0 {
        println!("  Consistency errors: {}", report.consistency_errors);
    }
    println!(
        "  Mesh:         {} upload(s), {} index rebuild(s)",
        report.uploads, report.index_rebuilds
    );
    println!("  Centroid:     {}", report.centroid);

    if !report.warnings.is_empty() {
        println!("\n{} setting(s) replaced by defaults:", report.warnings.len());
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }
}
