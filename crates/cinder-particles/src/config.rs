//! Simulation configuration (parsed from TOML) and startup validation

use cinder_core::{CinderError, Vec3};

use crate::force::ForceRange;
use crate::pool::MAX_PARTICLES;

pub const DEFAULT_PARTICLE_MASS: f32 = 1.0;
pub const DEFAULT_COLLISION_ERROR: f32 = 0.0;
pub const DEFAULT_FIXED_TIMESTEP: f32 = 1.0 / 60.0;

/// Configuration for a Verlet particle system
#[derive(Debug, Clone, PartialEq)]
pub struct VerletConfig {
    /// Pool capacity, 1..=65000
    pub max_particles: usize,
    pub particle_mass: f32,
    /// Applied to every particle on top of its own force
    pub base_acceleration: Vec3,
    /// Intervals each new particle's constant force is drawn from
    pub force_range: ForceRange,
    /// A next position this far above the terrain (or less) counts as a collision
    pub collision_error: f32,
    /// Dump terrain probe details for every particle, every tick
    pub print_terrain_coordinates: bool,
    /// Step used to derive the prior position of particles created outside a tick
    pub fixed_timestep: f32,
    /// World position of the owning object; particle positions are local to it
    pub world_offset: Vec3,
    /// Seed for force sampling. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for VerletConfig {
    fn default() -> Self {
        Self {
            max_particles: MAX_PARTICLES,
            particle_mass: DEFAULT_PARTICLE_MASS,
            base_acceleration: Vec3::ZERO,
            force_range: ForceRange::default(),
            collision_error: DEFAULT_COLLISION_ERROR,
            print_terrain_coordinates: false,
            fixed_timestep: DEFAULT_FIXED_TIMESTEP,
            world_offset: Vec3::ZERO,
            seed: None,
        }
    }
}

impl VerletConfig {
    /// Parse a VerletConfig from a TOML table. Missing keys keep their defaults;
    /// values are not validated here, see [`sanitize`](Self::sanitize).
    pub fn from_toml(table: &toml::value::Table) -> Self {
        let mut config = Self::default();

        if let Some(v) = table.get("max_particles") {
            config.max_particles = toml_count(v);
        }
        if let Some(v) = table.get("particle_mass") {
            config.particle_mass = toml_f32(v, config.particle_mass);
        }
        if let Some(v) = table.get("base_acceleration") {
            config.base_acceleration = toml_vec3(v, config.base_acceleration);
        }
        if let Some(v) = table.get("x_range_force") {
            config.force_range.x = toml_vec2(v, config.force_range.x);
        }
        if let Some(v) = table.get("y_range_force") {
            config.force_range.y = toml_vec2(v, config.force_range.y);
        }
        if let Some(v) = table.get("z_range_force") {
            config.force_range.z = toml_vec2(v, config.force_range.z);
        }
        if let Some(v) = table.get("collision_error") {
            config.collision_error = toml_f32(v, config.collision_error);
        }
        if let Some(v) = table.get("print_terrain_coordinates") {
            config.print_terrain_coordinates = v.as_bool().unwrap_or(false);
        }
        if let Some(v) = table.get("fixed_timestep") {
            config.fixed_timestep = toml_f32(v, config.fixed_timestep);
        }
        if let Some(v) = table.get("world_offset") {
            config.world_offset = toml_vec3(v, config.world_offset);
        }
        if let Some(v) = table.get("seed") {
            config.seed = v.as_integer().map(|n| n as u64);
        }

        config
    }

    /// Replace invalid values with their defaults, logging a warning for each.
    /// Returns the substitutions made; never fails.
    pub fn sanitize(&mut self) -> Vec<CinderError> {
        let mut substituted = Vec::new();

        if self.max_particles == 0 || self.max_particles > MAX_PARTICLES {
            substituted.push(CinderError::InvalidCapacity {
                requested: self.max_particles,
                max: MAX_PARTICLES,
            });
            self.max_particles = MAX_PARTICLES;
        }

        if !(self.particle_mass > 0.0 && self.particle_mass.is_finite()) {
            substituted.push(CinderError::InvalidMass(self.particle_mass));
            self.particle_mass = DEFAULT_PARTICLE_MASS;
        }

        for (axis, range) in [
            ('x', &mut self.force_range.x),
            ('y', &mut self.force_range.y),
            ('z', &mut self.force_range.z),
        ] {
            let [min, max] = *range;
            if !(min.is_finite() && max.is_finite() && (max - min).is_finite()) {
                substituted.push(CinderError::InvalidForceRange { axis, min, max });
                *range = [0.0, 0.0];
            } else if min > max {
                substituted.push(CinderError::InvalidForceRange { axis, min, max });
                range.swap(0, 1);
            }
        }

        if !self.base_acceleration.is_finite() {
            substituted.push(CinderError::InvalidAcceleration(self.base_acceleration));
            self.base_acceleration = Vec3::ZERO;
        }

        if !self.collision_error.is_finite() {
            substituted.push(CinderError::InvalidCollisionError(self.collision_error));
            self.collision_error = DEFAULT_COLLISION_ERROR;
        }

        if !(self.fixed_timestep > 0.0 && self.fixed_timestep.is_finite()) {
            substituted.push(CinderError::InvalidTimestep(self.fixed_timestep));
            self.fixed_timestep = DEFAULT_FIXED_TIMESTEP;
        }

        for err in &substituted {
            log::warn!("VerletConfig: {err}, using default");
        }
        substituted
    }
}

// ── TOML helpers (handle integer/float coercion) ──

fn toml_f32(v: &toml::Value, default: f32) -> f32 {
    v.as_float()
        .map(|f| f as f32)
        .or_else(|| v.as_integer().map(|i| i as f32))
        .unwrap_or(default)
}

/// Whole non-negative numbers, written as integers or integral floats.
/// Anything else becomes 0 so sanitize rejects it.
fn toml_count(v: &toml::Value) -> usize {
    v.as_integer()
        .or_else(|| {
            v.as_float()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        })
        .map(|n| n.max(0) as usize)
        .unwrap_or(0)
}

fn toml_vec2(v: &toml::Value, default: [f32; 2]) -> [f32; 2] {
    if let Some(arr) = v.as_array() {
        if arr.len() >= 2 {
            return [toml_f32(&arr[0], default[0]), toml_f32(&arr[1], default[1])];
        }
    }
    default
}

fn toml_vec3(v: &toml::Value, default: Vec3) -> Vec3 {
    if let Some(arr) = v.as_array() {
        if arr.len() >= 3 {
            return Vec3::new(
                toml_f32(&arr[0], default.x),
                toml_f32(&arr[1], default.y),
                toml_f32(&arr[2], default.z),
            );
        }
    }
    default
}
