//! A point fountain: the demo spawner used by scene files

use cinder_core::Vec3;
use cinder_particles::{CreationRequest, Spawner};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Configuration parsed from a `[[spawner]]` TOML table
#[derive(Debug, Clone, PartialEq)]
pub struct FountainConfig {
    pub position: Vec3,
    pub direction: Vec3,
    pub speed: f32,
    /// Cone half-angle in degrees
    pub spread: f32,
    /// Particles per tick
    pub rate: u32,
    /// Particles created at startup
    pub initial_count: u32,
    pub time_to_live: f32,
}

impl Default for FountainConfig {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::UP,
            speed: 5.0,
            spread: 15.0,
            rate: 10,
            initial_count: 0,
            time_to_live: 2.0,
        }
    }
}

impl FountainConfig {
    pub fn from_toml(table: &toml::value::Table) -> Self {
        let mut config = Self::default();

        if let Some(v) = table.get("position") {
            config.position = toml_vec3(v, config.position);
        }
        if let Some(v) = table.get("direction") {
            config.direction = toml_vec3(v, config.direction);
        }
        if let Some(v) = table.get("speed") {
            config.speed = toml_f32(v, config.speed);
        }
        if let Some(v) = table.get("spread") {
            config.spread = toml_f32(v, config.spread);
        }
        if let Some(v) = table.get("rate") {
            config.rate = v.as_integer().unwrap_or(0).max(0) as u32;
        }
        if let Some(v) = table.get("initial_count") {
            config.initial_count = v.as_integer().unwrap_or(0).max(0) as u32;
        }
        if let Some(v) = table.get("time_to_live") {
            config.time_to_live = toml_f32(v, config.time_to_live);
        }

        config
    }
}

/// Emits particles from a point along a cone around `direction`
pub struct FountainSpawner {
    config: FountainConfig,
    rng: StdRng,
}

impl FountainSpawner {
    pub fn new(config: FountainConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn emit(&mut self, count: u32) -> Vec<CreationRequest> {
        (0..count)
            .map(|_| {
                let dir = self.cone_direction();
                CreationRequest::new(
                    self.config.position,
                    dir * self.config.speed,
                    self.config.time_to_live,
                )
            })
            .collect()
    }

    /// Random unit direction within `spread` degrees of the configured direction
    fn cone_direction(&mut self) -> Vec3 {
        let forward = self.config.direction.normalized();
        let forward = if forward == Vec3::ZERO || !forward.is_finite() {
            Vec3::UP
        } else {
            forward
        };
        // NaN fails this comparison too
        let angle = self.config.spread.clamp(0.0, 180.0);
        if !(angle > 0.0) {
            return forward;
        }

        // Uniform cos_theta in [cos_angle, 1], uniform phi in [0, 2pi]
        let cos_angle = angle.to_radians().cos();
        let cos_theta = self.rng.random_range(cos_angle..=1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi = self.rng.random_range(0.0..std::f32::consts::TAU);

        // Rotate from +Z to forward
        let up = if forward.y.abs() > 0.99 {
            Vec3::new(1.0, 0.0, 0.0)
        } else {
            Vec3::UP
        };
        let right = up.cross(&forward).normalized();
        let actual_up = forward.cross(&right);

        right * (sin_theta * phi.cos()) + actual_up * (sin_theta * phi.sin()) + forward * cos_theta
    }
}

impl Spawner for FountainSpawner {
    fn generate_initial_particles(&mut self) -> Vec<CreationRequest> {
        self.emit(self.config.initial_count)
    }

    fn generate_particles(&mut self) -> Vec<CreationRequest> {
        self.emit(self.config.rate)
    }
}

// ── TOML helpers (handle integer/float coercion) ──

fn toml_f32(v: &toml::Value, default: f32) -> f32 {
    v.as_float()
        .map(|f| f as f32)
        .or_else(|| v.as_integer().map(|i| i as f32))
        .unwrap_or(default)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_rate_per_tick_and_initial_burst() {
        let config = FountainConfig {
            rate: 4,
            initial_count: 9,
            ..Default::default()
        };
        let mut fountain = FountainSpawner::new(config, 1);
        assert_eq!(fountain.generate_initial_particles().len(), 9);
        assert_eq!(fountain.generate_particles().len(), 4);
    }

    #[test]
    fn zero_spread_goes_straight() {
        let config = FountainConfig {
            direction: Vec3::new(0.0, 0.0, 2.0),
            speed: 3.0,
            spread: 0.0,
            rate: 1,
            ..Default::default()
        };
        let mut fountain = FountainSpawner::new(config, 1);
        let req = fountain.generate_particles()[0];
        assert!(req.velocity.distance(&Vec3::new(0.0, 0.0, 3.0)) < 1e-5);
    }

    #[test]
    fn nan_spread_and_direction_go_straight_up() {
        let config = FountainConfig {
            direction: Vec3::new(f32::NAN, 1.0, 0.0),
            spread: f32::NAN,
            speed: 1.0,
            rate: 5,
            ..Default::default()
        };
        let mut fountain = FountainSpawner::new(config, 3);
        for req in fountain.generate_particles() {
            assert_eq!(req.velocity, Vec3::UP);
        }
    }

    #[test]
    fn velocities_stay_inside_cone() {
        let config = FountainConfig {
            spread: 30.0,
            speed: 2.0,
            rate: 200,
            ..Default::default()
        };
        let mut fountain = FountainSpawner::new(config, 7);
        let min_cos = 30.0f32.to_radians().cos() - 1e-4;
        for req in fountain.generate_particles() {
            assert!((req.velocity.length() - 2.0).abs() < 1e-3);
            assert!(req.velocity.normalized().dot(&Vec3::UP) >= min_cos);
        }
    }

    #[test]
    fn parse_from_toml() {
        let toml_str = r#"
position = [0, 10, 0]
direction = [1, 0, 0]
speed = 8
spread = 20.5
rate = 3
initial_count = 50
time_to_live = 1.5
"#;
        let table: toml::value::Table = toml::from_str(toml_str).unwrap();
        let config = FountainConfig::from_toml(&table);
        assert_eq!(config.position, Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(config.direction, Vec3::new(1.0, 0.0, 0.0));
        assert!((config.speed - 8.0).abs() < 1e-6);
        assert!((config.spread - 20.5).abs() < 1e-6);
        assert_eq!(config.rate, 3);
        assert_eq!(config.initial_count, 50);
        assert!((config.time_to_live - 1.5).abs() < 1e-6);
    }
}
