//! Terrain configuration and the heightmap-backed terrain service

use std::path::Path;

use cinder_core::{CinderError, Result, Vec3};

use crate::field::TerrainField;
use crate::heightmap::Heightmap;

const DEFAULT_EXTENT: f32 = 100.0;

/// Configuration for a terrain, parsed from a `[terrain]` TOML table
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainConfig {
    /// Path to the heightmap PNG. Empty means a flat terrain.
    pub heightmap_path: String,
    /// World-space X extent
    pub width: f32,
    /// World-space Z extent
    pub depth: f32,
    /// Maximum Y height (heightmap 1.0 maps to this)
    pub height_scale: f32,
    /// World-space position of the terrain's (0, 0) corner
    pub origin: Vec3,
    /// Surface height used when no heightmap is given
    pub flat_height: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            heightmap_path: String::new(),
            width: DEFAULT_EXTENT,
            depth: DEFAULT_EXTENT,
            height_scale: 20.0,
            origin: Vec3::ZERO,
            flat_height: 0.0,
        }
    }
}

impl TerrainConfig {
    /// Parse a TerrainConfig from a TOML table. Missing keys keep their defaults.
    pub fn from_toml(table: &toml::value::Table) -> Self {
        let mut config = Self::default();

        if let Some(s) = table.get("heightmap").and_then(|v| v.as_str()) {
            config.heightmap_path = s.to_string();
        }
        if let Some(v) = table.get("width") {
            config.width = toml_f32(v, config.width);
        }
        if let Some(v) = table.get("depth") {
            config.depth = toml_f32(v, config.depth);
        }
        if let Some(v) = table.get("height_scale") {
            config.height_scale = toml_f32(v, config.height_scale);
        }
        if let Some(v) = table.get("origin") {
            config.origin = toml_vec3(v, config.origin);
        }
        if let Some(v) = table.get("flat_height") {
            config.flat_height = toml_f32(v, config.flat_height);
        }

        config
    }

    /// Replace non-positive extents with the default, returning what was replaced
    pub fn sanitize(&mut self) -> Vec<CinderError> {
        let mut substituted = Vec::new();

        if !(self.width > 0.0 && self.width.is_finite()) {
            substituted.push(CinderError::InvalidTerrain(format!(
                "width {} reset to {DEFAULT_EXTENT}",
                self.width
            )));
            self.width = DEFAULT_EXTENT;
        }
        if !(self.depth > 0.0 && self.depth.is_finite()) {
            substituted.push(CinderError::InvalidTerrain(format!(
                "depth {} reset to {DEFAULT_EXTENT}",
                self.depth
            )));
            self.depth = DEFAULT_EXTENT;
        }

        for err in &substituted {
            log::warn!("TerrainConfig: {err}");
        }
        substituted
    }
}

/// A heightmap-backed terrain answering height and normal queries
pub struct Terrain {
    /// The source heightmap
    pub heightmap: Heightmap,
    pub config: TerrainConfig,
}

impl Terrain {
    pub fn new(heightmap: Heightmap, config: TerrainConfig) -> Self {
        Self { heightmap, config }
    }

    /// A flat terrain at `height` covering `width` x `depth` from `origin`
    pub fn flat(width: f32, depth: f32, height: f32, origin: Vec3) -> Self {
        let config = TerrainConfig {
            width,
            depth,
            height_scale: height,
            origin,
            flat_height: height,
            ..Default::default()
        };
        Self::new(Heightmap::flat(), config)
    }

    /// Build a terrain from config, loading the heightmap relative to `base_dir`.
    /// An empty heightmap path yields a flat terrain at `flat_height`.
    pub fn load(mut config: TerrainConfig, base_dir: &Path) -> Result<Self> {
        config.sanitize();

        if config.heightmap_path.is_empty() {
            log::info!(
                "Terrain: flat at height {} ({} x {})",
                config.flat_height,
                config.width,
                config.depth
            );
            return Ok(Self::flat(
                config.width,
                config.depth,
                config.flat_height,
                config.origin,
            ));
        }

        let path = base_dir.join(&config.heightmap_path);
        let heightmap = Heightmap::from_png(&path)?;
        log::info!(
            "Terrain: loaded {}x{} heightmap from {}",
            heightmap.width,
            heightmap.depth,
            path.display()
        );
        Ok(Self::new(heightmap, config))
    }
}

impl TerrainField for Terrain {
    fn interpolated_height(&self, u: f32, v: f32) -> f32 {
        self.heightmap.sample(u, v) * self.config.height_scale
    }

    fn interpolated_normal(&self, u: f32, v: f32) -> Vec3 {
        Vec3::from_array(self.heightmap.compute_normal(
            u,
            v,
            self.config.width,
            self.config.depth,
            self.config.height_scale,
        ))
    }

    fn size(&self) -> (f32, f32) {
        (self.config.width, self.config.depth)
    }

    fn origin(&self) -> Vec3 {
        self.config.origin
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
