//! Scene files: system settings, optional terrain, and spawners in one TOML document

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cinder_core::CinderError;
use cinder_particles::VerletConfig;
use cinder_terrain::TerrainConfig;

use crate::fountain::FountainConfig;

/// A parsed scene file
#[derive(Debug, Clone)]
pub struct Scene {
    pub system: VerletConfig,
    pub terrain: Option<TerrainConfig>,
    pub spawners: Vec<FountainConfig>,
    /// Directory the scene was loaded from; heightmap paths resolve against it
    pub base_dir: PathBuf,
}

impl Scene {
    pub fn from_toml_str(source: &str, base_dir: &Path) -> Result<Self> {
        let table: toml::value::Table =
            toml::from_str(source).map_err(CinderError::from)?;

        let system = table
            .get("system")
            .and_then(|v| v.as_table())
            .map(VerletConfig::from_toml)
            .unwrap_or_default();

        let terrain = table
            .get("terrain")
            .and_then(|v| v.as_table())
            .map(TerrainConfig::from_toml);

        let spawners = table
            .get("spawner")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_table())
                    .map(FountainConfig::from_toml)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            system,
            terrain,
            spawners,
            base_dir: base_dir.to_path_buf(),
        })
    }

    /// Collect every value sanitisation would replace. The scene itself is left untouched.
    pub fn validate(&self) -> Vec<CinderError> {
        let mut issues = self.system.clone().sanitize();
        if let Some(terrain) = &self.terrain {
            issues.extend(terrain.clone().sanitize());
        }
        issues
    }
}

pub fn load_scene(path: &str) -> Result<Scene> {
    let path = Path::new(path);
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene '{}'", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    Scene::from_toml_str(&source, base_dir)
        .with_context(|| format!("Failed to parse scene '{}'", path.display()))
}
