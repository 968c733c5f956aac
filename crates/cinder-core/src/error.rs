//! Error types for Cinder

use thiserror::Error;

use crate::types::Vec3;

/// The main error type for Cinder operations
///
/// Configuration variants are produced at startup and are always recoverable:
/// the offending value is replaced by its default and the error is only
/// reported. `Consistency` is produced at runtime when the active index list
/// and the in-use flags disagree; the tick keeps going.
#[derive(Debug, Error)]
pub enum CinderError {
    #[error("Invalid capacity: {requested} (must be between 1 and {max})")]
    InvalidCapacity { requested: usize, max: usize },

    #[error("Invalid particle mass: {0} (must be > 0)")]
    InvalidMass(f32),

    #[error("Invalid {axis} force range: [{min}, {max}]")]
    InvalidForceRange { axis: char, min: f32, max: f32 },

    #[error("Invalid base acceleration: {0} (must be finite)")]
    InvalidAcceleration(Vec3),

    #[error("Invalid collision error: {0} (must be finite)")]
    InvalidCollisionError(f32),

    #[error("Invalid fixed timestep: {0} (must be > 0)")]
    InvalidTimestep(f32),

    #[error("Invalid terrain: {0}")]
    InvalidTerrain(String),

    #[error("Consistency error: slot {slot} at active position {position} is not in use")]
    Consistency { slot: u32, position: usize },

    #[error("Heightmap error: {0}")]
    Heightmap(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),
}

impl CinderError {
    /// True for the startup-only configuration variants
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            CinderError::InvalidCapacity { .. }
                | CinderError::InvalidMass(_)
                | CinderError::InvalidForceRange { .. }
                | CinderError::InvalidAcceleration(_)
                | CinderError::InvalidCollisionError(_)
                | CinderError::InvalidTimestep(_)
                | CinderError::InvalidTerrain(_)
        )
    }
}

/// Result type alias for Cinder operations
pub type Result<T> = std::result::Result<T, CinderError>;

impl From<toml::de::Error> for CinderError {
    fn from(err: toml::de::Error) -> Self {
        CinderError::TomlParseError(err.to_string())
    }
}
