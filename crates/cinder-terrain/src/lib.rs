//! Cinder Terrain - Heightfield terrain service
//!
//! Provides the height/normal query surface the particle simulator probes
//! for collisions. `TerrainField` is the seam: anything that can answer
//! interpolated height and normal queries at normalized coordinates can be
//! plugged in. `Terrain` is the bundled implementation, backed by a
//! grayscale heightmap (PNG or raw samples) with bilinear sampling.

pub mod field;
pub mod heightmap;
pub mod terrain;

pub use field::TerrainField;
pub use heightmap::Heightmap;
pub use terrain::{Terrain, TerrainConfig};
