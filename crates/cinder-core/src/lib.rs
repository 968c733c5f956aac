//! Cinder Core - Foundational types for the Cinder particle simulator
//!
//! This crate provides the core types that all other Cinder crates depend on:
//! - `Vec3` - Single-precision 3D vector used for all simulation math
//! - `lerp` / `inverse_lerp` - Scalar interpolation helpers
//! - Error types and Result alias

mod error;
mod math;
mod types;

pub use error::{CinderError, Result};
pub use math::{inverse_lerp, lerp};
pub use types::Vec3;
