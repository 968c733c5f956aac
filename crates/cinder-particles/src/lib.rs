//! Cinder Particles - Fixed-capacity Verlet particle system
//!
//! Provides a pooled point-particle simulation with:
//! - Slot-indexed struct-of-arrays storage with free-slot recycling
//! - An ordered active index list with a topology dirty flag for renderers
//! - Position Verlet integration under per-particle constant forces
//! - Heightfield terrain collision detection (detection only, no response)
//! - Spawner and observer seams for the host to plug into

pub mod active;
pub mod config;
pub mod force;
pub mod integrator;
pub mod mesh;
pub mod observer;
pub mod pool;
pub mod probe;
pub mod spawner;
pub mod system;

pub use active::ActiveIndexList;
pub use config::VerletConfig;
pub use force::{ForceRange, ForceSampler};
pub use integrator::{Integrator, TickStats};
pub use mesh::{PointMesh, PointVertex};
pub use observer::{CollisionEvent, LogObserver, SimulationObserver};
pub use pool::{ParticlePool, MAX_PARTICLES};
pub use probe::{ProbeSample, TerrainCollisionProbe};
pub use spawner::{CreationRequest, Spawner};
pub use system::{RenderSnapshot, VerletParticleSystem};
