//! Particle creation requests and the spawner seam

use cinder_core::Vec3;

/// A request for one new particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreationRequest {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Seconds the particle lives for
    pub time_to_live: f32,
}

impl CreationRequest {
    pub fn new(position: Vec3, velocity: Vec3, time_to_live: f32) -> Self {
        Self {
            position,
            velocity,
            time_to_live,
        }
    }
}

/// Decides when and where particles originate.
///
/// Called synchronously from the tick. Requests beyond the pool's remaining
/// capacity are dropped, in the order returned.
pub trait Spawner {
    /// Particles created once, when the system starts
    fn generate_initial_particles(&mut self) -> Vec<CreationRequest> {
        Vec::new()
    }

    /// Particles created at the start of every tick
    fn generate_particles(&mut self) -> Vec<CreationRequest>;
}
