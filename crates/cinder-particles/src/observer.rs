//! Diagnostic hooks invoked from the integrator

use cinder_core::{CinderError, Vec3};

use crate::probe::ProbeSample;

/// A particle's next position reached the terrain surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub slot: u32,
    /// Next position in world space
    pub world_position: Vec3,
    pub terrain_height: f32,
    pub height_diff: f32,
    /// Terrain normal under the particle
    pub normal: Vec3,
}

/// Receives side-channel events from a tick. All methods default to no-ops.
pub trait SimulationObserver {
    /// Collision detected; the particle is not moved in response
    fn on_collision(&mut self, _event: &CollisionEvent) {}

    /// Terrain under a particle's current position, when probe dumps are enabled
    fn on_probe(&mut self, _slot: u32, _sample: &ProbeSample) {}

    /// Active list and in-use flags disagreed
    fn on_consistency_error(&mut self, _error: &CinderError) {}
}

/// Forwards events to the `log` facade at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SimulationObserver for LogObserver {
    fn on_collision(&mut self, event: &CollisionEvent) {
        log::debug!(
            "Colliding: slot {} at {} (terrain {:.3}), normal {}",
            event.slot,
            event.world_position,
            event.terrain_height,
            event.normal
        );
    }

    fn on_probe(&mut self, slot: u32, sample: &ProbeSample) {
        log::debug!(
            "Probe slot {}: world {}, terrain offset {}, normalized ({:.4}, {:.4})",
            slot,
            sample.world_position,
            sample.offset_from_terrain,
            sample.normalized[0],
            sample.normalized[1]
        );
        log::debug!(
            "Probe slot {}: height {:.3}, height diff {:.3}, normal {}",
            slot,
            sample.height,
            sample.height_diff,
            sample.normal
        );
    }
}
