//! Runtime system trait

use cinder_core::Result;

/// A system that can be ticked by the game loop
///
/// Fixed update runs at a constant rate (simulation), while update runs once
/// per frame (presentation). The loop never calls into a system reentrantly.
pub trait RuntimeSystem {
    /// Called once before the first update
    fn initialize(&mut self) -> Result<()>;

    /// Called at a fixed rate (e.g. 60Hz) for deterministic simulation
    fn fixed_update(&mut self, dt: f64) -> Result<()>;

    /// Called once per frame for variable-rate logic
    fn update(&mut self, dt: f64) -> Result<()>;

    /// Called when the system is being shut down
    fn shutdown(&mut self) -> Result<()>;

    /// Human-readable name for this system
    fn name(&self) -> &str;
}
