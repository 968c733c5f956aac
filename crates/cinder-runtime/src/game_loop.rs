//! Host loop feeding fixed steps to a runtime system

use cinder_core::Result;

use crate::clock::GameClock;
use crate::system::RuntimeSystem;

/// Owns a clock and a single system, and drives it frame by frame.
///
/// The host reports elapsed time with [`advance`](Self::advance); the clock
/// turns it into whole fixed steps.
///
/// Errors from `fixed_update`/`update` are logged and the loop keeps going;
/// only `initialize` and `shutdown` propagate.
pub struct GameLoop<S: RuntimeSystem> {
    clock: GameClock,
    system: S,
    fixed_steps: u64,
}

impl<S: RuntimeSystem> GameLoop<S> {
    pub fn new(system: S, clock: GameClock) -> Self {
        Self {
            clock,
            system,
            fixed_steps: 0,
        }
    }

    pub fn initialize(&mut self) -> Result<()> {
        log::info!("[{}] initializing", self.system.name());
        self.system.initialize()
    }

    /// Run one frame covering `elapsed` seconds of host time
    pub fn advance(&mut self, elapsed: f64) {
        self.clock.advance(elapsed);
        let dt = self.clock.fixed_timestep();
        while self.clock.try_consume_fixed_step() {
            self.fixed_step(dt);
        }
        self.run_update();
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn fixed_steps(&self) -> u64 {
        self.fixed_steps
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut S {
        &mut self.system
    }

    /// Shut the system down and hand it back
    pub fn shutdown(mut self) -> Result<S> {
        self.system.shutdown()?;
        Ok(self.system)
    }

    fn fixed_step(&mut self, dt: f64) {
        if let Err(e) = self.system.fixed_update(dt) {
            log::error!("[{}] fixed update error: {e}", self.system.name());
        }
        self.fixed_steps += 1;
    }

    fn run_update(&mut self) {
        let dt = self.clock.delta_time();
        if let Err(e) = self.system.update(dt) {
            log::error!("[{}] update error: {e}", self.system.name());
        }
    }
}
