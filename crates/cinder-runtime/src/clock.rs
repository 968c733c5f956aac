//! Fixed-step accumulator for headless hosts

/// Step used when none (or an unusable one) is given
pub const DEFAULT_FIXED_TIMESTEP: f64 = 1.0 / 60.0;

/// Longest frame the clock will account for, in seconds. Keeps a stalled host
/// from queueing an unbounded number of catch-up steps.
const MAX_FRAME_TIME: f64 = 0.25;

/// Converts elapsed host time into whole fixed steps
#[derive(Debug, Clone)]
pub struct GameClock {
    fixed_timestep: f64,
    /// Elapsed time of the last frame, after clamping
    delta_time: f64,
    accumulator: f64,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::with_step(DEFAULT_FIXED_TIMESTEP)
    }
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock stepping by exactly `seconds`. A step that is not a positive,
    /// finite number is replaced by [`DEFAULT_FIXED_TIMESTEP`].
    pub fn with_step(seconds: f64) -> Self {
        let fixed_timestep = if seconds > 0.0 && seconds.is_finite() {
            seconds
        } else {
            log::warn!("GameClock: step {seconds} is not usable, using {DEFAULT_FIXED_TIMESTEP}");
            DEFAULT_FIXED_TIMESTEP
        };
        Self {
            fixed_timestep,
            delta_time: 0.0,
            accumulator: 0.0,
        }
    }

    pub fn fixed_timestep(&self) -> f64 {
        self.fixed_timestep
    }

    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Feed `elapsed` seconds of host time into the accumulator
    pub fn advance(&mut self, elapsed: f64) {
        // Never clamp below one whole step, or long steps would starve
        let max_frame = MAX_FRAME_TIME.max(self.fixed_timestep);
        self.delta_time = if elapsed.is_finite() {
            elapsed.clamp(0.0, max_frame)
        } else {
            0.0
        };
        self.accumulator += self.delta_time;
    }

    /// Take one fixed step from the accumulator if enough time has built up
    pub fn try_consume_fixed_step(&mut self) -> bool {
        if self.accumulator >= self.fixed_timestep {
            self.accumulator -= self.fixed_timestep;
            true
        } else {
            false
        }
    }
}
