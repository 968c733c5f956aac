//! Cinder Runtime - Game loop infrastructure
//!
//! Provides the host-side building blocks that drive a simulation:
//! - `GameClock` - turns elapsed host time into whole fixed steps
//! - `RuntimeSystem` - trait for systems ticked by the game loop
//! - `GameLoop` - owns a clock and a system and feeds it fixed steps

mod clock;
mod game_loop;
mod system;

pub use clock::{GameClock, DEFAULT_FIXED_TIMESTEP};
pub use game_loop::GameLoop;
pub use system::RuntimeSystem;
