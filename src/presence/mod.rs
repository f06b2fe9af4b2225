pub mod engine;
pub mod sweeper;

pub use engine::{PresenceEngine, SweepReport};
pub use sweeper::{DEFAULT_SWEEP_INTERVAL, Sweeper, SweeperHandle};
