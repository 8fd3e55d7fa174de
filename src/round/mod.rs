//! Round state machine and its periodic driver

pub mod gate;
pub mod lifecycle;
pub mod scheduler;

pub use gate::BettingGate;
pub use lifecycle::RoundLifecycle;
pub use scheduler::{RoundConfig, RoundScheduler, TickOutcome};
