//! Keno round lifecycle engine
//!
//! Runs timed keno rounds: players pick numbers during a betting window, the
//! house draws 20 of 80 with a commit-reveal HMAC scheme, and wagers are
//! settled against a fixed payout table with per-operator win caps.
//!
//! The wallet, operator configuration, audit trail and stores are traits in
//! [`common::traits`]; in-memory implementations ship with the crate. The
//! [`KenoEngine`] bundle wires everything together.

pub mod audit;
pub mod common;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod games;
pub mod ledger;
pub mod metrics;
pub mod operators;
pub mod round;
pub mod storage;

pub use config::KenoConfig;
pub use engine::KenoEngine;
pub use errors::{KenoError, KenoResult};
pub use events::{RoundEvent, RoundEvents};
pub use games::{
    Amount, FairnessEngine, Multiplier, PlaceWagerRequest, Round, RoundStatus, RoundView, Wager,
    WagerAdmission,
};
pub use metrics::EngineMetrics;
pub use round::{BettingGate, RoundConfig, RoundLifecycle, RoundScheduler, TickOutcome};
