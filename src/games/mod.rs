//! Keno game rules: draw, hits, payouts, settlement and admission

pub mod admission;
pub mod fairness;
pub mod hit_detector;
pub mod max_win;
pub mod payout;
pub mod payout_table;
pub mod settlement;
pub mod types;

pub use admission::WagerAdmission;
pub use fairness::FairnessEngine;
pub use hit_detector::HitDetector;
pub use max_win::MaxWinLimiter;
pub use payout::{PayoutCalculator, PayoutResult};
pub use payout_table::PayoutTable;
pub use settlement::{SettlementPipeline, SettlementReport, WagerSettlement};
pub use types::*;
