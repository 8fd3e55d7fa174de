//! Error types for the keno round engine
//!
//! One root error with a nested enum per category, so callers can match on
//! the category (validation vs state vs ledger) without string inspection.

use crate::games::types::RoundStatus;

/// Root error type for all engine operations
#[derive(Debug, thiserror::Error)]
pub enum KenoError {
    /// Bad stake or selection shape
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Illegal lifecycle transition or round not open for betting
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Debit or credit rejected by the ledger
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Unknown round or wager
    #[error("Not found: {0}")]
    NotFound(#[from] NotFoundError),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Round/wager store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Input shape errors, raised before any mutation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Invalid draw: {0}")]
    InvalidDraw(String),

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("Stake {stake} outside allowed range [{min}, {max}]")]
    StakeOutOfRange { stake: u64, min: u64, max: u64 },

    #[error("Stake must be positive")]
    NonPositiveStake,
}

/// Lifecycle and betting state errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: RoundStatus, to: RoundStatus },

    #[error("Round {round_id} is not open for betting (status {status})")]
    RoundNotOpen { round_id: String, status: RoundStatus },

    #[error("Operator {0} is disabled")]
    OperatorDisabled(String),

    #[error("An open round already exists: {0}")]
    OpenRoundExists(String),

    #[error("Server seed for round {0} has not been revealed")]
    SeedNotRevealed(String),
}

/// Ledger rejections
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("Debit {reference_id} rejected: {reason}")]
    DebitRejected { reference_id: String, reason: String },

    #[error("Credit {reference_id} rejected: {reason}")]
    CreditRejected { reference_id: String, reason: String },

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NotFoundError {
    #[error("Round {0}")]
    Round(String),

    #[error("Wager {0}")]
    Wager(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration logical inconsistency: {0}")]
    LogicalInconsistency(String),

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Accumulator overflow on round {0}")]
    Overflow(String),
}

/// Failure processing a single wager inside a settlement batch.
///
/// Never propagated out of `settle_round`; collected in the report instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Settlement of wager {wager_id} failed: {reason}")]
pub struct SettlementItemError {
    pub wager_id: String,
    pub reason: String,
}

impl SettlementItemError {
    pub fn new(wager_id: impl Into<String>, source: &KenoError) -> Self {
        Self {
            wager_id: wager_id.into(),
            reason: source.to_string(),
        }
    }
}

impl KenoError {
    /// Short machine-readable code for the delivery layer
    pub fn code(&self) -> &'static str {
        match self {
            KenoError::Validation(ValidationError::StakeOutOfRange { .. })
            | KenoError::Validation(ValidationError::NonPositiveStake) => "ERR_BET_AMOUNT",
            KenoError::Validation(_) => "ERR_VALIDATION",
            KenoError::State(StateError::RoundNotOpen { .. }) => "ERR_ROUND_CLOSED",
            KenoError::State(StateError::OperatorDisabled(_)) => "ERR_OPERATOR_BLOCKED",
            KenoError::State(_) => "ERR_STATE",
            KenoError::Ledger(_) => "ERR_WALLET_REJECTED",
            KenoError::NotFound(_) => "ERR_NOT_FOUND",
            KenoError::Configuration(_) => "ERR_CONFIGURATION",
            KenoError::Storage(_) => "ERR_INTERNAL",
        }
    }
}

impl From<std::io::Error> for KenoError {
    fn from(e: std::io::Error) -> Self {
        KenoError::Configuration(ConfigurationError::LoadFailed(e.to_string()))
    }
}

impl From<toml::de::Error> for KenoError {
    fn from(e: toml::de::Error) -> Self {
        KenoError::Configuration(ConfigurationError::LoadFailed(format!(
            "Failed to parse TOML: {}",
            e
        )))
    }
}

// Convenience type alias for Results
pub type KenoResult<T> = Result<T, KenoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err: KenoError = ValidationError::InvalidSelection("duplicate 7".to_string()).into();

        assert!(err.to_string().contains("Validation error"));
        assert!(err.to_string().contains("duplicate 7"));
    }

    #[test]
    fn test_invalid_transition_details() {
        let err = StateError::InvalidTransition {
            from: RoundStatus::Open,
            to: RoundStatus::Drawing,
        };

        assert_eq!(err.to_string(), "Invalid state transition from OPEN to DRAWING");
    }

    #[test]
    fn test_error_conversion() {
        let err: KenoError = LedgerError::Unavailable("down".to_string()).into();

        match err {
            KenoError::Ledger(_) => {}
            _ => panic!("Expected ledger error"),
        }
    }

    #[test]
    fn test_error_source() {
        let err: KenoError = NotFoundError::Round("r-1".to_string()).into();
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_codes() {
        let closed: KenoError = StateError::RoundNotOpen {
            round_id: "r-1".to_string(),
            status: RoundStatus::Closing,
        }
        .into();
        assert_eq!(closed.code(), "ERR_ROUND_CLOSED");

        let stake: KenoError = ValidationError::StakeOutOfRange { stake: 1, min: 100, max: 200 }.into();
        assert_eq!(stake.code(), "ERR_BET_AMOUNT");
    }

    #[test]
    fn test_settlement_item_error_keeps_reason() {
        let source: KenoError = LedgerError::CreditRejected {
            reference_id: "WIN-BET-1".to_string(),
            reason: "wallet offline".to_string(),
        }
        .into();
        let item = SettlementItemError::new("BET-1", &source);

        assert_eq!(item.wager_id, "BET-1");
        assert!(item.reason.contains("wallet offline"));
    }
}
