//! Collaborator interfaces
//!
//! The engine talks to storage, the wallet, operator configuration and the
//! audit trail only through these traits, so each can be swapped for tests
//! or for a real backend.

use crate::errors::KenoResult;
use crate::games::types::{Amount, OperatorLimits, Round, Wager};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single ledger call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerReceipt {
    pub success: bool,
    pub new_balance: Option<Amount>,
    pub error: Option<String>,
}

impl LedgerReceipt {
    pub fn ok(new_balance: Amount) -> Self {
        Self {
            success: true,
            new_balance: Some(new_balance),
            error: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            new_balance: None,
            error: Some(reason.into()),
        }
    }
}

/// External wallet. `reference_id` is an idempotency key: repeating a call
/// with the same reference must not move funds twice.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn debit(
        &self,
        player_id: &str,
        amount: Amount,
        currency: &str,
        reference_id: &str,
    ) -> KenoResult<LedgerReceipt>;

    async fn credit(
        &self,
        player_id: &str,
        amount: Amount,
        currency: &str,
        reference_id: &str,
    ) -> KenoResult<LedgerReceipt>;

    async fn get_balance(&self, player_id: &str, currency: &str) -> KenoResult<Amount>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    BetPlaced,
    BetSettled,
    RoundStateChange,
    WalletDebit,
    WalletCredit,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::BetPlaced => "BET_PLACED",
            AuditAction::BetSettled => "BET_SETTLED",
            AuditAction::RoundStateChange => "ROUND_STATE_CHANGE",
            AuditAction::WalletDebit => "WALLET_DEBIT",
            AuditAction::WalletCredit => "WALLET_CREDIT",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub round_id: Option<String>,
    pub wager_id: Option<String>,
    pub player_id: Option<String>,
    pub operator_id: Option<String>,
    pub action: AuditAction,
    pub details: serde_json::Value,
}

impl AuditEvent {
    pub fn new(action: AuditAction) -> Self {
        Self {
            timestamp: Utc::now(),
            round_id: None,
            wager_id: None,
            player_id: None,
            operator_id: None,
            action,
            details: serde_json::Value::Null,
        }
    }

    pub fn round(mut self, round_id: impl Into<String>) -> Self {
        self.round_id = Some(round_id.into());
        self
    }

    /// Fills round, wager, player and operator from a wager
    pub fn wager(mut self, wager: &Wager) -> Self {
        self.round_id = Some(wager.round_id.clone());
        self.wager_id = Some(wager.wager_id.clone());
        self.player_id = Some(wager.player_id.clone());
        self.operator_id = Some(wager.operator_id.clone());
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Append-only audit trail. Recording must not fail the calling operation.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent);
}

#[async_trait]
pub trait OperatorDirectory: Send + Sync {
    async fn get_limits(&self, operator_id: &str) -> KenoResult<OperatorLimits>;

    async fn is_enabled(&self, operator_id: &str) -> KenoResult<bool>;
}

/// Round persistence
#[async_trait]
pub trait RoundRepository: Send + Sync {
    async fn get(&self, round_id: &str) -> KenoResult<Option<Round>>;

    async fn find_open(&self) -> KenoResult<Option<Round>>;

    /// Insert a new OPEN round. Fails with `StateError::OpenRoundExists`
    /// when another OPEN round is already stored.
    async fn insert_open(&self, round: Round) -> KenoResult<Round>;

    /// Persist lifecycle fields (status, timestamps, seeds, draw, published
    /// flag). Accumulators are left untouched.
    async fn save(&self, round: &Round) -> KenoResult<()>;

    /// Add a new wager's stake to `total_staked`, in the same step as checking
    /// that the round is still OPEN. Fails with `StateError::RoundNotOpen`
    /// otherwise and leaves the totals untouched.
    async fn admit_stake(&self, round_id: &str, stake: Amount) -> KenoResult<Round>;

    /// Atomically add to the round's accumulators and return the updated round
    async fn increment_totals(&self, round_id: &str, staked: Amount, paid: Amount) -> KenoResult<Round>;

    /// Monotonic nonce source for new rounds
    async fn next_nonce(&self) -> KenoResult<u64>;
}

/// Wager persistence
#[async_trait]
pub trait WagerRepository: Send + Sync {
    async fn insert(&self, wager: Wager) -> KenoResult<()>;

    async fn get(&self, wager_id: &str) -> KenoResult<Option<Wager>>;

    /// Wagers of the round with `credited == false`, in placement order
    async fn pending_for_round(&self, round_id: &str) -> KenoResult<Vec<Wager>>;

    async fn save(&self, wager: &Wager) -> KenoResult<()>;

    /// Drop a wager that was never admitted. Settled wagers cannot be removed.
    async fn remove(&self, wager_id: &str) -> KenoResult<()>;

    async fn for_round(&self, round_id: &str) -> KenoResult<Vec<Wager>>;
}
