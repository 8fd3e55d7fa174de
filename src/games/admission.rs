//! Wager admission
//!
//! Checks run in a fixed order and all of them happen before money moves:
//! round lookup, round OPEN, operator enabled, stake bounds, selection shape.
//! Only then is the player debited and the wager stored. The whole admission
//! runs inside the betting gate, so the round cannot close under it; the stake
//! is still booked through `admit_stake`, which re-checks OPEN atomically.

use crate::common::traits::{
    AuditAction, AuditEvent, AuditSink, Ledger, OperatorDirectory, RoundRepository, WagerRepository,
};
use crate::errors::{KenoResult, LedgerError, NotFoundError, StateError, ValidationError};
use crate::games::{
    hit_detector::HitDetector,
    payout::PayoutCalculator,
    types::{Amount, PlaceWagerRequest, Round, RoundStatus, Wager, MAX_NUMBER, MAX_PICK, MIN_NUMBER},
};
use crate::metrics::EngineMetrics;
use crate::round::gate::BettingGate;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub struct WagerAdmission {
    rounds: Arc<dyn RoundRepository>,
    wagers: Arc<dyn WagerRepository>,
    operators: Arc<dyn OperatorDirectory>,
    ledger: Arc<dyn Ledger>,
    audit: Arc<dyn AuditSink>,
    metrics: Arc<EngineMetrics>,
    gate: BettingGate,
    hit_detector: HitDetector,
    calculator: PayoutCalculator,
}

impl WagerAdmission {
    pub fn new(
        rounds: Arc<dyn RoundRepository>,
        wagers: Arc<dyn WagerRepository>,
        operators: Arc<dyn OperatorDirectory>,
        ledger: Arc<dyn Ledger>,
        audit: Arc<dyn AuditSink>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            rounds,
            wagers,
            operators,
            ledger,
            audit,
            metrics,
            gate: BettingGate::new(),
            hit_detector: HitDetector::new(),
            calculator: PayoutCalculator::default(),
        }
    }

    /// Share the gate the lifecycle takes when betting closes
    pub fn with_betting_gate(mut self, gate: BettingGate) -> Self {
        self.gate = gate;
        self
    }

    pub async fn place_wager(&self, request: PlaceWagerRequest) -> KenoResult<Wager> {
        let _admitting = self.gate.admit().await;

        let round = self.target_round(request.round_id.as_deref()).await?;
        if round.status != RoundStatus::Open {
            return Err(StateError::RoundNotOpen {
                round_id: round.round_id,
                status: round.status,
            }
            .into());
        }

        if !self.operators.is_enabled(&request.operator_id).await? {
            return Err(StateError::OperatorDisabled(request.operator_id).into());
        }

        let limits = self.operators.get_limits(&request.operator_id).await?;
        if request.stake.is_zero() {
            return Err(ValidationError::NonPositiveStake.into());
        }
        if request.stake < limits.min_stake || request.stake > limits.max_stake {
            return Err(ValidationError::StakeOutOfRange {
                stake: request.stake.minor(),
                min: limits.min_stake.minor(),
                max: limits.max_stake.minor(),
            }
            .into());
        }

        if !self.hit_detector.validate_selection(&request.selections) {
            return Err(ValidationError::InvalidSelection(format!(
                "expected 1-{} distinct numbers in [{}, {}], got {:?}",
                MAX_PICK, MIN_NUMBER, MAX_NUMBER, request.selections
            ))
            .into());
        }
        let mut selections = request.selections.clone();
        selections.sort_unstable();

        let top = self.calculator.table().max_multiplier(selections.len())?;
        if self
            .calculator
            .limiter()
            .would_exceed_limit(request.stake, top, limits.max_win_limit())
        {
            tracing::warn!(
                "Wager from {} on round {}: potential win {} exceeds operator cap {}, payout will be capped",
                request.player_id,
                round.round_id,
                request.stake.times(top),
                limits.max_win_per_wager
            );
        }

        let wager = Wager {
            wager_id: format!("BET-{}", Uuid::new_v4()),
            round_id: round.round_id.clone(),
            operator_id: request.operator_id,
            player_id: request.player_id,
            currency: request.currency,
            stake: request.stake,
            selections,
            hits: None,
            multiplier: None,
            win_amount: None,
            max_win_cap_applied: false,
            credited: false,
            placed_at: Utc::now(),
        };

        self.debit(&wager).await?;

        if let Err(e) = self.wagers.insert(wager.clone()).await {
            tracing::error!("Failed to store wager {} after debit: {}", wager.wager_id, e);
            self.refund(&wager).await;
            return Err(e);
        }
        if let Err(e) = self.rounds.admit_stake(&round.round_id, wager.stake).await {
            tracing::warn!("Wager {} not admitted to round {}: {}", wager.wager_id, round.round_id, e);
            if let Err(remove_err) = self.wagers.remove(&wager.wager_id).await {
                tracing::error!("Failed to drop unadmitted wager {}: {}", wager.wager_id, remove_err);
            }
            self.refund(&wager).await;
            return Err(e);
        }

        self.audit
            .record(
                AuditEvent::new(AuditAction::BetPlaced)
                    .wager(&wager)
                    .details(json!({
                        "stake": wager.stake.minor(),
                        "currency": wager.currency,
                        "selections": wager.selections,
                        "pickCount": wager.pick_count(),
                    })),
            )
            .await;
        self.metrics.record_wager_placed();

        tracing::debug!(
            "Wager {} accepted on round {}: {} on {:?}",
            wager.wager_id,
            wager.round_id,
            wager.stake,
            wager.selections
        );
        Ok(wager)
    }

    /// Win amount for each hit count, capped by the operator's limit
    pub async fn potential_payouts(
        &self,
        operator_id: &str,
        pick: usize,
        stake: Amount,
    ) -> KenoResult<Vec<(usize, Amount)>> {
        let limits = self.operators.get_limits(operator_id).await?;
        self.calculator.potential_payouts(pick, stake, limits.max_win_limit())
    }

    async fn target_round(&self, round_id: Option<&str>) -> KenoResult<Round> {
        match round_id {
            Some(id) => self
                .rounds
                .get(id)
                .await?
                .ok_or_else(|| NotFoundError::Round(id.to_string()).into()),
            None => self
                .rounds
                .find_open()
                .await?
                .ok_or_else(|| NotFoundError::Round("current".to_string()).into()),
        }
    }

    async fn debit(&self, wager: &Wager) -> KenoResult<()> {
        let outcome = self
            .ledger
            .debit(&wager.player_id, wager.stake, &wager.currency, &wager.wager_id)
            .await;

        let (success, error) = match &outcome {
            Ok(receipt) => (receipt.success, receipt.error.clone()),
            Err(e) => (false, Some(e.to_string())),
        };
        self.audit
            .record(
                AuditEvent::new(AuditAction::WalletDebit)
                    .wager(wager)
                    .details(json!({
                        "referenceId": wager.wager_id,
                        "amount": wager.stake.minor(),
                        "currency": wager.currency,
                        "success": success,
                        "error": error,
                    })),
            )
            .await;

        let receipt = outcome?;
        if !receipt.success {
            tracing::info!(
                "Debit for {} rejected: {}",
                wager.wager_id,
                receipt.error.as_deref().unwrap_or("unknown")
            );
            return Err(LedgerError::DebitRejected {
                reference_id: wager.wager_id.clone(),
                reason: receipt.error.unwrap_or_else(|| "unknown".to_string()),
            }
            .into());
        }
        Ok(())
    }

    async fn refund(&self, wager: &Wager) {
        let reference = format!("REFUND-{}", wager.wager_id);
        match self
            .ledger
            .credit(&wager.player_id, wager.stake, &wager.currency, &reference)
            .await
        {
            Ok(receipt) if receipt.success => {
                tracing::info!("Refunded {} for unadmitted wager {}", wager.stake, wager.wager_id)
            }
            Ok(receipt) => tracing::error!(
                "Refund {} rejected: {}",
                reference,
                receipt.error.as_deref().unwrap_or("unknown")
            ),
            Err(e) => tracing::error!("Refund {} failed: {}", reference, e),
        }
    }
}
