//! Settlement pipeline
//!
//! Prices every uncredited wager of a drawn round and credits winners. Each
//! wager is its own unit of work: a failure is recorded in the report and the
//! batch moves on.

use crate::common::traits::{
    AuditAction, AuditEvent, AuditSink, Ledger, OperatorDirectory, RoundRepository, WagerRepository,
};
use crate::errors::{KenoResult, LedgerError, SettlementItemError};
use crate::games::{
    hit_detector::HitDetector,
    payout::{PayoutCalculator, PayoutResult},
    types::{Amount, Multiplier, Round, Wager},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Outcome for a wager that was priced successfully
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WagerSettlement {
    pub wager_id: String,
    pub hits: usize,
    pub multiplier: Multiplier,
    pub win_amount: Amount,
    pub max_win_cap_applied: bool,
    pub credited: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SettlementReport {
    pub round_id: String,
    pub results: Vec<Result<WagerSettlement, SettlementItemError>>,
}

impl SettlementReport {
    fn empty(round_id: &str) -> Self {
        Self {
            round_id: round_id.to_string(),
            results: Vec::new(),
        }
    }

    pub fn settled(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn credited(&self) -> usize {
        self.successes().filter(|s| s.credited).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.is_err()).count()
    }

    /// Sum of wins credited in this pass
    pub fn total_paid(&self) -> Amount {
        Amount(
            self.successes()
                .filter(|s| s.credited)
                .map(|s| s.win_amount.minor())
                .sum(),
        )
    }

    pub fn errors(&self) -> impl Iterator<Item = &SettlementItemError> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }

    fn successes(&self) -> impl Iterator<Item = &WagerSettlement> {
        self.results.iter().filter_map(|r| r.as_ref().ok())
    }
}

pub struct SettlementPipeline {
    rounds: Arc<dyn RoundRepository>,
    wagers: Arc<dyn WagerRepository>,
    operators: Arc<dyn OperatorDirectory>,
    ledger: Arc<dyn Ledger>,
    audit: Arc<dyn AuditSink>,
    hit_detector: HitDetector,
    calculator: PayoutCalculator,
}

impl SettlementPipeline {
    pub fn new(
        rounds: Arc<dyn RoundRepository>,
        wagers: Arc<dyn WagerRepository>,
        operators: Arc<dyn OperatorDirectory>,
        ledger: Arc<dyn Ledger>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            rounds,
            wagers,
            operators,
            ledger,
            audit,
            hit_detector: HitDetector::new(),
            calculator: PayoutCalculator::default(),
        }
    }

    /// Settle all uncredited wagers of a drawn round.
    ///
    /// Does nothing for a round without a draw. Only the initial wager read
    /// can fail the whole call; per-wager errors end up in the report.
    pub async fn settle_round(&self, round: &Round) -> KenoResult<SettlementReport> {
        let mut report = SettlementReport::empty(&round.round_id);
        if !round.is_drawn() {
            tracing::debug!("Round {} has no draw, nothing to settle", round.round_id);
            return Ok(report);
        }

        let pending = self.wagers.pending_for_round(&round.round_id).await?;
        tracing::info!("Settling {} pending wagers for round {}", pending.len(), round.round_id);

        for wager in pending {
            let wager_id = wager.wager_id.clone();
            match self.settle_wager(round, wager).await {
                Ok(settlement) => report.results.push(Ok(settlement)),
                Err(e) => {
                    tracing::warn!(
                        round_id = %round.round_id,
                        wager_id = %wager_id,
                        "Wager settlement failed: {}",
                        e
                    );
                    report.results.push(Err(SettlementItemError::new(wager_id, &e)));
                }
            }
        }

        tracing::info!(
            "Round {} settled: {} ok, {} credited, {} failed, {} paid",
            round.round_id,
            report.settled(),
            report.credited(),
            report.failed(),
            report.total_paid()
        );
        Ok(report)
    }

    async fn settle_wager(&self, round: &Round, mut wager: Wager) -> KenoResult<WagerSettlement> {
        let hits = self
            .hit_detector
            .calculate_hits(&wager.selections, &round.numbers_drawn)?;
        let limits = self.operators.get_limits(&wager.operator_id).await?;
        let payout = self.calculator.calculate_payout(
            wager.pick_count(),
            hits,
            wager.stake,
            limits.max_win_limit(),
        )?;

        wager.hits = Some(hits as u8);
        wager.multiplier = Some(payout.multiplier);
        wager.win_amount = Some(payout.win_amount);
        wager.max_win_cap_applied = payout.max_win_cap_applied;
        wager.credited = false;
        self.wagers.save(&wager).await?;

        tracing::debug!(
            "Wager {} on round {}: {} hits, {} -> {}",
            wager.wager_id,
            round.round_id,
            hits,
            payout.multiplier,
            payout.win_amount
        );

        let credited = if payout.is_win && !payout.win_amount.is_zero() {
            self.credit_win(&mut wager, &payout).await?;
            true
        } else {
            false
        };

        self.audit
            .record(
                AuditEvent::new(AuditAction::BetSettled)
                    .wager(&wager)
                    .details(json!({
                        "hits": hits,
                        "multiplier": payout.multiplier.to_string(),
                        "baseWinAmount": payout.base_win_amount.minor(),
                        "winAmount": payout.win_amount.minor(),
                        "maxWinCapApplied": payout.max_win_cap_applied,
                        "credited": credited,
                    })),
            )
            .await;

        Ok(WagerSettlement {
            wager_id: wager.wager_id,
            hits,
            multiplier: payout.multiplier,
            win_amount: payout.win_amount,
            max_win_cap_applied: payout.max_win_cap_applied,
            credited,
        })
    }

    /// Credit first, then mark the wager and add to the round's paid total.
    /// The `WIN-` reference makes a repeat credit after a crash a no-op.
    async fn credit_win(&self, wager: &mut Wager, payout: &PayoutResult) -> KenoResult<()> {
        let reference = wager.win_reference();
        let outcome = self
            .ledger
            .credit(&wager.player_id, payout.win_amount, &wager.currency, &reference)
            .await;

        let (success, detail) = match &outcome {
            Ok(receipt) if receipt.success => (true, json!({ "newBalance": receipt.new_balance })),
            Ok(receipt) => (false, json!({ "error": receipt.error })),
            Err(e) => (false, json!({ "error": e.to_string() })),
        };
        self.audit
            .record(
                AuditEvent::new(AuditAction::WalletCredit)
                    .wager(wager)
                    .details(json!({
                        "referenceId": reference,
                        "amount": payout.win_amount.minor(),
                        "currency": wager.currency,
                        "success": success,
                        "result": detail,
                    })),
            )
            .await;

        let receipt = outcome?;
        if !receipt.success {
            return Err(LedgerError::CreditRejected {
                reference_id: reference,
                reason: receipt.error.unwrap_or_else(|| "unknown".to_string()),
            }
            .into());
        }

        wager.credited = true;
        self.wagers.save(wager).await?;
        self.rounds
            .increment_totals(&wager.round_id, Amount::ZERO, payout.win_amount)
            .await?;
        Ok(())
    }
}
