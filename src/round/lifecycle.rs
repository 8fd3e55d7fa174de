//! Round state machine
//!
//! ```text
//! OPEN -> CLOSING -> DRAWING -> SETTLING -> PAYOUT -> ARCHIVED
//!   \________\__________\__________\
//!                                   -> CANCELLED
//! ```
//!
//! Transitions are validated against the stored round, side effects run, and
//! the lifecycle fields are persisted. Draw generation happens on entering
//! DRAWING and settlement on entering SETTLING.

use crate::common::traits::{AuditAction, AuditEvent, AuditSink, RoundRepository};
use crate::errors::{KenoError, KenoResult, NotFoundError, StateError};
use crate::events::{RoundEvent, RoundEvents};
use crate::games::{
    fairness::FairnessEngine,
    settlement::{SettlementPipeline, SettlementReport},
    types::{Amount, FairnessProof, Round, RoundStatus, RoundView},
};
use crate::metrics::EngineMetrics;
use crate::round::gate::BettingGate;
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast;

pub struct RoundLifecycle {
    rounds: Arc<dyn RoundRepository>,
    fairness: FairnessEngine,
    settlement: SettlementPipeline,
    audit: Arc<dyn AuditSink>,
    events: RoundEvents,
    metrics: Arc<EngineMetrics>,
    gate: BettingGate,
    client_seed: Option<String>,
}

impl RoundLifecycle {
    pub fn new(
        rounds: Arc<dyn RoundRepository>,
        settlement: SettlementPipeline,
        audit: Arc<dyn AuditSink>,
        events: RoundEvents,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            rounds,
            fairness: FairnessEngine::new(),
            settlement,
            audit,
            events,
            metrics,
            gate: BettingGate::new(),
            client_seed: None,
        }
    }

    /// Share the gate wager admission holds while it books a stake
    pub fn with_betting_gate(mut self, gate: BettingGate) -> Self {
        self.gate = gate;
        self
    }

    /// Use the same client seed for every new round
    pub fn with_client_seed(mut self, client_seed: Option<String>) -> Self {
        self.client_seed = client_seed;
        self
    }

    pub fn can_transition(from: RoundStatus, to: RoundStatus) -> bool {
        use RoundStatus::*;
        matches!(
            (from, to),
            (Open, Closing)
                | (Open, Cancelled)
                | (Closing, Drawing)
                | (Closing, Cancelled)
                | (Drawing, Settling)
                | (Drawing, Cancelled)
                | (Settling, Payout)
                | (Settling, Cancelled)
                | (Payout, Archived)
        )
    }

    pub fn is_accepting_bets(status: RoundStatus) -> bool {
        status == RoundStatus::Open
    }

    pub fn is_terminal(status: RoundStatus) -> bool {
        matches!(status, RoundStatus::Archived | RoundStatus::Cancelled)
    }

    /// Next state on the normal path
    pub fn next_state(status: RoundStatus) -> Option<RoundStatus> {
        match status {
            RoundStatus::Open => Some(RoundStatus::Closing),
            RoundStatus::Closing => Some(RoundStatus::Drawing),
            RoundStatus::Drawing => Some(RoundStatus::Settling),
            RoundStatus::Settling => Some(RoundStatus::Payout),
            RoundStatus::Payout => Some(RoundStatus::Archived),
            RoundStatus::Archived | RoundStatus::Cancelled => None,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoundEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &RoundEvents {
        &self.events
    }

    pub fn fairness(&self) -> &FairnessEngine {
        &self.fairness
    }

    pub async fn transition(&self, round: &Round, to: RoundStatus) -> KenoResult<Round> {
        let (round, _) = self.transition_with_report(round, to).await?;
        Ok(round)
    }

    /// Like [`transition`](Self::transition), also returning the settlement
    /// report when the round entered SETTLING
    pub async fn transition_with_report(
        &self,
        round: &Round,
        to: RoundStatus,
    ) -> KenoResult<(Round, Option<SettlementReport>)> {
        // Leaving OPEN waits for admissions that already passed their status check
        let _closing = if matches!(to, RoundStatus::Closing | RoundStatus::Cancelled) {
            Some(self.gate.close().await)
        } else {
            None
        };

        let current = self.load(&round.round_id).await?;
        let from = current.status;
        if !Self::can_transition(from, to) {
            return Err(StateError::InvalidTransition { from, to }.into());
        }

        let mut next = current;
        let now = Utc::now();
        next.status = to;
        match to {
            RoundStatus::Closing => next.close_time = Some(now),
            RoundStatus::Drawing => {
                next.draw_time = Some(now);
                self.draw(&mut next)?;
            }
            RoundStatus::Archived => next.result_published = true,
            RoundStatus::Open | RoundStatus::Settling | RoundStatus::Payout | RoundStatus::Cancelled => {}
        }

        // Settle before SETTLING is stored; a failed wager read leaves the round in DRAWING
        let report = if to == RoundStatus::Settling {
            let report = self.settlement.settle_round(&next).await?;
            self.metrics.record_settlement(
                report.settled() as u64,
                report.credited() as u64,
                report.failed() as u64,
                report.total_paid().minor(),
            );
            Some(report)
        } else {
            None
        };
        self.rounds.save(&next).await?;

        // Settlement moves the accumulators, so hand back the stored copy
        let next = self.load(&next.round_id).await?;
        tracing::info!("Round {} transitioned {} -> {}", next.round_id, from, to);

        self.announce(Some(from), &next, report.as_ref()).await;
        if to == RoundStatus::Archived {
            self.metrics.record_round_archived();
        }

        Ok((next, report))
    }

    /// Create a new OPEN round with fresh seeds.
    ///
    /// Fails with `StateError::OpenRoundExists` when one is already open.
    pub async fn open_round(&self, scheduled_time: DateTime<Utc>, now: DateTime<Utc>) -> KenoResult<Round> {
        let server_seed = self.fairness.generate_server_seed();
        let server_seed_hash = self.fairness.hash_server_seed(&server_seed);
        let client_seed = self
            .client_seed
            .clone()
            .unwrap_or_else(|| self.fairness.generate_client_seed());
        let nonce = self.rounds.next_nonce().await?;

        let round = Round {
            round_id: generate_round_id(now),
            status: RoundStatus::Open,
            scheduled_time,
            open_time: now,
            close_time: None,
            draw_time: None,
            server_seed: Some(server_seed),
            server_seed_hash: Some(server_seed_hash),
            client_seed: Some(client_seed),
            nonce,
            numbers_drawn: Vec::new(),
            total_staked: Amount::ZERO,
            total_paid: Amount::ZERO,
            result_published: false,
        };

        let round = self.rounds.insert_open(round).await?;
        tracing::info!(
            "Opened round {} (nonce {}, commitment {})",
            round.round_id,
            round.nonce,
            round.server_seed_hash.as_deref().unwrap_or("-")
        );
        self.metrics.record_round_opened();
        self.announce(None, &round, None).await;
        Ok(round)
    }

    /// The single OPEN round, created if none exists. A caller that loses
    /// the creation race adopts the winner's round.
    pub async fn get_or_create_current_round(&self, now: DateTime<Utc>) -> KenoResult<Round> {
        self.get_or_create_round_at(now, now).await
    }

    /// As [`get_or_create_current_round`](Self::get_or_create_current_round),
    /// with an explicit schedule for a newly created round
    pub async fn get_or_create_round_at(
        &self,
        scheduled_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> KenoResult<Round> {
        if let Some(round) = self.rounds.find_open().await? {
            return Ok(round);
        }

        match self.open_round(scheduled_time, now).await {
            Ok(round) => Ok(round),
            Err(KenoError::State(StateError::OpenRoundExists(existing))) => {
                tracing::debug!("Lost round creation race, adopting {}", existing);
                self.rounds
                    .find_open()
                    .await?
                    .ok_or_else(|| NotFoundError::Round(existing).into())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_round(&self, round_id: &str) -> KenoResult<RoundView> {
        Ok(self.load(round_id).await?.view())
    }

    /// Full stored round, seeds included. Not for the delivery layer.
    pub async fn load_round(&self, round_id: &str) -> KenoResult<Round> {
        self.load(round_id).await
    }

    /// Verification bundle, once the round has closed for betting
    pub async fn fairness_proof(&self, round_id: &str) -> KenoResult<FairnessProof> {
        let round = self.load(round_id).await?;
        self.fairness.proof(&round)
    }

    async fn load(&self, round_id: &str) -> KenoResult<Round> {
        self.rounds
            .get(round_id)
            .await?
            .ok_or_else(|| NotFoundError::Round(round_id.to_string()).into())
    }

    fn draw(&self, round: &mut Round) -> KenoResult<()> {
        if round.server_seed.is_none() || round.client_seed.is_none() {
            tracing::warn!(
                "Round {} has no committed seeds; generating them now, this draw is not provably fair",
                round.round_id
            );
            if round.server_seed.is_none() {
                let seed = self.fairness.generate_server_seed();
                round.server_seed_hash = Some(self.fairness.hash_server_seed(&seed));
                round.server_seed = Some(seed);
            }
            if round.client_seed.is_none() {
                round.client_seed = Some(self.fairness.generate_client_seed());
            }
        }

        let (Some(server_seed), Some(client_seed)) = (&round.server_seed, &round.client_seed) else {
            return Ok(());
        };
        round.numbers_drawn = self.fairness.generate_draw(server_seed, client_seed, round.nonce)?;
        tracing::info!("Round {} drew {:?}", round.round_id, round.numbers_drawn);
        Ok(())
    }

    async fn announce(&self, from: Option<RoundStatus>, round: &Round, report: Option<&SettlementReport>) {
        self.audit
            .record(
                AuditEvent::new(AuditAction::RoundStateChange)
                    .round(&round.round_id)
                    .details(json!({
                        "from": from,
                        "to": round.status,
                        "nonce": round.nonce,
                        "serverSeedHash": round.server_seed_hash,
                    })),
            )
            .await;

        self.events.publish(RoundEvent::StateChanged {
            round_id: round.round_id.clone(),
            from,
            to: round.status,
            round: round.view(),
        });

        if round.status == RoundStatus::Drawing {
            self.events.publish(RoundEvent::DrawResult {
                round_id: round.round_id.clone(),
                numbers: round.numbers_drawn.clone(),
                server_seed_hash: round.server_seed_hash.clone(),
            });
        }

        if let Some(report) = report {
            self.events.publish(RoundEvent::Settled {
                round_id: round.round_id.clone(),
                settled: report.settled(),
                credited: report.credited(),
                failed: report.failed(),
                total_paid: report.total_paid(),
            });
        }
    }
}

/// `YYYYMMDD-HHMMSS-XXXX`
fn generate_round_id(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(char::from)
        .collect();
    format!("{}-{}", now.format("%Y%m%d-%H%M%S"), suffix.to_uppercase())
}
