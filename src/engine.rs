//! Engine wiring
//!
//! Builds the lifecycle, scheduler and admission gate over one shared set of
//! collaborators.

use crate::audit::TracingAuditSink;
use crate::common::traits::AuditSink;
use crate::config::KenoConfig;
use crate::errors::KenoResult;
use crate::events::RoundEvents;
use crate::games::{admission::WagerAdmission, settlement::SettlementPipeline};
use crate::ledger::MemoryLedger;
use crate::metrics::EngineMetrics;
use crate::operators::StaticOperatorDirectory;
use crate::round::{BettingGate, RoundConfig, RoundLifecycle, RoundScheduler};
use crate::storage::{MemoryRoundStore, MemoryWagerStore};
use std::sync::Arc;

/// A fully wired engine over the in-memory collaborators
pub struct KenoEngine {
    pub config: KenoConfig,
    pub rounds: Arc<MemoryRoundStore>,
    pub wagers: Arc<MemoryWagerStore>,
    pub ledger: Arc<MemoryLedger>,
    pub operators: Arc<StaticOperatorDirectory>,
    pub metrics: Arc<EngineMetrics>,
    pub lifecycle: Arc<RoundLifecycle>,
    pub scheduler: Arc<RoundScheduler>,
    pub admission: Arc<WagerAdmission>,
}

impl KenoEngine {
    /// Validate the config and build an engine that audits through `tracing`
    pub fn in_memory(config: KenoConfig) -> KenoResult<Self> {
        Self::in_memory_with_audit(config, Arc::new(TracingAuditSink))
    }

    pub fn in_memory_with_audit(config: KenoConfig, audit: Arc<dyn AuditSink>) -> KenoResult<Self> {
        config.validate()?;

        let rounds = Arc::new(MemoryRoundStore::new());
        let wagers = Arc::new(MemoryWagerStore::new());
        let ledger = Arc::new(MemoryLedger::new());
        let operators = Arc::new(StaticOperatorDirectory::from_config(&config.operators));
        let metrics = Arc::new(EngineMetrics::new());
        let events = RoundEvents::new(config.monitoring.events_capacity);
        let gate = BettingGate::new();

        let settlement = SettlementPipeline::new(
            rounds.clone(),
            wagers.clone(),
            operators.clone(),
            ledger.clone(),
            audit.clone(),
        );
        let lifecycle = Arc::new(
            RoundLifecycle::new(rounds.clone(), settlement, audit.clone(), events, metrics.clone())
                .with_client_seed(config.fairness.client_seed.clone())
                .with_betting_gate(gate.clone()),
        );
        let scheduler = Arc::new(
            RoundScheduler::new(lifecycle.clone(), RoundConfig::from(&config), metrics.clone())
                .with_stats_interval(config.stats_interval()),
        );
        let admission = Arc::new(
            WagerAdmission::new(
                rounds.clone(),
                wagers.clone(),
                operators.clone(),
                ledger.clone(),
                audit,
                metrics.clone(),
            )
            .with_betting_gate(gate),
        );

        tracing::info!(
            "Keno engine ready: {}s rounds, {}s betting window, {} default currency",
            config.scheduler.round_duration_secs,
            config.scheduler.betting_window_secs,
            config.operators.currency
        );

        Ok(Self {
            config,
            rounds,
            wagers,
            ledger,
            operators,
            metrics,
            lifecycle,
            scheduler,
            admission,
        })
    }
}
