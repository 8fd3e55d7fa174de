//! Periodic round driver
//!
//! Every tick looks at the round being driven and, from its age, decides
//! whether to close betting or run the rest of the lifecycle and open the
//! next round.

use crate::config::KenoConfig;
use crate::errors::KenoResult;
use crate::games::types::{Round, RoundStatus};
use crate::metrics::EngineMetrics;
use crate::round::lifecycle::RoundLifecycle;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::interval;

/// Round timing
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RoundConfig {
    pub round_duration: Duration,
    pub betting_window: Duration,
    pub tick_interval: Duration,
}

impl From<&KenoConfig> for RoundConfig {
    fn from(config: &KenoConfig) -> Self {
        Self {
            round_duration: config.round_duration(),
            betting_window: config.betting_window(),
            tick_interval: config.tick_interval(),
        }
    }
}

impl RoundConfig {
    /// True when some tick is guaranteed to land between the end of the
    /// betting window and the end of the round
    pub fn enforces_betting_window(&self) -> bool {
        self.tick_interval < self.round_duration.saturating_sub(self.betting_window)
    }
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self::from(&KenoConfig::default())
    }
}

/// What a tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Round still inside its betting window
    Waiting { round_id: String },
    /// Betting closed
    Closed { round_id: String },
    /// Round archived and the next one opened
    Completed { archived: String, opened: String },
    /// Another tick was still running
    Skipped,
}

pub struct RoundScheduler {
    lifecycle: Arc<RoundLifecycle>,
    config: RoundConfig,
    stats_interval: Duration,
    metrics: Arc<EngineMetrics>,
    running: AtomicBool,
    tick_guard: Mutex<()>,
    /// Round being driven; may have left OPEN but not yet reached a terminal state
    current: Mutex<Option<String>>,
    shutdown: Notify,
}

impl RoundScheduler {
    pub fn new(lifecycle: Arc<RoundLifecycle>, config: RoundConfig, metrics: Arc<EngineMetrics>) -> Self {
        Self {
            lifecycle,
            config,
            stats_interval: Duration::from_secs(30),
            metrics,
            running: AtomicBool::new(false),
            tick_guard: Mutex::new(()),
            current: Mutex::new(None),
            shutdown: Notify::new(),
        }
    }

    pub fn with_stats_interval(mut self, stats_interval: Duration) -> Self {
        self.stats_interval = stats_interval;
        self
    }

    pub fn round_config(&self) -> RoundConfig {
        self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Make sure exactly one OPEN round exists
    pub async fn ensure_current_round(&self) -> KenoResult<Round> {
        let round = self.lifecycle.get_or_create_current_round(Utc::now()).await?;
        *self.current.lock().await = Some(round.round_id.clone());
        tracing::info!("Current round: {}", round.round_id);
        Ok(round)
    }

    /// Run until [`stop`](Self::stop) is called
    pub async fn start(self: Arc<Self>) -> KenoResult<()> {
        self.running.store(true, Ordering::SeqCst);
        self.ensure_current_round().await?;

        tracing::info!(
            "Round scheduler started: {}s rounds, {}s betting window, {}ms ticks",
            self.config.round_duration.as_secs(),
            self.config.betting_window.as_secs(),
            self.config.tick_interval.as_millis()
        );

        if !self.config.enforces_betting_window() {
            tracing::warn!(
                "Tick interval {}ms is not shorter than the {}ms between betting close and round end; betting may stay open for whole rounds",
                self.config.tick_interval.as_millis(),
                self.config.round_duration.saturating_sub(self.config.betting_window).as_millis()
            );
        }

        let mut tick_interval = interval(self.config.tick_interval);
        let mut stats_interval = interval(self.stats_interval);
        // The first interval tick fires immediately
        tick_interval.tick().await;
        stats_interval.tick().await;

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    if !self.is_running() {
                        break;
                    }
                    let scheduler = self.clone();
                    // Ticks run detached so an overrunning tick is observed by the guard
                    tokio::spawn(async move {
                        if let Err(e) = scheduler.tick().await {
                            tracing::error!("Round tick failed: {}", e);
                        }
                    });
                }

                _ = stats_interval.tick() => {
                    let snapshot = self.metrics.snapshot();
                    tracing::info!(
                        ticks = snapshot.ticks,
                        tick_failures = snapshot.tick_failures,
                        rounds_archived = snapshot.rounds_archived,
                        wagers_settled = snapshot.wagers_settled,
                        wins_credited = snapshot.wins_credited,
                        settlement_failures = snapshot.settlement_failures,
                        amount_paid = snapshot.amount_paid,
                        "Engine stats"
                    );
                }

                _ = self.shutdown.notified() => break,
            }
        }

        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Round scheduler stopped");
        Ok(())
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.shutdown.notify_one();
    }

    pub async fn tick(&self) -> KenoResult<TickOutcome> {
        self.tick_at(Utc::now()).await
    }

    /// One scheduling step against an explicit clock
    pub async fn tick_at(&self, now: DateTime<Utc>) -> KenoResult<TickOutcome> {
        let Ok(_guard) = self.tick_guard.try_lock() else {
            tracing::debug!("Previous tick still running, skipping");
            self.metrics.record_tick_skipped();
            return Ok(TickOutcome::Skipped);
        };

        self.metrics.record_tick();
        let result = self.step(now).await;
        if result.is_err() {
            self.metrics.record_tick_failure();
        }
        result
    }

    async fn step(&self, now: DateTime<Utc>) -> KenoResult<TickOutcome> {
        let round = self.current_round(now).await?;
        let age = (now - round.open_time).to_std().unwrap_or(Duration::ZERO);

        if age >= self.config.round_duration {
            let archived = self.complete(round).await?;
            let round_duration = chrono::Duration::from_std(self.config.round_duration)
                .unwrap_or_else(|_| chrono::Duration::zero());
            let next = self
                .lifecycle
                .get_or_create_round_at(now + round_duration, now)
                .await?;
            *self.current.lock().await = Some(next.round_id.clone());
            tracing::info!("New round created: {}", next.round_id);
            return Ok(TickOutcome::Completed {
                archived: archived.round_id,
                opened: next.round_id,
            });
        }

        if age >= self.config.betting_window && round.status == RoundStatus::Open {
            let closed = self.lifecycle.transition(&round, RoundStatus::Closing).await?;
            tracing::info!("Round {} entered CLOSING phase", closed.round_id);
            return Ok(TickOutcome::Closed {
                round_id: closed.round_id,
            });
        }

        Ok(TickOutcome::Waiting {
            round_id: round.round_id,
        })
    }

    /// The round being driven, or the OPEN round when that one has finished
    async fn current_round(&self, now: DateTime<Utc>) -> KenoResult<Round> {
        let mut current = self.current.lock().await;
        if let Some(round_id) = current.as_deref() {
            let round = self.lifecycle.load_round(round_id).await?;
            if !RoundLifecycle::is_terminal(round.status) {
                return Ok(round);
            }
        }

        let round = self.lifecycle.get_or_create_current_round(now).await?;
        *current = Some(round.round_id.clone());
        Ok(round)
    }

    /// Walk the remaining happy-path transitions up to ARCHIVED
    async fn complete(&self, mut round: Round) -> KenoResult<Round> {
        while let Some(next) = RoundLifecycle::next_state(round.status) {
            round = self.lifecycle.transition(&round, next).await?;
            tracing::info!("Round {} entered {} phase", round.round_id, next);
        }
        Ok(round)
    }
}
