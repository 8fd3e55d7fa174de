//! Keno round engine binary
//!
//! Runs the round scheduler over in-memory collaborators and logs every round
//! event until Ctrl-C.

use clap::Parser;
use keno_rounds::common::config::{generate_sample_config, ConfigLoader};
use keno_rounds::{KenoEngine, RoundEvent};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "keno-rounds")]
#[command(about = "Keno round lifecycle engine", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Round duration in seconds
    #[arg(long)]
    round_duration: Option<u64>,

    /// Betting window in seconds
    #[arg(long)]
    betting_window: Option<u64>,

    /// Scheduler tick interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Fixed client seed for every round
    #[arg(long)]
    client_seed: Option<String>,

    /// Write a sample configuration file to this path and exit
    #[arg(long)]
    sample_config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(path) = args.sample_config {
        generate_sample_config(&path)?;
        println!("Sample configuration written to {}", path);
        return Ok(());
    }

    let mut loader = ConfigLoader::new();
    if let Some(ref path) = args.config {
        loader = loader.with_path(path);
    }
    let mut config = loader.load()?;
    if let Some(secs) = args.round_duration {
        config.scheduler.round_duration_secs = secs;
    }
    if let Some(secs) = args.betting_window {
        config.scheduler.betting_window_secs = secs;
    }
    if let Some(ms) = args.tick_ms {
        config.scheduler.tick_interval_ms = ms;
    }
    if args.client_seed.is_some() {
        config.fairness.client_seed = args.client_seed;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.monitoring.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let engine = KenoEngine::in_memory(config)?;
    let events = engine.lifecycle.subscribe();
    tokio::spawn(log_events(events));

    let scheduler = engine.scheduler.clone();
    let runner = tokio::spawn(scheduler.clone().start());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    scheduler.stop();
    runner.await??;

    let snapshot = engine.metrics.snapshot();
    tracing::info!(
        "Final stats: {} ticks, {} rounds archived, {} wagers settled, {} failures",
        snapshot.ticks,
        snapshot.rounds_archived,
        snapshot.wagers_settled,
        snapshot.settlement_failures
    );
    Ok(())
}

async fn log_events(mut events: broadcast::Receiver<RoundEvent>) {
    loop {
        match events.recv().await {
            Ok(RoundEvent::StateChanged { round_id, from, to, .. }) => match from {
                Some(from) => tracing::info!("[{}] {} -> {}", round_id, from, to),
                None => tracing::info!("[{}] opened", round_id),
            },
            Ok(RoundEvent::DrawResult { round_id, numbers, .. }) => {
                tracing::info!("[{}] draw {:?}", round_id, numbers)
            }
            Ok(RoundEvent::Settled {
                round_id,
                settled,
                credited,
                failed,
                total_paid,
            }) => tracing::info!(
                "[{}] settled {} wagers, {} credited, {} failed, {} paid",
                round_id,
                settled,
                credited,
                failed,
                total_paid
            ),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Event log lagged; skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
