//! Engine configuration with validation and presets

use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KenoConfig {
    pub scheduler: SchedulerConfig,
    pub fairness: FairnessConfig,
    pub operators: OperatorDefaults,
    pub monitoring: MonitoringConfig,
}

/// Round cadence
///
/// Betting closes on the first tick after the window ends. The tick interval
/// must be shorter than `round_duration_secs - betting_window_secs` for that
/// tick to land before the round ends; with the defaults (10s ticks, 10s
/// rounds) betting stays open for the whole round.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    pub tick_interval_ms: u64,
    pub round_duration_secs: u64,
    /// Bets are accepted for this long after a round opens
    pub betting_window_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10_000,
            round_duration_secs: 10,
            betting_window_secs: 8,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FairnessConfig {
    /// Fixed client seed for every round; random per round when unset
    pub client_seed: Option<String>,
}

/// Limits for operators without explicit configuration, in minor units
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OperatorDefaults {
    pub min_stake: u64,
    pub max_stake: u64,
    /// 0 disables the cap
    pub max_win_per_wager: u64,
    pub currency: String,
}

impl Default for OperatorDefaults {
    fn default() -> Self {
        Self {
            min_stake: 100,
            max_stake: 10_000,
            max_win_per_wager: 1_000_000,
            currency: "USD".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub events_capacity: usize,
    pub stats_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            events_capacity: 1024,
            stats_interval_secs: 30,
        }
    }
}

impl KenoConfig {
    /// Fast rounds for local runs and integration tests
    pub fn testing() -> Self {
        Self {
            scheduler: SchedulerConfig {
                tick_interval_ms: 1_000,
                round_duration_secs: 2,
                betting_window_secs: 1,
            },
            monitoring: MonitoringConfig {
                log_level: "debug".to_string(),
                stats_interval_secs: 5,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn production() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            monitoring: MonitoringConfig {
                log_level: "info".to_string(),
                events_capacity: 4096,
                stats_interval_secs: 60,
            },
            ..Default::default()
        }
    }

    /// Validate configuration for logical consistency
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.scheduler.tick_interval_ms == 0 {
            return Err(invalid("scheduler.tick_interval_ms", "0", "must be > 0"));
        }
        if self.scheduler.round_duration_secs == 0 {
            return Err(invalid("scheduler.round_duration_secs", "0", "must be > 0"));
        }
        if self.scheduler.betting_window_secs == 0 {
            return Err(invalid("scheduler.betting_window_secs", "0", "must be > 0"));
        }
        if self.scheduler.betting_window_secs >= self.scheduler.round_duration_secs {
            return Err(ConfigurationError::LogicalInconsistency(format!(
                "betting window ({}s) must be shorter than the round ({}s)",
                self.scheduler.betting_window_secs, self.scheduler.round_duration_secs
            )));
        }

        if self.operators.min_stake == 0 {
            return Err(invalid("operators.min_stake", "0", "must be > 0"));
        }
        if self.operators.min_stake > self.operators.max_stake {
            return Err(ConfigurationError::LogicalInconsistency(format!(
                "min_stake {} exceeds max_stake {}",
                self.operators.min_stake, self.operators.max_stake
            )));
        }
        if self.operators.currency.trim().is_empty() {
            return Err(invalid("operators.currency", "", "must not be empty"));
        }

        if self.monitoring.events_capacity == 0 {
            return Err(invalid("monitoring.events_capacity", "0", "must be > 0"));
        }
        if self.monitoring.stats_interval_secs == 0 {
            return Err(invalid("monitoring.stats_interval_secs", "0", "must be > 0"));
        }

        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.scheduler.tick_interval_ms)
    }

    pub fn round_duration(&self) -> Duration {
        Duration::from_secs(self.scheduler.round_duration_secs)
    }

    pub fn betting_window(&self) -> Duration {
        Duration::from_secs(self.scheduler.betting_window_secs)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.monitoring.stats_interval_secs)
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
