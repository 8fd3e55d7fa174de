use crate::common::traits::OperatorDirectory;
use crate::config::OperatorDefaults;
use crate::errors::KenoResult;
use crate::games::types::{Amount, OperatorLimits};
use async_trait::async_trait;
use dashmap::DashMap;

/// Operator limits from configuration, with per-operator overrides.
/// Unknown operators get the configured defaults.
pub struct StaticOperatorDirectory {
    defaults: OperatorLimits,
    overrides: DashMap<String, OperatorLimits>,
}

impl StaticOperatorDirectory {
    pub fn new(defaults: OperatorLimits) -> Self {
        Self {
            defaults,
            overrides: DashMap::new(),
        }
    }

    pub fn from_config(config: &OperatorDefaults) -> Self {
        Self::new(OperatorLimits {
            min_stake: Amount(config.min_stake),
            max_stake: Amount(config.max_stake),
            max_win_per_wager: Amount(config.max_win_per_wager),
            enabled: true,
        })
    }

    pub fn set_limits(&self, operator_id: &str, limits: OperatorLimits) {
        self.overrides.insert(operator_id.to_string(), limits);
    }

    pub fn set_enabled(&self, operator_id: &str, enabled: bool) {
        self.overrides
            .entry(operator_id.to_string())
            .or_insert_with(|| self.defaults.clone())
            .enabled = enabled;
    }

    fn limits_for(&self, operator_id: &str) -> OperatorLimits {
        self.overrides
            .get(operator_id)
            .map(|l| l.value().clone())
            .unwrap_or_else(|| self.defaults.clone())
    }
}

#[async_trait]
impl OperatorDirectory for StaticOperatorDirectory {
    async fn get_limits(&self, operator_id: &str) -> KenoResult<OperatorLimits> {
        Ok(self.limits_for(operator_id))
    }

    async fn is_enabled(&self, operator_id: &str) -> KenoResult<bool> {
        Ok(self.limits_for(operator_id).enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults_and_overrides() {
        let directory = StaticOperatorDirectory::from_config(&OperatorDefaults::default());
        let limits = directory.get_limits("any").await.unwrap();
        assert_eq!(limits.min_stake, Amount::units(1));
        assert_eq!(limits.max_stake, Amount::units(100));
        assert_eq!(limits.max_win_per_wager, Amount::units(10_000));

        directory.set_enabled("blocked", false);
        assert!(!directory.is_enabled("blocked").await.unwrap());
        assert!(directory.is_enabled("any").await.unwrap());
        assert_eq!(directory.get_limits("blocked").await.unwrap().max_stake, Amount::units(100));
    }
}
