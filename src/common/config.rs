//! Configuration loading
//!
//! Reads `KenoConfig` from TOML, applies `KENO_*` environment overrides and
//! validates the result.

use crate::config::KenoConfig;
use crate::errors::{ConfigurationError, KenoResult};
use std::env;
use std::path::Path;
use std::str::FromStr;

/// Configuration loader with environment variable support
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> KenoResult<KenoConfig> {
        let mut config = match self.config_path {
            Some(ref path) => self.load_from_file(path)?,
            None => KenoConfig::default(),
        };

        self.apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> KenoResult<KenoConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        Ok(toml::from_str(&content)?)
    }

    fn apply_env_overrides(&self, config: &mut KenoConfig) -> KenoResult<()> {
        if let Some(v) = parse_env("KENO_ROUND_DURATION_SECS")? {
            config.scheduler.round_duration_secs = v;
        }
        if let Some(v) = parse_env("KENO_BETTING_WINDOW_SECS")? {
            config.scheduler.betting_window_secs = v;
        }
        if let Some(v) = parse_env("KENO_TICK_INTERVAL_MS")? {
            config.scheduler.tick_interval_ms = v;
        }
        if let Ok(seed) = env::var("KENO_CLIENT_SEED") {
            config.fairness.client_seed = Some(seed).filter(|s| !s.is_empty());
        }
        if let Ok(level) = env::var("KENO_LOG_LEVEL") {
            config.monitoring.log_level = level;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, config: &KenoConfig, path: &str) -> KenoResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into())
    }
}

fn parse_env<T: FromStr>(name: &str) -> KenoResult<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| {
            ConfigurationError::InvalidValue {
                field: name.to_string(),
                value: raw.clone(),
                reason: "not a valid number".to_string(),
            }
            .into()
        }),
        Err(_) => Ok(None),
    }
}

/// Write a sample configuration file with default values
pub fn generate_sample_config(path: &str) -> KenoResult<()> {
    ConfigLoader::new().save(&KenoConfig::default(), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_save_and_load_config() -> KenoResult<()> {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        let mut original = KenoConfig::testing();
        original.fairness.client_seed = Some("table-7".to_string());

        let loader = ConfigLoader::new();
        loader.save(&original, path)?;

        let loaded = ConfigLoader::new().with_path(path).load_from_file(path)?;
        assert_eq!(loaded, original);

        Ok(())
    }

    #[test]
    fn test_sample_config_round_trips() -> KenoResult<()> {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        generate_sample_config(path)?;
        let content = std::fs::read_to_string(path)?;
        assert!(content.contains("round_duration_secs = 10"));

        let loaded = ConfigLoader::new().load_from_file(path)?;
        assert_eq!(loaded, KenoConfig::default());
        Ok(())
    }

    #[test]
    fn test_missing_file_fails() {
        let result = ConfigLoader::new().with_path("/nonexistent/keno.toml").load();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();
        std::fs::write(path, "[scheduler]\nround_duration_secs = 5\nbetting_window_secs = 5\n").unwrap();

        assert!(ConfigLoader::new().with_path(path).load().is_err());
    }
}
