use log::LevelFilter;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use super::types::{FullPolicy, RunnerConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid relay settings: {0}")]
    InvalidRelay(#[from] meridian_relay::RelayError),
    #[error("Unknown log level: {0}")]
    InvalidLogLevel(String),
    #[error("Retry backoff must be greater than zero")]
    ZeroBackoff,
}

/// Load runner configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunnerConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Load configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<RunnerConfig, ConfigError> {
    let config: RunnerConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

/// Load the default embedded configuration
pub fn load_default_config() -> Result<RunnerConfig, ConfigError> {
    let default_config = include_str!("runner_config.json");
    load_config_from_str(default_config)
}

impl RunnerConfig {
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.relay.validate()?;
        self.level_filter()?;
        if let FullPolicy::Retry { backoff_us: 0, .. } = self.full_policy {
            return Err(ConfigError::ZeroBackoff);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_relay::RelayConfig;

    #[test]
    fn test_load_default_config() {
        let config = load_default_config().unwrap();
        assert_eq!(config, RunnerConfig::default());
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Info);
    }

    #[test]
    fn test_drop_policy_and_defaults() {
        let config = load_config_from_str(
            r#"{ "relay": { "quote_capacity": 4 }, "full_policy": { "mode": "drop" } }"#,
        )
        .unwrap();
        assert_eq!(config.relay, RelayConfig::new(4, 512));
        assert_eq!(config.full_policy, FullPolicy::Drop);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_rejects_invalid_settings() {
        assert!(matches!(
            load_config_from_str(r#"{ "relay": { "trade_capacity": 0 } }"#),
            Err(ConfigError::InvalidRelay(_))
        ));
        assert!(matches!(
            load_config_from_str(r#"{ "log_level": "chatty" }"#),
            Err(ConfigError::InvalidLogLevel(_))
        ));
        assert!(matches!(
            load_config_from_str(
                r#"{ "full_policy": { "mode": "retry", "max_retries": 3, "backoff_us": 0 } }"#
            ),
            Err(ConfigError::ZeroBackoff)
        ));
        assert!(matches!(
            load_config_from_str("{ not json"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_config("/nonexistent/runner_config.json"),
            Err(ConfigError::IoError(_))
        ));
    }
}
