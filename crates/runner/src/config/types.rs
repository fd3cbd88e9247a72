use meridian_relay::RelayConfig;
use serde::{Deserialize, Serialize};

/// Runner configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub full_policy: FullPolicy,
    /// env_logger filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// What the forwarder does when a relay queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FullPolicy {
    /// Drop the event and count it
    Drop,
    /// Sleep `backoff_us` between attempts, drop after `max_retries`
    Retry { max_retries: u32, backoff_us: u64 },
}

impl Default for FullPolicy {
    fn default() -> Self {
        FullPolicy::Retry {
            max_retries: 1_000,
            backoff_us: 50,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            relay: RelayConfig::default(),
            full_policy: FullPolicy::default(),
            log_level: default_log_level(),
        }
    }
}
