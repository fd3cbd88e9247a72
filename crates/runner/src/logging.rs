//! Logger setup for binaries and demos
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies.
//! Safe to call more than once: later calls are no-ops.

use crate::config::RunnerConfig;

/// Install env_logger with `level` as the default filter
///
/// Returns false if a logger was already installed.
pub fn init(level: &str) -> bool {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init()
        .is_ok()
}

pub fn init_from_config(config: &RunnerConfig) -> bool {
    init(&config.log_level)
}
