//! Runner errors

use meridian_merge::MergeError;
use meridian_relay::RelayError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("Provider is not connected")]
    NotConnected,

    #[error("Simulation has already run; build a new provider to run again")]
    AlreadyRan,

    #[error("Simulation task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
