//! Relay errors

use meridian_core::{Datum, DatumKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("{kind} queue full (capacity {capacity})")]
    Full { kind: DatumKind, capacity: usize },

    #[error("{0} events are not relayed")]
    UnsupportedKind(DatumKind),

    #[error("Relay consumer disconnected")]
    Disconnected,

    #[error("{0} capacity must be greater than zero")]
    ZeroCapacity(DatumKind),

    #[error("Failed to spawn consumer thread: {0}")]
    Spawn(String),

    #[error("Consumer thread panicked")]
    ConsumerPanicked,
}

pub type Result<T> = std::result::Result<T, RelayError>;

/// A push that was refused, carrying the datum back to the caller
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct PushError {
    pub datum: Datum,
    pub error: RelayError,
}

impl PushError {
    pub fn is_full(&self) -> bool {
        matches!(self.error, RelayError::Full { .. })
    }

    pub fn into_datum(self) -> Datum {
        self.datum
    }
}
