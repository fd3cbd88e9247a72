//! Relay configuration

use meridian_core::DatumKind;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Per-kind queue depth between producer and consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub quote_capacity: usize,
    pub trade_capacity: usize,
}

impl RelayConfig {
    pub const DEFAULT_CAPACITY: usize = 512;

    pub fn new(quote_capacity: usize, trade_capacity: usize) -> Self {
        Self {
            quote_capacity,
            trade_capacity,
        }
    }

    /// Capacity for a kind, or None if the kind is not relayed
    pub fn capacity(&self, kind: DatumKind) -> Option<usize> {
        match kind {
            DatumKind::Quote => Some(self.quote_capacity),
            DatumKind::Trade => Some(self.trade_capacity),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        if self.quote_capacity == 0 {
            return Err(RelayError::ZeroCapacity(DatumKind::Quote));
        }
        if self.trade_capacity == 0 {
            return Err(RelayError::ZeroCapacity(DatumKind::Trade));
        }
        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY, Self::DEFAULT_CAPACITY)
    }
}
