use serde::{Deserialize, Serialize};

use crate::values::{Price, Quantity, Timestamp};

/// A print on the tape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: Timestamp,
    pub price: Price,
    pub size: Quantity,
}

impl Trade {
    pub fn new(timestamp: Timestamp, price: Price, size: Quantity) -> Self {
        Self {
            timestamp,
            price,
            size,
        }
    }

    /// Returns the notional value of the trade (price * size)
    pub fn notional(&self) -> Price {
        self.price * self.size
    }
}
