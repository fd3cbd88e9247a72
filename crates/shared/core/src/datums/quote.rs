use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::values::{Price, Quantity, Timestamp};

/// Top-of-book quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub timestamp: Timestamp,
    pub bid: Price,
    pub bid_size: Quantity,
    pub ask: Price,
    pub ask_size: Quantity,
}

impl Quote {
    pub fn new(
        timestamp: Timestamp,
        bid: Price,
        bid_size: Quantity,
        ask: Price,
        ask_size: Quantity,
    ) -> Self {
        Self {
            timestamp,
            bid,
            bid_size,
            ask,
            ask_size,
        }
    }

    /// Midpoint between bid and ask
    pub fn mid(&self) -> Price {
        (self.bid + self.ask) / Decimal::TWO
    }

    pub fn spread(&self) -> Price {
        self.ask - self.bid
    }

    /// Both sides priced and not crossed
    pub fn is_valid(&self) -> bool {
        self.bid > Decimal::ZERO && self.ask > Decimal::ZERO && self.ask >= self.bid
    }
}
