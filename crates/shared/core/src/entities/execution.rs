use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrderId, Side};
use crate::values::{Price, Quantity};

/// Unique identifier for an execution report
pub type ExecutionId = Uuid;

/// Immutable fill record for one order
///
/// An order applies each execution at most once but cannot detect a
/// replay; the provider side must not deliver the same report twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    pub size: Quantity,
    pub timestamp: DateTime<Utc>,
    /// Venue that reported the fill, when known
    pub exchange: Option<String>,
}

impl Execution {
    /// Create a new execution with explicit timestamp
    pub fn new_with_time(
        order_id: OrderId,
        side: Side,
        price: Price,
        size: Quantity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            side,
            price,
            size,
            timestamp,
            exchange: None,
        }
    }

    /// Create a new execution using current system time
    /// Note: For simulation, prefer `new_with_time` with clock-provided time
    pub fn new(order_id: OrderId, side: Side, price: Price, size: Quantity) -> Self {
        Self::new_with_time(order_id, side, price, size, Utc::now())
    }

    /// Tag the execution with its venue
    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    /// Returns the notional value of the fill (price * size)
    pub fn notional(&self) -> Price {
        self.price * self.size
    }
}
