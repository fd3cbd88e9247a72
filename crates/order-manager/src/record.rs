//! Persistable order snapshot
//!
//! Flat, serde-friendly view of every order attribute. Storage engines
//! and the notification channel both work from this shape; the live
//! [`Order`](crate::Order) keeps its listeners and clock out of it.

use chrono::{DateTime, Utc};
use meridian_core::{
    InstrumentId, OrderId, OrderStatus, OrderType, PositionId, Price, Quantity, Side,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: OrderId,
    pub position_id: Option<PositionId>,
    pub instrument_id: InstrumentId,
    pub description: String,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub side: Side,
    pub price1: Option<Price>,
    pub price2: Option<Price>,
    pub signal_price: Option<Price>,
    pub outside_rth: bool,
    pub quantity_ordered: Quantity,
    pub quantity_remaining: Quantity,
    pub quantity_filled: Quantity,
    pub average_fill_price: Price,
    pub commission: Decimal,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl OrderRecord {
    /// Filled plus remaining equals ordered, with neither side out of range
    ///
    /// False once a booked fill took the order past its quantity. An order
    /// marked OverFilled by a fill that arrived after completion stays
    /// balanced, since that fill is never booked.
    pub fn is_balanced(&self) -> bool {
        self.quantity_remaining >= Decimal::ZERO
            && self.quantity_filled <= self.quantity_ordered
            && self.quantity_filled + self.quantity_remaining == self.quantity_ordered
    }
}
