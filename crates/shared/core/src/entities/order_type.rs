use serde::{Deserialize, Serialize};

/// Order types accepted by execution providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Execute at current market price
    Market,
    /// Execute at price1 or better
    Limit,
    /// Market order triggered when price reaches price1
    Stop,
    /// Limit order at price2 triggered when price reaches price1
    StopLimit,
    /// Stop that follows the market by the offset in price1
    Trail,
}

impl OrderType {
    /// Number of price fields the type needs (price1, price2)
    pub fn price_fields(&self) -> usize {
        match self {
            OrderType::Market => 0,
            OrderType::Limit | OrderType::Stop | OrderType::Trail => 1,
            OrderType::StopLimit => 2,
        }
    }
}
