use serde::{Deserialize, Serialize};

use crate::entities::Side;
use crate::values::{Price, Quantity, Timestamp};

/// Single level-of-book change
///
/// `size == 0` means the level was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDepth {
    pub timestamp: Timestamp,
    pub side: Side,
    /// Zero-based book level (0 = top of book)
    pub level: u32,
    pub price: Price,
    pub size: Quantity,
}

impl MarketDepth {
    pub fn is_removal(&self) -> bool {
        self.size.is_zero()
    }
}
