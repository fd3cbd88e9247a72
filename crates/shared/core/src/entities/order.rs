use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider-assigned order identifier
///
/// [`OrderId::NONE`] marks an order the provider has not accepted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl OrderId {
    /// Sentinel for "not assigned"
    pub const NONE: OrderId = OrderId(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Identifier of the position an order belongs to
pub type PositionId = u64;

/// Error codes a provider reports against an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderErrorKind {
    /// Cancel confirmed
    Cancelled,
    /// Order refused
    Rejected,
    /// Provider does not know the instrument
    InstrumentNotFound,
    /// Cancel request refused; the order keeps working
    NotCancellable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_sentinel() {
        assert!(OrderId::default().is_none());
        assert!(!OrderId::new(17).is_none());
        assert_eq!(OrderId::from(17).to_string(), "17");
    }
}
