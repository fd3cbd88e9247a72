use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::values::Timestamp;

/// Option sensitivities as published by a calculation source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greek {
    pub timestamp: Timestamp,
    pub implied_volatility: Decimal,
    pub delta: Decimal,
    pub gamma: Decimal,
    pub theta: Decimal,
    pub vega: Decimal,
}
