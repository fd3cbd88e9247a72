//! Order Manager errors

use meridian_core::{InstrumentId, OrderId, OrderStatus, Side};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("Order {order_id}: cannot {operation} from status {from:?}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        operation: &'static str,
    },

    #[error("Order id already assigned: current={current}, attempted={attempted}")]
    IdAlreadyAssigned { current: OrderId, attempted: OrderId },

    #[error("Order id {0} is the unassigned sentinel")]
    InvalidOrderId(OrderId),

    #[error("Execution side {execution:?} does not match order side {order:?}")]
    SideMismatch { order: Side, execution: Side },

    #[error("Unknown order: {0}")]
    UnknownOrder(OrderId),

    #[error("Order id {0} is already used by another order in this position")]
    DuplicateOrderId(OrderId),

    #[error("Order for {actual} cannot join position in {expected}")]
    InstrumentMismatch {
        expected: InstrumentId,
        actual: InstrumentId,
    },
}

pub type Result<T> = std::result::Result<T, OrderError>;
