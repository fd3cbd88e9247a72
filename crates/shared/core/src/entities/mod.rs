mod execution;
mod order;
mod order_status;
mod order_type;
mod side;

pub use execution::{Execution, ExecutionId};
pub use order::{OrderErrorKind, OrderId, PositionId};
pub use order_status::OrderStatus;
pub use order_type::OrderType;
pub use side::Side;
