//! Meridian Core Domain
//!
//! Pure domain types for the Meridian trading runtime.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod datums;
pub mod entities;
pub mod instruments;
pub mod values;

// Re-export commonly used types at crate root
pub use datums::{Bar, Datum, DatumKind, Greek, MarketDepth, Quote, Trade};
pub use entities::{
    Execution, ExecutionId, OrderErrorKind, OrderId, OrderStatus, OrderType, PositionId, Side,
};
pub use instruments::InstrumentId;
pub use values::{Price, Quantity, Symbol, Timestamp};
