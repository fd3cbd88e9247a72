//! Meridian Order Manager
//!
//! Tracks orders from creation to a terminal status and keeps their fill
//! accounting straight when the provider misbehaves:
//! - **Lifecycle**: Created → SendingToProvider → Submitted → Filling → Filled
//! - **Fill accounting**: filled + remaining == requested, volume-weighted
//!   average fill price
//! - **Anomalies**: overfills and fills racing a cancel are recorded as
//!   statuses, never dropped
//! - **Notifications**: per-order listeners, optionally drained through a
//!   channel
//! - **Positions**: orders grouped per instrument, provider callbacks
//!   routed by order id, net holding and PnL
//!
//! ## Architecture
//!
//! ```text
//! Strategy ──► Order::new ──► Position::add_order
//!                                   │
//! Provider ── Execution ──────────► Position::report_execution ──► Order::report_execution
//!          ── error code ─────────► Position::act_on_error              │
//!          ── commission ─────────► Position::set_commission            ▼
//!                                                              OrderListener callbacks
//!                                                                       │
//!                                                              ChannelListener ──► Receiver<OrderEvent>
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use meridian_order_manager::{Order, Position};
//!
//! let mut position = Position::new(1, "SPY");
//! let key = position.add_order(Order::limit("SPY", Side::Buy, dec!(10), dec!(500), clock))?;
//! position.order_mut(key).unwrap().set_sending_to_provider()?;
//! position.set_order_id(key, OrderId(1001))?;
//!
//! // later, from the provider
//! position.report_execution(&execution)?;
//! ```

pub mod error;
pub mod events;
pub mod order;
pub mod position;
pub mod record;

pub use error::{OrderError, Result};
pub use events::{ChannelListener, ListenerId, OrderEvent, OrderListener};
pub use order::Order;
pub use position::{Holding, OrderKey, Position};
pub use record::OrderRecord;
