//! Meridian Relay
//!
//! Hands quotes and trades produced on one thread to a handler running on
//! a dedicated consumer thread, preserving push order.
//!
//! ```text
//!  producer thread                          consumer thread
//!  ───────────────                          ───────────────
//!  push_quote ─┐                        ┌──► on_quote
//!              ├──► [ Datum │ Datum │ … ] ──┤
//!  push_trade ─┘   bounded, tagged      └──► on_trade
//!        │
//!        └── Full / UnsupportedKind / Disconnected: datum handed back
//! ```
//!
//! Backpressure is per kind: a burst of quotes can fill the quote budget
//! while trades still get through.

pub mod config;
pub mod error;
pub mod relay;

pub use config::RelayConfig;
pub use error::{PushError, RelayError, Result};
pub use relay::{Relay, RelayConsumer, RelayHandle, RelayProducer, RelayStats};
