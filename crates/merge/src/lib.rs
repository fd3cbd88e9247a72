//! Merge Engine
//!
//! Replays any number of market datum sources as a single stream in
//! non-decreasing timestamp order, dispatching each datum to a
//! [`DatumHandler`](meridian_ports::DatumHandler) callback.
//!
//! ```text
//!   ┌─────────────┐   register    ┌─────────────┐   on_quote / on_trade / ...
//!   │ DatumSource │ ────────────► │ MergeEngine │ ─────────────────────────► handler
//!   └─────────────┘               └─────────────┘
//!                                        │ advance_to(ts)
//!                                        ▼
//!                                 SimulationClock (optional)
//! ```

pub mod carrier;
pub mod engine;
pub mod error;
pub mod source;

pub use carrier::CarrierId;
pub use engine::{MergeEngine, MergeSummary, RunState, StopHandle};
pub use error::{MergeError, Result};
pub use source::{FallibleSource, IterSource, VecSource};
