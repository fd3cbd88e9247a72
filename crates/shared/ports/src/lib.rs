//! Meridian Ports
//!
//! Port definitions (traits) for the Meridian trading runtime.
//! These define the boundaries between the runtime core and the market
//! data sources, strategy code and time sources around it.

mod clock;
mod error;
mod handler;
mod source;

pub use clock::Clock;
pub use error::{SourceError, SourceResult};
pub use handler::DatumHandler;
pub use source::DatumSource;
