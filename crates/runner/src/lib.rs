//! Meridian Runner - simulation orchestration
//!
//! Wires the runtime pieces together for a replay:
//!
//! - **Config**: JSON runner settings (relay capacities, full-queue policy, log level)
//! - **Logging**: env_logger setup
//! - **Synthetic Feed**: seeded random-walk quotes and trades
//! - **Simulation Provider**: merge on a blocking task, relay to the strategy thread
//!
//! ## Architecture
//!
//! ```text
//!   ┌────────────────┐  ┌────────────────┐
//!   │ SyntheticFeed  │  │ recorded data  │
//!   └───────┬────────┘  └───────┬────────┘
//!           └─────────┬─────────┘
//!                     ▼
//!          ┌─────────────────────┐      ┌──────────────────┐
//!          │  SimulationProvider │ ───► │ ProviderEvent    │ (broadcast)
//!          │  MergeEngine        │      └──────────────────┘
//!          └──────────┬──────────┘
//!                     │ quotes / trades
//!                     ▼
//!          ┌─────────────────────┐
//!          │  Relay              │
//!          └──────────┬──────────┘
//!                     ▼
//!               strategy handler
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod provider;

// Re-export main types
pub use config::{
    ConfigError, FullPolicy, RunnerConfig, load_config, load_config_from_str,
    load_default_config,
};
pub use error::{Result, RunnerError};
pub use feed::{SyntheticFeed, SyntheticFeedConfig};
pub use provider::{ForwardStats, ProviderEvent, SimulationProvider, SimulationReport};
