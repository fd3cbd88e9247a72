//! Meridian Clock Infrastructure
//!
//! [`SimulationClock`] is the market-time source behind the [`Clock`] port.
//! Whoever replays history moves it forward; the merge engine advances it
//! to each datum it dispatches, and the simulation runner to each datum
//! it hands the strategy.
//!
//! ## Usage
//!
//! ```ignore
//! use meridian_clock::{Clock, SimulationClock};
//!
//! let clock = SimulationClock::starting_at(first_timestamp);
//! engine.attach_clock(clock.clone());
//! // orders created inside handlers now carry market timestamps
//! assert_eq!(clock.now(), last_dispatched_timestamp);
//! ```

mod simulation;

pub use simulation::SimulationClock;

// Re-export the Clock trait for convenience
pub use meridian_ports::Clock;
