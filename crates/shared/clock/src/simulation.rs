use chrono::{Duration, Utc};
use meridian_core::Timestamp;
use meridian_ports::Clock;
use parking_lot::RwLock;
use std::sync::Arc;

/// Market-time clock for replays
///
/// Time only moves when told to, and never backwards: an attempt to set an
/// earlier time is ignored and logged. Shared behind an `Arc` so the
/// replay loop and the components stamping orders see the same instant.
pub struct SimulationClock {
    current: RwLock<Timestamp>,
}

impl SimulationClock {
    /// Create a clock frozen at the given time
    pub fn starting_at(initial: Timestamp) -> Arc<Self> {
        Arc::new(Self {
            current: RwLock::new(initial),
        })
    }

    /// Create a clock frozen at the current wall time
    pub fn new() -> Arc<Self> {
        Self::starting_at(Utc::now())
    }

    /// Move the clock to `time` if it is not earlier than the current time
    ///
    /// Returns false when the update was ignored.
    pub fn advance_to(&self, time: Timestamp) -> bool {
        let mut current = self.current.write();
        if time < *current {
            log::warn!(
                "SimulationClock: ignoring move backwards from {} to {}",
                *current,
                time
            );
            return false;
        }
        *current = time;
        true
    }

    /// Advance the clock by a fixed duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.write();
        *current += duration;
    }
}

impl Clock for SimulationClock {
    fn now(&self) -> Timestamp {
        *self.current.read()
    }

    fn name(&self) -> &str {
        "SimulationClock"
    }
}
