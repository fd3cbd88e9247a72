//! Carrier - one source of datums seen by the merge engine
//!
//! A carrier pulls lazily from its source and holds at most one pending
//! datum, the next one not yet dispatched.

use meridian_core::{Datum, Timestamp};
use meridian_ports::{DatumSource, SourceError};
use std::fmt;

/// Stable handle of a registered carrier (its registration index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CarrierId(pub(crate) usize);

impl CarrierId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for CarrierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "carrier-{}", self.0)
    }
}

/// Outcome of pulling the next datum from a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// A datum is pending with this timestamp
    Pending(Timestamp),
    /// The source has no more items
    Exhausted,
    /// The source failed; it will not be pulled again
    Failed(SourceError),
}

pub struct Carrier {
    id: CarrierId,
    name: String,
    source: Box<dyn DatumSource>,
    pending: Option<Datum>,
    last_dispatched: Option<Timestamp>,
    dispatched: u64,
    finished: bool,
}

impl Carrier {
    pub(crate) fn new(id: CarrierId, name: String, source: Box<dyn DatumSource>) -> Self {
        Self {
            id,
            name,
            source,
            pending: None,
            last_dispatched: None,
            dispatched: 0,
            finished: false,
        }
    }

    pub fn id(&self) -> CarrierId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of datums handed out so far
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Timestamp of the pending datum, if any
    pub fn peek_timestamp(&self) -> Option<Timestamp> {
        self.pending.as_ref().map(Datum::timestamp)
    }

    /// Make sure a datum is pending, pulling from the source if needed
    pub fn advance(&mut self) -> Advance {
        if let Some(ts) = self.peek_timestamp() {
            return Advance::Pending(ts);
        }
        if self.finished {
            return Advance::Exhausted;
        }

        match self.source.next_datum() {
            Some(Ok(datum)) => {
                let ts = datum.timestamp();
                if let Some(last) = self.last_dispatched {
                    if ts < last {
                        log::warn!(
                            "[{}] source went back in time: {} after {}",
                            self.name,
                            ts,
                            last
                        );
                    }
                }
                self.pending = Some(datum);
                Advance::Pending(ts)
            }
            Some(Err(err)) => {
                self.finished = true;
                Advance::Failed(err)
            }
            None => {
                self.finished = true;
                Advance::Exhausted
            }
        }
    }

    /// Hand out the pending datum
    pub fn take_pending(&mut self) -> Option<Datum> {
        let datum = self.pending.take()?;
        self.last_dispatched = Some(datum.timestamp());
        self.dispatched += 1;
        Some(datum)
    }
}

impl fmt::Debug for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Carrier")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("pending", &self.pending)
            .field("dispatched", &self.dispatched)
            .field("finished", &self.finished)
            .finish()
    }
}
