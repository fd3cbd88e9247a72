//! Producer, consumer and handle for the cross-thread relay
//!
//! Quotes and trades travel as tagged [`Datum`]s on a single bounded
//! crossbeam channel, so the consumer sees them in exactly the order they
//! were pushed. Per-kind capacity is enforced with in-flight counters
//! shared by both ends: the producer reserves a slot before sending, the
//! consumer releases it when it takes the datum off the channel.
//!
//! On stop the consumer closes the relay, then keeps receiving until no
//! slot is reserved. A push either sees the relay closed and fails with
//! [`RelayError::Disconnected`], or its reservation is seen by the
//! consumer and the datum is dispatched.

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded, select};
use meridian_core::{Datum, DatumKind, Quote, Trade};
use meridian_ports::DatumHandler;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use crate::config::RelayConfig;
use crate::error::{PushError, RelayError, Result};

/// Counts of relayed events by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub quotes: u64,
    pub trades: u64,
}

impl RelayStats {
    pub fn total(&self) -> u64 {
        self.quotes + self.trades
    }

    fn record(&mut self, kind: DatumKind) {
        match kind {
            DatumKind::Quote => self.quotes += 1,
            DatumKind::Trade => self.trades += 1,
            _ => {}
        }
    }
}

/// In-flight slots per kind
#[derive(Debug)]
struct Slots {
    config: RelayConfig,
    quotes: AtomicUsize,
    trades: AtomicUsize,
    /// Set by the consumer when it stops taking events
    closed: AtomicBool,
}

impl Slots {
    fn counter(&self, kind: DatumKind) -> Option<(&AtomicUsize, usize)> {
        match kind {
            DatumKind::Quote => Some((&self.quotes, self.config.quote_capacity)),
            DatumKind::Trade => Some((&self.trades, self.config.trade_capacity)),
            _ => None,
        }
    }

    fn release(&self, kind: DatumKind) {
        if let Some((counter, _)) = self.counter(kind) {
            counter.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn reserved(&self) -> usize {
        self.quotes.load(Ordering::SeqCst) + self.trades.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct Relay;

impl Relay {
    /// Create a connected producer/consumer pair
    pub fn bounded(config: RelayConfig) -> Result<(RelayProducer, RelayConsumer)> {
        config.validate()?;
        let (tx, rx) = bounded(config.quote_capacity + config.trade_capacity);
        let slots = Arc::new(Slots {
            config,
            quotes: AtomicUsize::new(0),
            trades: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        });
        log::debug!(
            "Relay created: quote capacity {}, trade capacity {}",
            config.quote_capacity,
            config.trade_capacity
        );
        Ok((
            RelayProducer {
                tx,
                slots: slots.clone(),
                pushed: RelayStats::default(),
                rejected: 0,
            },
            RelayConsumer { rx, slots },
        ))
    }
}

/// Sending side; single producer, movable to another thread
///
/// Pushes never block: when a kind's queue is full the datum comes back
/// in the [`PushError`] and the caller decides whether to retry or drop.
pub struct RelayProducer {
    tx: Sender<Datum>,
    slots: Arc<Slots>,
    pushed: RelayStats,
    rejected: u64,
}

impl RelayProducer {
    pub fn push(&mut self, datum: Datum) -> std::result::Result<(), PushError> {
        let kind = datum.kind();
        let Some((counter, capacity)) = self.slots.counter(kind) else {
            self.rejected += 1;
            return Err(PushError {
                datum,
                error: RelayError::UnsupportedKind(kind),
            });
        };

        if counter.fetch_add(1, Ordering::SeqCst) >= capacity {
            counter.fetch_sub(1, Ordering::SeqCst);
            self.rejected += 1;
            return Err(PushError {
                datum,
                error: RelayError::Full { kind, capacity },
            });
        }

        // checked after reserving, so a stopping consumer waits for this slot
        if self.slots.is_closed() {
            counter.fetch_sub(1, Ordering::SeqCst);
            self.rejected += 1;
            return Err(PushError {
                datum,
                error: RelayError::Disconnected,
            });
        }

        match self.tx.try_send(datum) {
            Ok(()) => {
                self.pushed.record(kind);
                Ok(())
            }
            Err(TrySendError::Full(datum)) => {
                counter.fetch_sub(1, Ordering::SeqCst);
                self.rejected += 1;
                Err(PushError {
                    datum,
                    error: RelayError::Full { kind, capacity },
                })
            }
            Err(TrySendError::Disconnected(datum)) => {
                counter.fetch_sub(1, Ordering::SeqCst);
                self.rejected += 1;
                Err(PushError {
                    datum,
                    error: RelayError::Disconnected,
                })
            }
        }
    }

    pub fn push_quote(&mut self, quote: Quote) -> std::result::Result<(), PushError> {
        self.push(Datum::Quote(quote))
    }

    pub fn push_trade(&mut self, trade: Trade) -> std::result::Result<(), PushError> {
        self.push(Datum::Trade(trade))
    }

    /// Events of this kind pushed but not yet taken by the consumer
    pub fn in_flight(&self, kind: DatumKind) -> usize {
        self.slots
            .counter(kind)
            .map(|(counter, _)| counter.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Successful pushes so far
    pub fn pushed(&self) -> RelayStats {
        self.pushed
    }

    /// Refused pushes so far, any reason
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

/// Receiving side
pub struct RelayConsumer {
    rx: Receiver<Datum>,
    slots: Arc<Slots>,
}

impl RelayConsumer {
    /// Dispatch everything currently queued on the calling thread
    ///
    /// Returns the number of events dispatched.
    pub fn drain<H: DatumHandler + ?Sized>(&self, handler: &mut H) -> usize {
        let mut count = 0;
        while let Ok(datum) = self.rx.try_recv() {
            self.dispatch(&datum, handler);
            count += 1;
        }
        count
    }

    /// Events waiting in the channel
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    fn dispatch<H: DatumHandler + ?Sized>(&self, datum: &Datum, handler: &mut H) {
        self.slots.release(datum.kind());
        handler.on_datum(datum);
    }

    /// Move the consumer onto a dedicated thread that dispatches to `handler`
    ///
    /// The thread blocks until an event or a stop signal arrives. It exits
    /// after [`RelayHandle::stop`], once everything already queued has been
    /// dispatched, or when the producer is dropped and the queue is empty.
    pub fn spawn<H>(self, handler: H) -> Result<RelayHandle<H>>
    where
        H: DatumHandler + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let thread = thread::Builder::new()
            .name("meridian-relay".to_string())
            .spawn(move || {
                let mut handler = handler;
                let stats = self.consume(&stop_rx, &mut handler);
                (handler, stats)
            })
            .map_err(|e| RelayError::Spawn(e.to_string()))?;
        log::debug!("Relay consumer thread started");
        Ok(RelayHandle { thread, stop_tx })
    }

    /// Dispatch until every reserved slot has been released
    ///
    /// Only called once the relay is closed, so the reservation count can
    /// only go down.
    fn drain_reserved<H: DatumHandler>(&self, handler: &mut H, stats: &mut RelayStats) {
        while self.slots.reserved() > 0 {
            match self.rx.try_recv() {
                Ok(datum) => {
                    self.dispatch(&datum, handler);
                    stats.record(datum.kind());
                }
                Err(TryRecvError::Empty) => thread::yield_now(),
                Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn consume<H: DatumHandler>(&self, stop_rx: &Receiver<()>, handler: &mut H) -> RelayStats {
        let mut stats = RelayStats::default();
        loop {
            select! {
                recv(self.rx) -> msg => match msg {
                    Ok(datum) => {
                        self.dispatch(&datum, handler);
                        stats.record(datum.kind());
                    }
                    Err(_) => {
                        log::debug!("Relay producer dropped, consumer exiting");
                        break;
                    }
                },
                recv(stop_rx) -> _ => {
                    self.slots.close();
                    self.drain_reserved(handler, &mut stats);
                    log::debug!("Relay consumer stopped");
                    break;
                }
            }
        }
        log::info!(
            "Relay consumer finished: {} quotes, {} trades",
            stats.quotes,
            stats.trades
        );
        stats
    }
}

/// Control handle for a spawned consumer
///
/// Dropping the handle without joining also stops the consumer.
pub struct RelayHandle<H> {
    thread: JoinHandle<(H, RelayStats)>,
    stop_tx: Sender<()>,
}

impl<H> RelayHandle<H> {
    /// Ask the consumer to finish what is queued and exit
    ///
    /// Pushes that land after the relay closes fail with
    /// [`RelayError::Disconnected`] and hand the datum back.
    pub fn stop(&self) {
        let _ = self.stop_tx.try_send(());
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the consumer to exit
    ///
    /// Blocks until [`stop`](Self::stop) has been called or the producer
    /// has been dropped.
    pub fn join(self) -> Result<RelayStats> {
        self.join_with_handler().map(|(_, stats)| stats)
    }

    /// Wait for the consumer and take the handler back
    pub fn join_with_handler(self) -> Result<(H, RelayStats)> {
        let RelayHandle { thread, stop_tx } = self;
        let result = thread.join().map_err(|_| RelayError::ConsumerPanicked);
        drop(stop_tx);
        result
    }
}
