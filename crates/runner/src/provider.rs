//! Simulation Provider - replays sources through the merge engine and relay
//!
//! ```text
//!                       spawn_blocking                        relay thread
//!  sources ──► MergeEngine ──► Forwarder ──► RelayProducer ═══► MarketTime ──► strategy.on_quote / on_trade
//!                                  │                                │
//!                                  └──► side handler                ▼
//!                                       (bars, greeks, depth)  SimulationClock
//! ```
//!
//! The merge runs ahead of the strategy by up to the relay's capacity, so
//! the market clock is moved on the relay thread, just before each event
//! reaches the strategy. Orders the strategy creates are stamped with the
//! time of the event it is reacting to.
//!
//! Lifecycle events (connected, simulation complete, disconnected) are
//! published on a broadcast channel. The merge only runs while the
//! provider is connected.

use chrono::{DateTime, Utc};
use meridian_clock::SimulationClock;
use meridian_core::{Datum, DatumKind};
use meridian_merge::{MergeEngine, MergeSummary, StopHandle};
use meridian_ports::{DatumHandler, DatumSource};
use meridian_relay::{Relay, RelayProducer, RelayStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::config::{FullPolicy, RunnerConfig};
use crate::error::{Result, RunnerError};

/// Provider lifecycle notifications
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    Connected,
    SimulationComplete(SimulationReport),
    Disconnected,
}

/// What the forwarder did with the merged stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardStats {
    /// Accepted by the relay
    pub relayed: RelayStats,
    /// Quotes and trades given up on because the relay was full or gone
    pub dropped: u64,
    /// Other kinds handed to the side handler
    pub side_dispatched: u64,
    /// Other kinds with no side handler installed
    pub unrouted: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub merge: MergeSummary,
    pub forward: ForwardStats,
    /// Dispatched to the strategy on the relay thread
    pub consumed: RelayStats,
}

/// Merge handler that pushes quotes and trades into the relay
struct Forwarder {
    producer: RelayProducer,
    policy: FullPolicy,
    side: Option<Box<dyn DatumHandler + Send>>,
    stop: StopHandle,
    stats: ForwardStats,
}

impl Forwarder {
    fn forward(&mut self, datum: Datum) {
        let mut pending = datum;
        let mut attempts = 0u32;
        loop {
            let err = match self.producer.push(pending) {
                Ok(()) => return,
                Err(err) => err,
            };
            if !err.is_full() {
                log::error!(
                    "Relay refused {}: {}; stopping merge",
                    err.datum.kind(),
                    err.error
                );
                self.stats.dropped += 1;
                self.stop.stop();
                return;
            }
            match self.policy {
                FullPolicy::Retry {
                    max_retries,
                    backoff_us,
                } if attempts < max_retries => {
                    attempts += 1;
                    pending = err.into_datum();
                    std::thread::sleep(Duration::from_micros(backoff_us));
                }
                _ => {
                    log::warn!(
                        "Relay full, dropping {} at {} after {} retries",
                        err.datum.kind(),
                        err.datum.timestamp(),
                        attempts
                    );
                    self.stats.dropped += 1;
                    return;
                }
            }
        }
    }

    fn finish(self) -> ForwardStats {
        ForwardStats {
            relayed: self.producer.pushed(),
            ..self.stats
        }
    }
}

impl DatumHandler for Forwarder {
    fn on_datum(&mut self, datum: &Datum) {
        match datum.kind() {
            DatumKind::Quote | DatumKind::Trade => self.forward(*datum),
            _ => match self.side.as_mut() {
                Some(side) => {
                    side.on_datum(datum);
                    self.stats.side_dispatched += 1;
                }
                None => self.stats.unrouted += 1,
            },
        }
    }

    fn on_source_error(&mut self, source: &str, error: &meridian_ports::SourceError) {
        if let Some(side) = self.side.as_mut() {
            side.on_source_error(source, error);
        }
    }
}

/// Relay-side wrapper that moves the market clock to each event before
/// the strategy sees it
struct MarketTime<S> {
    clock: Arc<SimulationClock>,
    strategy: S,
}

impl<S: DatumHandler> DatumHandler for MarketTime<S> {
    fn on_datum(&mut self, datum: &Datum) {
        self.clock.advance_to(datum.timestamp());
        self.strategy.on_datum(datum);
    }
}

pub struct SimulationProvider {
    config: RunnerConfig,
    clock: Arc<SimulationClock>,
    /// Taken by `run`; None afterwards
    engine: Option<MergeEngine>,
    side_handler: Option<Box<dyn DatumHandler + Send>>,
    events: broadcast::Sender<ProviderEvent>,
    connected: bool,
}

impl SimulationProvider {
    /// Create a provider whose clock starts at the Unix epoch
    ///
    /// The clock jumps to the first relayed datum's timestamp once the
    /// strategy receives it.
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_clock(config, SimulationClock::starting_at(DateTime::<Utc>::default()))
    }

    pub fn with_clock(config: RunnerConfig, clock: Arc<SimulationClock>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            config,
            clock,
            engine: Some(MergeEngine::new()),
            side_handler: None,
            events,
            connected: false,
        }
    }

    /// Market-time clock, at the last quote or trade handed to the strategy
    pub fn clock(&self) -> Arc<SimulationClock> {
        self.clock.clone()
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn add_source(
        &mut self,
        name: impl Into<String>,
        source: impl DatumSource + 'static,
    ) -> Result<()> {
        let engine = self.engine.as_mut().ok_or(RunnerError::AlreadyRan)?;
        engine.register(name, source)?;
        Ok(())
    }

    /// Receive bars, greeks and depth on the merge thread
    pub fn set_side_handler(&mut self, handler: impl DatumHandler + Send + 'static) {
        self.side_handler = Some(Box::new(handler));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Stop handle for the pending run, if it has not run yet
    pub fn stop_handle(&self) -> Option<StopHandle> {
        self.engine.as_ref().map(MergeEngine::stop_handle)
    }

    fn publish(&self, event: ProviderEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    pub fn connect(&mut self) {
        if self.connected {
            return;
        }
        self.connected = true;
        log::info!("SimulationProvider connected");
        self.publish(ProviderEvent::Connected);
    }

    pub fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        log::info!("SimulationProvider disconnected");
        self.publish(ProviderEvent::Disconnected);
    }

    /// Replay every registered source, feeding quotes and trades to `strategy`
    ///
    /// The merge runs on a blocking task; the strategy runs on the relay's
    /// consumer thread and is handed back once everything has been
    /// dispatched.
    pub async fn run<S>(&mut self, strategy: S) -> Result<(S, SimulationReport)>
    where
        S: DatumHandler + Send + 'static,
    {
        if !self.connected {
            return Err(RunnerError::NotConnected);
        }
        let mut engine = self.engine.take().ok_or(RunnerError::AlreadyRan)?;

        let (producer, consumer) = Relay::bounded(self.config.relay)?;
        let relay = consumer.spawn(MarketTime {
            clock: self.clock.clone(),
            strategy,
        })?;
        let forwarder = Forwarder {
            producer,
            policy: self.config.full_policy,
            side: self.side_handler.take(),
            stop: engine.stop_handle(),
            stats: ForwardStats::default(),
        };

        log::info!("Simulation starting");
        let (merged, forward) = tokio::task::spawn_blocking(move || {
            let mut forwarder = forwarder;
            let merged = engine.run(&mut forwarder);
            (merged, forwarder.finish())
        })
        .await
        .map_err(|e| RunnerError::Task(e.to_string()))?;

        // producer is gone, so the consumer exits once it has caught up
        let joined = tokio::task::spawn_blocking(move || relay.join_with_handler())
            .await
            .map_err(|e| RunnerError::Task(e.to_string()))?;

        let merge = merged?;
        let (MarketTime { strategy, .. }, consumed) = joined?;
        let report = SimulationReport {
            merge,
            forward,
            consumed,
        };

        log::info!(
            "Simulation complete: {} merged, {} relayed, {} dropped, {} to side handler",
            report.merge.dispatched,
            report.forward.relayed.total(),
            report.forward.dropped,
            report.forward.side_dispatched
        );
        self.publish(ProviderEvent::SimulationComplete(report.clone()));
        Ok((strategy, report))
    }
}
