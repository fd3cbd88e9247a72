//! Merge Engine - one time-ordered stream out of many sources
//!
//! Carriers sit in a min-priority queue keyed by the timestamp of their
//! pending datum, with the registration index breaking ties so the
//! earliest-registered source wins. The run loop pops the earliest carrier,
//! dispatches its datum, then re-seats or retires it.
//!
//! ```text
//!   source A ──► Carrier A ─┐
//!   source B ──► Carrier B ─┼──► queue (ts, id) ──► DatumHandler::on_*
//!   source C ──► Carrier C ─┘
//! ```

use meridian_clock::SimulationClock;
use meridian_core::{DatumKind, Timestamp};
use meridian_ports::{DatumHandler, DatumSource, SourceError};
use priority_queue::DoublePriorityQueue;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::carrier::{Advance, Carrier, CarrierId};
use crate::error::{MergeError, Result};

/// Engine lifecycle, one-way: Init → Running → Stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Running,
    Stopped,
}

impl RunState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => RunState::Init,
            1 => RunState::Running,
            _ => RunState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            RunState::Init => 0,
            RunState::Running => 1,
            RunState::Stopped => 2,
        }
    }
}

/// State shared between the engine and its stop handles
#[derive(Debug)]
struct RunControl {
    state: AtomicU8,
    stop_requested: AtomicBool,
}

impl RunControl {
    fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: RunState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }
}

/// Cross-thread handle to request a stop
///
/// The request is observed by the run loop before its next dispatch; a
/// handler callback already running is never interrupted.
#[derive(Debug, Clone)]
pub struct StopHandle {
    control: Arc<RunControl>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.control.stop_requested.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.control.stop_requested.load(Ordering::Acquire)
    }

    pub fn state(&self) -> RunState {
        self.control.state()
    }
}

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Carriers registered
    pub carriers: usize,
    /// Datums dispatched in total
    pub dispatched: u64,
    /// Datums dispatched per kind
    pub by_kind: HashMap<DatumKind, u64>,
    /// Times a carrier went back into the queue after a dispatch
    pub reseated: u64,
    /// Carriers retired (exhausted or failed)
    pub retired: usize,
    /// Sources that failed, by name, in the order they failed
    pub source_errors: Vec<(String, SourceError)>,
    /// True if a stop request ended the run before every source was drained
    pub stopped_early: bool,
    /// Timestamp of the last datum dispatched
    pub last_timestamp: Option<Timestamp>,
}

impl MergeSummary {
    pub fn count(&self, kind: DatumKind) -> u64 {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }
}

pub struct MergeEngine {
    /// Arena of carriers indexed by `CarrierId`; retired slots are emptied
    carriers: Vec<Option<Carrier>>,
    /// Live carriers keyed by (pending timestamp, registration index)
    queue: DoublePriorityQueue<CarrierId, (Timestamp, CarrierId)>,
    control: Arc<RunControl>,
    clock: Option<Arc<SimulationClock>>,
}

impl MergeEngine {
    pub fn new() -> Self {
        Self {
            carriers: Vec::new(),
            queue: DoublePriorityQueue::new(),
            control: Arc::new(RunControl {
                state: AtomicU8::new(RunState::Init.as_u8()),
                stop_requested: AtomicBool::new(false),
            }),
            clock: None,
        }
    }

    /// Advance this clock to each datum's timestamp before it is dispatched
    pub fn attach_clock(&mut self, clock: Arc<SimulationClock>) {
        self.clock = Some(clock);
    }

    /// Register a source; only legal before the run starts
    pub fn register(
        &mut self,
        name: impl Into<String>,
        source: impl DatumSource + 'static,
    ) -> Result<CarrierId> {
        self.register_boxed(name, Box::new(source))
    }

    pub fn register_boxed(
        &mut self,
        name: impl Into<String>,
        source: Box<dyn DatumSource>,
    ) -> Result<CarrierId> {
        let state = self.state();
        if state != RunState::Init {
            return Err(MergeError::RegistrationClosed(state));
        }
        let id = CarrierId(self.carriers.len());
        let name = name.into();
        log::debug!("Registered {} as {}", name, id);
        self.carriers.push(Some(Carrier::new(id, name, source)));
        Ok(id)
    }

    pub fn state(&self) -> RunState {
        self.control.state()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            control: self.control.clone(),
        }
    }

    /// Request a cooperative stop (see [`StopHandle::stop`])
    pub fn stop(&self) {
        self.control.stop_requested.store(true, Ordering::Release);
    }

    /// Number of carriers still holding a pending datum
    pub fn live_carriers(&self) -> usize {
        self.queue.len()
    }

    /// Run the merge to completion or until stopped
    ///
    /// Every datum goes to the handler callback matching its kind, in
    /// global timestamp order. A failing source is reported through
    /// `on_source_error`, retired, and the run carries on with the rest.
    pub fn run<H: DatumHandler + ?Sized>(&mut self, handler: &mut H) -> Result<MergeSummary> {
        let state = self.state();
        if state != RunState::Init {
            return Err(MergeError::NotRunnable(state));
        }
        self.control.set_state(RunState::Running);

        let mut summary = MergeSummary {
            carriers: self.carriers.len(),
            ..Default::default()
        };
        log::info!("Merge run starting with {} carriers", summary.carriers);

        if !self.is_stop_requested() {
            self.prime(handler, &mut summary);
        }

        loop {
            if self.is_stop_requested() {
                summary.stopped_early = self.carriers.iter().any(Option::is_some);
                break;
            }
            let Some((id, _)) = self.queue.pop_min() else {
                break;
            };
            let Some(carrier) = self.carriers[id.index()].as_mut() else {
                continue;
            };
            let Some(datum) = carrier.take_pending() else {
                continue;
            };

            if let Some(clock) = &self.clock {
                clock.advance_to(datum.timestamp());
            }
            handler.on_datum(&datum);

            summary.dispatched += 1;
            *summary.by_kind.entry(datum.kind()).or_insert(0) += 1;
            summary.last_timestamp = Some(datum.timestamp());

            match carrier.advance() {
                Advance::Pending(ts) => {
                    self.queue.push(id, (ts, id));
                    summary.reseated += 1;
                }
                Advance::Exhausted => self.retire(id, None, handler, &mut summary),
                Advance::Failed(err) => self.retire(id, Some(err), handler, &mut summary),
            }
        }

        self.control.set_state(RunState::Stopped);
        log::info!(
            "Merge run finished: {} datums, {} re-seats, {} carriers retired, {} source errors{}",
            summary.dispatched,
            summary.reseated,
            summary.retired,
            summary.source_errors.len(),
            if summary.stopped_early { " (stopped)" } else { "" }
        );
        Ok(summary)
    }

    fn is_stop_requested(&self) -> bool {
        self.control.stop_requested.load(Ordering::Acquire)
    }

    /// Pull the first datum of every carrier, in registration order
    fn prime<H: DatumHandler + ?Sized>(&mut self, handler: &mut H, summary: &mut MergeSummary) {
        for index in 0..self.carriers.len() {
            let id = CarrierId(index);
            let Some(carrier) = self.carriers[index].as_mut() else {
                continue;
            };
            match carrier.advance() {
                Advance::Pending(ts) => {
                    self.queue.push(id, (ts, id));
                }
                Advance::Exhausted => self.retire(id, None, handler, summary),
                Advance::Failed(err) => self.retire(id, Some(err), handler, summary),
            }
        }
    }

    fn retire<H: DatumHandler + ?Sized>(
        &mut self,
        id: CarrierId,
        error: Option<SourceError>,
        handler: &mut H,
        summary: &mut MergeSummary,
    ) {
        let Some(carrier) = self.carriers[id.index()].take() else {
            return;
        };
        summary.retired += 1;
        match error {
            Some(err) => {
                log::warn!(
                    "[{}] source failed after {} datums, retiring: {}",
                    carrier.name(),
                    carrier.dispatched(),
                    err
                );
                handler.on_source_error(carrier.name(), &err);
                summary.source_errors.push((carrier.name().to_string(), err));
            }
            None => {
                log::debug!(
                    "[{}] exhausted after {} datums",
                    carrier.name(),
                    carrier.dispatched()
                );
            }
        }
    }
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FallibleSource, VecSource};
    use chrono::{TimeZone, Utc};
    use meridian_core::{Datum, Quote, Trade};
    use meridian_ports::Clock;
    use rust_decimal_macros::dec;

    fn at(sec: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, sec).unwrap()
    }

    fn trade(sec: u32) -> Trade {
        Trade::new(at(sec), dec!(100), dec!(1))
    }

    fn quote(sec: u32) -> Quote {
        Quote::new(at(sec), dec!(99), dec!(1), dec!(101), dec!(1))
    }

    #[derive(Default)]
    struct Recorder {
        seen: Vec<Datum>,
        errors: Vec<String>,
    }

    impl DatumHandler for Recorder {
        fn on_datum(&mut self, datum: &Datum) {
            self.seen.push(*datum);
        }

        fn on_source_error(&mut self, source: &str, _error: &SourceError) {
            self.errors.push(source.to_string());
        }
    }

    #[test]
    fn test_interleaves_by_timestamp() {
        let mut engine = MergeEngine::new();
        engine
            .register("a", VecSource::from_datums(vec![trade(1), trade(3), trade(5)]))
            .unwrap();
        engine
            .register("b", VecSource::from_datums(vec![quote(2), quote(4)]))
            .unwrap();

        let mut recorder = Recorder::default();
        let summary = engine.run(&mut recorder).unwrap();

        let seconds: Vec<_> = recorder
            .seen
            .iter()
            .map(|d| d.timestamp() - at(0))
            .map(|d| d.num_seconds())
            .collect();
        assert_eq!(seconds, vec![1, 2, 3, 4, 5]);
        assert_eq!(summary.dispatched, 5);
        assert_eq!(summary.count(DatumKind::Trade), 3);
        assert_eq!(summary.count(DatumKind::Quote), 2);
        assert_eq!(summary.retired, 2);
        // every dispatch either re-seats its carrier or retires it
        assert_eq!(summary.reseated, 3);
        assert_eq!(engine.state(), RunState::Stopped);
    }

    #[test]
    fn test_ties_go_to_earliest_registered() {
        let mut engine = MergeEngine::new();
        engine
            .register("quotes", VecSource::from_datums(vec![quote(1), quote(1)]))
            .unwrap();
        engine
            .register("trades", VecSource::from_datums(vec![trade(1)]))
            .unwrap();

        let mut recorder = Recorder::default();
        let summary = engine.run(&mut recorder).unwrap();
        assert_eq!(summary.reseated, 1);

        let kinds: Vec<_> = recorder.seen.iter().map(Datum::kind).collect();
        assert_eq!(
            kinds,
            vec![DatumKind::Quote, DatumKind::Quote, DatumKind::Trade]
        );
    }

    #[test]
    fn test_failed_source_is_retired_and_run_continues() {
        let mut engine = MergeEngine::new();
        engine
            .register(
                "flaky",
                FallibleSource::new(vec![
                    Ok(Datum::from(trade(1))),
                    Err(SourceError::Read("truncated".into())),
                ]),
            )
            .unwrap();
        engine
            .register("steady", VecSource::from_datums(vec![quote(2), quote(3)]))
            .unwrap();

        let mut recorder = Recorder::default();
        let summary = engine.run(&mut recorder).unwrap();

        assert_eq!(recorder.seen.len(), 3);
        assert_eq!(recorder.errors, vec!["flaky".to_string()]);
        assert_eq!(summary.source_errors.len(), 1);
        assert_eq!(summary.retired, 2);
        assert_eq!(summary.reseated, 1);
    }

    #[test]
    fn test_empty_engine_stops_immediately() {
        let mut engine = MergeEngine::new();
        let summary = engine.run(&mut Recorder::default()).unwrap();
        assert_eq!(summary.dispatched, 0);
        assert!(!summary.stopped_early);
        assert_eq!(engine.state(), RunState::Stopped);
    }

    #[test]
    fn test_cannot_run_twice_or_register_after_run() {
        let mut engine = MergeEngine::new();
        engine.run(&mut Recorder::default()).unwrap();

        assert_eq!(
            engine.run(&mut Recorder::default()),
            Err(MergeError::NotRunnable(RunState::Stopped))
        );
        assert_eq!(
            engine.register("late", VecSource::from_datums(vec![trade(1)])),
            Err(MergeError::RegistrationClosed(RunState::Stopped))
        );
    }

    #[test]
    fn test_stop_before_run_dispatches_nothing() {
        let mut engine = MergeEngine::new();
        engine
            .register("a", VecSource::from_datums(vec![trade(1)]))
            .unwrap();
        engine.stop();

        let mut recorder = Recorder::default();
        let summary = engine.run(&mut recorder).unwrap();
        assert!(recorder.seen.is_empty());
        assert_eq!(summary.dispatched, 0);
        assert!(summary.stopped_early);
        assert_eq!(engine.state(), RunState::Stopped);
    }

    #[test]
    fn test_attached_clock_follows_market_time() {
        let clock = SimulationClock::starting_at(at(0));
        let mut engine = MergeEngine::new();
        engine.attach_clock(clock.clone());
        engine
            .register("a", VecSource::from_datums(vec![trade(7), trade(9)]))
            .unwrap();

        engine.run(&mut Recorder::default()).unwrap();
        assert_eq!(clock.now(), at(9));
    }
}
