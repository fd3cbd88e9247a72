//! Simulation Provider integration tests
//!
//! Replays synthetic and recorded sources through the provider and checks
//! what the strategy thread, the side handler and the lifecycle channel see.

use chrono::{DateTime, Duration};
use meridian_clock::SimulationClock;
use meridian_core::{Bar, Datum, DatumKind, Execution, OrderStatus, Quote, Side, Timestamp, Trade};
use meridian_merge::VecSource;
use meridian_order_manager::Order;
use meridian_ports::{Clock, DatumHandler};
use meridian_relay::RelayConfig;
use meridian_runner::{
    FullPolicy, ProviderEvent, RunnerConfig, RunnerError, SimulationProvider, SyntheticFeed,
    SyntheticFeedConfig,
};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn session_open() -> Timestamp {
    DateTime::from_timestamp(1_717_421_400, 0).unwrap()
}

fn feed_config(start: Timestamp, ticks: usize) -> SyntheticFeedConfig {
    SyntheticFeedConfig {
        start,
        ticks,
        tick_interval_ms: 100,
        trade_probability: 0.3,
        ..Default::default()
    }
}

/// Strategy that records every event it is given
#[derive(Default)]
struct Tape {
    seen: Vec<Datum>,
}

impl DatumHandler for Tape {
    fn on_quote(&mut self, quote: &Quote) {
        self.seen.push(Datum::Quote(*quote));
    }

    fn on_trade(&mut self, trade: &Trade) {
        self.seen.push(Datum::Trade(*trade));
    }
}

struct BarCounter {
    count: Arc<AtomicUsize>,
}

impl DatumHandler for BarCounter {
    fn on_bar(&mut self, _bar: &Bar) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

fn minute_bars(start: Timestamp, count: i64) -> Vec<Bar> {
    (0..count)
        .map(|n| {
            Bar::new(
                start + Duration::minutes(n),
                dec!(100),
                dec!(101),
                dec!(99),
                dec!(100.5),
                dec!(12000),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_replay_delivers_merged_stream_to_strategy() {
    let _ = env_logger::try_init();

    let mut provider = SimulationProvider::new(RunnerConfig::default());
    let mut events = provider.subscribe();

    provider
        .add_source(
            "feed-a",
            SyntheticFeed::with_seed(feed_config(session_open(), 300), 1),
        )
        .unwrap();
    provider
        .add_source(
            "feed-b",
            SyntheticFeed::with_seed(
                feed_config(session_open() + Duration::milliseconds(50), 300),
                2,
            ),
        )
        .unwrap();
    provider
        .add_source("bars", VecSource::from_datums(minute_bars(session_open(), 1)))
        .unwrap();

    let bars_seen = Arc::new(AtomicUsize::new(0));
    provider.set_side_handler(BarCounter {
        count: bars_seen.clone(),
    });

    provider.connect();
    assert_eq!(events.recv().await.unwrap(), ProviderEvent::Connected);

    let (strategy, report) = provider.run(Tape::default()).await.unwrap();

    assert!(
        strategy
            .seen
            .windows(2)
            .all(|w| w[0].timestamp() <= w[1].timestamp())
    );
    assert_eq!(strategy.seen.len() as u64, report.consumed.total());
    assert_eq!(report.consumed, report.forward.relayed);
    assert_eq!(report.forward.dropped, 0);
    assert_eq!(
        report.forward.relayed.quotes,
        report.merge.count(DatumKind::Quote)
    );
    assert_eq!(report.forward.relayed.quotes, 600);
    assert_eq!(
        report.forward.relayed.trades,
        report.merge.count(DatumKind::Trade)
    );
    assert_eq!(report.forward.side_dispatched, 1);
    assert_eq!(bars_seen.load(Ordering::SeqCst), 1);
    assert_eq!(report.merge.carriers, 3);
    assert!(report.merge.source_errors.is_empty());
    assert_eq!(
        Some(provider.clock().now()),
        strategy.seen.last().map(Datum::timestamp)
    );

    assert_eq!(
        events.recv().await.unwrap(),
        ProviderEvent::SimulationComplete(report)
    );
}

/// Slow strategy that buys on every trade print, using market time
struct TradeFollower {
    clock: Arc<SimulationClock>,
    orders: Vec<Order>,
    off_market_stamps: usize,
}

impl DatumHandler for TradeFollower {
    fn on_trade(&mut self, trade: &Trade) {
        // let the merge thread run ahead
        std::thread::sleep(std::time::Duration::from_micros(300));
        let mut order = Order::market("SIM", Side::Buy, dec!(100), self.clock.clone());
        if order.created_at() != trade.timestamp {
            self.off_market_stamps += 1;
        }
        order.set_sending_to_provider().unwrap();
        order
            .report_execution(&Execution::new_with_time(
                order.id(),
                Side::Buy,
                trade.price,
                dec!(100),
                trade.timestamp,
            ))
            .unwrap();
        self.orders.push(order);
    }
}

#[tokio::test]
async fn test_orders_created_on_relay_thread_follow_market_time() {
    let _ = env_logger::try_init();

    let mut provider = SimulationProvider::new(RunnerConfig::default());
    provider
        .add_source(
            "feed",
            SyntheticFeed::with_seed(feed_config(session_open(), 200), 11),
        )
        .unwrap();
    provider.connect();

    let strategy = TradeFollower {
        clock: provider.clock(),
        orders: Vec::new(),
        off_market_stamps: 0,
    };
    let (strategy, report) = provider.run(strategy).await.unwrap();

    assert_eq!(strategy.orders.len() as u64, report.consumed.trades);
    assert!(!strategy.orders.is_empty());
    assert_eq!(strategy.off_market_stamps, 0);
    assert!(
        strategy
            .orders
            .iter()
            .all(|o| Some(o.created_at()) == o.submitted_at())
    );
    assert!(
        strategy
            .orders
            .iter()
            .all(|o| o.status() == OrderStatus::Filled)
    );
    // market time, not wall time
    assert!(provider.clock().now() < session_open() + Duration::hours(1));
}

#[tokio::test]
async fn test_run_requires_connection() {
    let _ = env_logger::try_init();

    let mut provider = SimulationProvider::new(RunnerConfig::default());
    let result = provider.run(Tape::default()).await;
    assert!(matches!(result, Err(RunnerError::NotConnected)));
}

#[tokio::test]
async fn test_provider_runs_once() {
    let _ = env_logger::try_init();

    let mut provider = SimulationProvider::new(RunnerConfig::default());
    provider.connect();
    provider.run(Tape::default()).await.unwrap();

    assert!(matches!(
        provider.run(Tape::default()).await,
        Err(RunnerError::AlreadyRan)
    ));
    assert!(matches!(
        provider.add_source("late", VecSource::from_datums(Vec::<Datum>::new())),
        Err(RunnerError::AlreadyRan)
    ));
    assert!(provider.stop_handle().is_none());
}

/// Strategy slow enough to back the relay up
struct Sluggish {
    seen: usize,
}

impl DatumHandler for Sluggish {
    fn on_datum(&mut self, _datum: &Datum) {
        self.seen += 1;
        std::thread::sleep(std::time::Duration::from_micros(200));
    }
}

#[tokio::test]
async fn test_drop_policy_accounts_for_every_event() {
    let _ = env_logger::try_init();

    let config = RunnerConfig {
        relay: RelayConfig::new(1, 1),
        full_policy: FullPolicy::Drop,
        ..Default::default()
    };
    let mut provider = SimulationProvider::new(config);
    provider
        .add_source(
            "feed",
            SyntheticFeed::with_seed(feed_config(session_open(), 400), 5),
        )
        .unwrap();
    provider.connect();

    let (strategy, report) = provider.run(Sluggish { seen: 0 }).await.unwrap();

    let merged = report.merge.count(DatumKind::Quote) + report.merge.count(DatumKind::Trade);
    assert_eq!(
        report.forward.relayed.total() + report.forward.dropped,
        merged
    );
    assert_eq!(strategy.seen as u64, report.consumed.total());
    assert_eq!(report.consumed, report.forward.relayed);
}

#[tokio::test]
async fn test_stop_before_run_replays_nothing() {
    let _ = env_logger::try_init();

    let mut provider = SimulationProvider::new(RunnerConfig::default());
    provider
        .add_source(
            "feed",
            SyntheticFeed::with_seed(feed_config(session_open(), 50), 3),
        )
        .unwrap();
    provider.stop_handle().unwrap().stop();
    provider.connect();

    let (strategy, report) = provider.run(Tape::default()).await.unwrap();
    assert!(strategy.seen.is_empty());
    assert_eq!(report.merge.dispatched, 0);
    assert!(report.merge.stopped_early);
}

#[tokio::test]
async fn test_disconnect_is_published() {
    let _ = env_logger::try_init();

    let mut provider = SimulationProvider::new(RunnerConfig::default());
    let mut events = provider.subscribe();
    provider.connect();
    provider.disconnect();
    provider.disconnect();

    assert_eq!(events.recv().await.unwrap(), ProviderEvent::Connected);
    assert_eq!(events.recv().await.unwrap(), ProviderEvent::Disconnected);
    assert!(events.try_recv().is_err());
    assert!(!provider.is_connected());
}
