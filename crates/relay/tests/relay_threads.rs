use chrono::{Duration, TimeZone, Utc};
use meridian_core::{Bar, Datum, DatumKind, Quote, Timestamp, Trade};
use meridian_ports::DatumHandler;
use meridian_relay::{Relay, RelayConfig, RelayError};
use rust_decimal_macros::dec;
use std::thread;

fn at(n: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 2, 5, 15, 0, 0).unwrap() + Duration::microseconds(n)
}

fn quote(n: i64) -> Quote {
    Quote::new(at(n), dec!(10.00), dec!(100), dec!(10.01), dec!(200))
}

fn trade(n: i64) -> Trade {
    Trade::new(at(n), dec!(10.005), dec!(50))
}

#[derive(Default)]
struct Recorder {
    seen: Vec<Datum>,
}

impl DatumHandler for Recorder {
    fn on_quote(&mut self, quote: &Quote) {
        self.seen.push(Datum::Quote(*quote));
    }

    fn on_trade(&mut self, trade: &Trade) {
        self.seen.push(Datum::Trade(*trade));
    }
}

#[test]
fn test_consumer_sees_push_order_across_threads() {
    let _ = env_logger::try_init();
    let (mut producer, consumer) = Relay::bounded(RelayConfig::new(8, 8)).unwrap();
    let handle = consumer.spawn(Recorder::default()).unwrap();

    let expected: Vec<Datum> = (0..2_000)
        .map(|n| {
            if n % 3 == 0 {
                Datum::Trade(trade(n))
            } else {
                Datum::Quote(quote(n))
            }
        })
        .collect();

    let to_push = expected.clone();
    let pusher = thread::spawn(move || {
        for datum in to_push {
            let mut pending = datum;
            // spin on backpressure; the consumer is draining concurrently
            while let Err(err) = producer.push(pending) {
                assert!(err.is_full(), "unexpected push error: {err}");
                pending = err.into_datum();
                thread::yield_now();
            }
        }
        producer.pushed()
        // producer dropped here, which ends the consumer
    });

    let pushed = pusher.join().unwrap();
    let (recorder, stats) = handle.join_with_handler().unwrap();

    assert_eq!(recorder.seen, expected);
    assert_eq!(stats, pushed);
    assert_eq!(stats.trades, 667);
    assert_eq!(stats.quotes, 1_333);
}

#[test]
fn test_full_quote_queue_does_not_block_trades() {
    let _ = env_logger::try_init();
    let (mut producer, consumer) = Relay::bounded(RelayConfig::new(2, 2)).unwrap();

    producer.push_quote(quote(1)).unwrap();
    producer.push_quote(quote(2)).unwrap();

    let err = producer.push_quote(quote(3)).unwrap_err();
    assert_eq!(
        err.error,
        RelayError::Full {
            kind: DatumKind::Quote,
            capacity: 2
        }
    );
    assert_eq!(err.into_datum(), Datum::Quote(quote(3)));

    producer.push_trade(trade(4)).unwrap();
    assert_eq!(producer.in_flight(DatumKind::Quote), 2);
    assert_eq!(producer.in_flight(DatumKind::Trade), 1);
    assert_eq!(producer.rejected(), 1);

    // taking events off the channel frees their slots
    let mut recorder = Recorder::default();
    assert_eq!(consumer.drain(&mut recorder), 3);
    assert_eq!(producer.in_flight(DatumKind::Quote), 0);
    producer.push_quote(quote(5)).unwrap();
    assert_eq!(consumer.pending(), 1);
}

#[test]
fn test_other_kinds_are_refused() {
    let _ = env_logger::try_init();
    let (mut producer, _consumer) = Relay::bounded(RelayConfig::default()).unwrap();
    let bar = Datum::Bar(Bar::new(
        at(0),
        dec!(1),
        dec!(2),
        dec!(0.5),
        dec!(1.5),
        dec!(10),
    ));

    let err = producer.push(bar).unwrap_err();
    assert_eq!(err.error, RelayError::UnsupportedKind(DatumKind::Bar));
    assert_eq!(err.datum, bar);
    assert_eq!(producer.pushed().total(), 0);
}

#[test]
fn test_push_after_consumer_gone_is_disconnected() {
    let _ = env_logger::try_init();
    let (mut producer, consumer) = Relay::bounded(RelayConfig::default()).unwrap();
    drop(consumer);

    let err = producer.push_trade(trade(1)).unwrap_err();
    assert_eq!(err.error, RelayError::Disconnected);
    assert_eq!(producer.in_flight(DatumKind::Trade), 0);
}

#[test]
fn test_stop_drains_everything_already_pushed() {
    let _ = env_logger::try_init();
    let (mut producer, consumer) = Relay::bounded(RelayConfig::default()).unwrap();
    for n in 0..5 {
        producer.push_quote(quote(n)).unwrap();
    }

    let handle = consumer.spawn(Recorder::default()).unwrap();
    handle.stop();
    let (recorder, stats) = handle.join_with_handler().unwrap();

    assert_eq!(recorder.seen.len(), 5);
    assert_eq!(stats.quotes, 5);

    // the relay is closed now
    let err = producer.push_quote(quote(6)).unwrap_err();
    assert_eq!(err.error, RelayError::Disconnected);
    assert_eq!(err.into_datum(), Datum::Quote(quote(6)));
    assert_eq!(producer.in_flight(DatumKind::Quote), 0);
}

#[test]
fn test_every_accepted_push_is_dispatched_when_stopped_mid_stream() {
    let _ = env_logger::try_init();
    let (mut producer, consumer) = Relay::bounded(RelayConfig::new(16, 16)).unwrap();
    let handle = consumer.spawn(Recorder::default()).unwrap();

    let pusher = thread::spawn(move || {
        for n in 0..1_000_000 {
            let mut pending = Datum::Quote(quote(n));
            loop {
                match producer.push(pending) {
                    Ok(()) => break,
                    Err(err) if err.is_full() => {
                        pending = err.into_datum();
                        thread::yield_now();
                    }
                    Err(err) => {
                        assert_eq!(err.error, RelayError::Disconnected);
                        return producer.pushed();
                    }
                }
            }
        }
        producer.pushed()
    });

    thread::sleep(std::time::Duration::from_millis(5));
    handle.stop();
    let (recorder, stats) = handle.join_with_handler().unwrap();
    let pushed = pusher.join().unwrap();

    assert_eq!(stats, pushed);
    assert_eq!(recorder.seen.len() as u64, pushed.quotes);
}

#[test]
fn test_dropping_producer_ends_consumer() {
    let _ = env_logger::try_init();
    let (mut producer, consumer) = Relay::bounded(RelayConfig::default()).unwrap();
    let handle = consumer.spawn(Recorder::default()).unwrap();

    producer.push_trade(trade(1)).unwrap();
    producer.push_quote(quote(2)).unwrap();
    drop(producer);

    let stats = handle.join().unwrap();
    assert_eq!(stats.total(), 2);
}

#[test]
fn test_zero_capacity_rejected_at_construction() {
    assert!(matches!(
        Relay::bounded(RelayConfig::new(0, 16)),
        Err(RelayError::ZeroCapacity(DatumKind::Quote))
    ));
}
