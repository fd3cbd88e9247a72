//! Synthetic Feed - seeded random-walk market data
//!
//! Generates a quote per tick around a mid price that follows a bounded
//! random walk, with an occasional trade printed at the touch right after
//! the quote. Runs as a [`DatumSource`], so it can be registered with the
//! merge engine alongside recorded data.

use chrono::{DateTime, Duration};
use meridian_core::{Datum, Price, Quote, Timestamp, Trade};
use meridian_ports::{DatumSource, SourceResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Configuration for a synthetic feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticFeedConfig {
    /// Timestamp of the first quote
    pub start: Timestamp,
    /// Time between quotes
    pub tick_interval_ms: i64,
    /// Number of quotes to generate
    pub ticks: usize,
    pub initial_mid: Price,
    /// Max relative move per tick (e.g. 0.0005 = 0.05%)
    pub volatility: Decimal,
    pub half_spread: Price,
    /// Probability of a trade after each quote (0.0 to 1.0)
    pub trade_probability: f64,
}

impl Default for SyntheticFeedConfig {
    fn default() -> Self {
        Self {
            // 2024-01-02 14:30:00 UTC
            start: DateTime::from_timestamp(1_704_205_800, 0).unwrap_or_default(),
            tick_interval_ms: 100,
            ticks: 1_000,
            initial_mid: dec!(100),
            volatility: dec!(0.0005),
            half_spread: dec!(0.01),
            trade_probability: 0.2,
        }
    }
}

pub struct SyntheticFeed {
    config: SyntheticFeedConfig,
    rng: StdRng,
    mid: Price,
    next_time: Timestamp,
    emitted: usize,
    /// Trade waiting to follow the quote just emitted
    pending_trade: Option<Trade>,
}

impl SyntheticFeed {
    pub fn new(config: SyntheticFeedConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create with a specific seed for reproducible runs
    pub fn with_seed(config: SyntheticFeedConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SyntheticFeedConfig, rng: StdRng) -> Self {
        Self {
            mid: config.initial_mid,
            next_time: config.start,
            emitted: 0,
            pending_trade: None,
            rng,
            config,
        }
    }

    pub fn mid(&self) -> Price {
        self.mid
    }

    fn step(&mut self) -> Quote {
        let shock: f64 = self.rng.gen_range(-1.0..1.0);
        let shock = Decimal::from_f64(shock).unwrap_or_default();
        let moved = (self.mid * (Decimal::ONE + self.config.volatility * shock)).round_dp(4);
        // keep the bid strictly positive
        let floor = self.config.half_spread + dec!(0.0001);
        self.mid = moved.max(floor);

        let timestamp = self.next_time;
        self.next_time += Duration::milliseconds(self.config.tick_interval_ms);

        let bid_size = Decimal::from(self.rng.gen_range(1..=10) * 100);
        let ask_size = Decimal::from(self.rng.gen_range(1..=10) * 100);
        let quote = Quote::new(
            timestamp,
            self.mid - self.config.half_spread,
            bid_size,
            self.mid + self.config.half_spread,
            ask_size,
        );

        if self.rng.r#gen::<f64>() < self.config.trade_probability {
            let at_ask: bool = self.rng.r#gen();
            let price = if at_ask { quote.ask } else { quote.bid };
            let size = Decimal::from(self.rng.gen_range(1..=5) * 100);
            self.pending_trade = Some(Trade::new(timestamp, price, size));
        }

        quote
    }
}

impl DatumSource for SyntheticFeed {
    fn next_datum(&mut self) -> Option<SourceResult<Datum>> {
        if let Some(trade) = self.pending_trade.take() {
            return Some(Ok(Datum::Trade(trade)));
        }
        if self.emitted >= self.config.ticks {
            return None;
        }
        self.emitted += 1;
        Some(Ok(Datum::Quote(self.step())))
    }
}
