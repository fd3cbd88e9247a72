use meridian_core::{Bar, Datum, Greek, MarketDepth, Quote, Trade};

use crate::error::SourceError;

/// Strategy-side callbacks, one per datum kind
///
/// Invoked synchronously by whoever dispatches (the merge engine or the
/// relay consumer). Handlers should return quickly; nothing interrupts a
/// callback that is already running.
pub trait DatumHandler {
    fn on_quote(&mut self, _quote: &Quote) {}

    fn on_trade(&mut self, _trade: &Trade) {}

    fn on_bar(&mut self, _bar: &Bar) {}

    fn on_greek(&mut self, _greek: &Greek) {}

    fn on_depth(&mut self, _depth: &MarketDepth) {}

    /// A registered source failed and has been retired
    fn on_source_error(&mut self, _source: &str, _error: &SourceError) {}

    /// Route a datum to the callback matching its kind
    fn on_datum(&mut self, datum: &Datum) {
        match datum {
            Datum::Quote(q) => self.on_quote(q),
            Datum::Trade(t) => self.on_trade(t),
            Datum::Bar(b) => self.on_bar(b),
            Datum::Greek(g) => self.on_greek(g),
            Datum::MarketDepth(d) => self.on_depth(d),
        }
    }
}

impl<H: DatumHandler + ?Sized> DatumHandler for &mut H {
    fn on_quote(&mut self, quote: &Quote) {
        (**self).on_quote(quote)
    }

    fn on_trade(&mut self, trade: &Trade) {
        (**self).on_trade(trade)
    }

    fn on_bar(&mut self, bar: &Bar) {
        (**self).on_bar(bar)
    }

    fn on_greek(&mut self, greek: &Greek) {
        (**self).on_greek(greek)
    }

    fn on_depth(&mut self, depth: &MarketDepth) {
        (**self).on_depth(depth)
    }

    fn on_source_error(&mut self, source: &str, error: &SourceError) {
        (**self).on_source_error(source, error)
    }

    fn on_datum(&mut self, datum: &Datum) {
        (**self).on_datum(datum)
    }
}

impl<H: DatumHandler + ?Sized> DatumHandler for Box<H> {
    fn on_quote(&mut self, quote: &Quote) {
        (**self).on_quote(quote)
    }

    fn on_trade(&mut self, trade: &Trade) {
        (**self).on_trade(trade)
    }

    fn on_bar(&mut self, bar: &Bar) {
        (**self).on_bar(bar)
    }

    fn on_greek(&mut self, greek: &Greek) {
        (**self).on_greek(greek)
    }

    fn on_depth(&mut self, depth: &MarketDepth) {
        (**self).on_depth(depth)
    }

    fn on_source_error(&mut self, source: &str, error: &SourceError) {
        (**self).on_source_error(source, error)
    }

    fn on_datum(&mut self, datum: &Datum) {
        (**self).on_datum(datum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use meridian_core::Timestamp;

    #[derive(Default)]
    struct Counting {
        quotes: usize,
        trades: usize,
    }

    impl DatumHandler for Counting {
        fn on_quote(&mut self, _quote: &Quote) {
            self.quotes += 1;
        }

        fn on_trade(&mut self, _trade: &Trade) {
            self.trades += 1;
        }
    }

    fn ts() -> Timestamp {
        Utc::now()
    }

    #[test]
    fn test_on_datum_routes_by_kind() {
        let mut handler = Counting::default();
        let zero = rust_decimal::Decimal::ZERO;

        handler.on_datum(&Datum::Quote(Quote::new(ts(), zero, zero, zero, zero)));
        handler.on_datum(&Datum::Trade(Trade::new(ts(), zero, zero)));
        handler.on_datum(&Datum::Trade(Trade::new(ts(), zero, zero)));

        assert_eq!(handler.quotes, 1);
        assert_eq!(handler.trades, 2);
    }
}
