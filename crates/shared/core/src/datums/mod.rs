//! Market datums
//!
//! A datum is one immutable, timestamped market fact. Every kind carries its
//! own source-supplied timestamp; `Datum` is the tagged union the merge
//! engine and the relay move around.

mod bar;
mod depth;
mod greek;
mod quote;
mod trade;

pub use bar::Bar;
pub use depth::MarketDepth;
pub use greek::Greek;
pub use quote::Quote;
pub use trade::Trade;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::values::Timestamp;

/// Discriminant of a [`Datum`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatumKind {
    Quote,
    Trade,
    Bar,
    Greek,
    MarketDepth,
}

impl fmt::Display for DatumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatumKind::Quote => "quote",
            DatumKind::Trade => "trade",
            DatumKind::Bar => "bar",
            DatumKind::Greek => "greek",
            DatumKind::MarketDepth => "depth",
        };
        f.write_str(name)
    }
}

/// One timestamped market fact of any kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Datum {
    Quote(Quote),
    Trade(Trade),
    Bar(Bar),
    Greek(Greek),
    MarketDepth(MarketDepth),
}

impl Datum {
    /// Source-supplied timestamp
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Datum::Quote(q) => q.timestamp,
            Datum::Trade(t) => t.timestamp,
            Datum::Bar(b) => b.timestamp,
            Datum::Greek(g) => g.timestamp,
            Datum::MarketDepth(d) => d.timestamp,
        }
    }

    pub fn kind(&self) -> DatumKind {
        match self {
            Datum::Quote(_) => DatumKind::Quote,
            Datum::Trade(_) => DatumKind::Trade,
            Datum::Bar(_) => DatumKind::Bar,
            Datum::Greek(_) => DatumKind::Greek,
            Datum::MarketDepth(_) => DatumKind::MarketDepth,
        }
    }
}

impl From<Quote> for Datum {
    fn from(q: Quote) -> Self {
        Datum::Quote(q)
    }
}

impl From<Trade> for Datum {
    fn from(t: Trade) -> Self {
        Datum::Trade(t)
    }
}

impl From<Bar> for Datum {
    fn from(b: Bar) -> Self {
        Datum::Bar(b)
    }
}

impl From<Greek> for Datum {
    fn from(g: Greek) -> Self {
        Datum::Greek(g)
    }
}

impl From<MarketDepth> for Datum {
    fn from(d: MarketDepth) -> Self {
        Datum::MarketDepth(d)
    }
}
