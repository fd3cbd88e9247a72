//! In-memory sources
//!
//! Adapters that turn iterators into [`DatumSource`]s, for replaying
//! preloaded series and for tests.

use meridian_core::Datum;
use meridian_ports::{DatumSource, SourceResult};

/// Source backed by an infallible iterator
pub struct IterSource<I> {
    iter: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = Datum> + Send,
{
    pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            iter: iter.into_iter(),
        }
    }
}

/// Source over a preloaded series
pub type VecSource = IterSource<std::vec::IntoIter<Datum>>;

impl VecSource {
    /// Build from any collection of datums already in time order
    pub fn from_datums<D: Into<Datum>>(datums: impl IntoIterator<Item = D>) -> Self {
        let datums: Vec<Datum> = datums.into_iter().map(Into::into).collect();
        Self::new(datums)
    }
}

impl<I> DatumSource for IterSource<I>
where
    I: Iterator<Item = Datum> + Send,
{
    fn next_datum(&mut self) -> Option<SourceResult<Datum>> {
        self.iter.next().map(Ok)
    }

    fn len_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (low, Some(high)) if low == high => Some(low),
            _ => None,
        }
    }
}

/// Source backed by an iterator whose items may fail
///
/// After the first `Err` the source reports exhaustion.
pub struct FallibleSource<I> {
    iter: I,
    failed: bool,
}

impl<I> FallibleSource<I>
where
    I: Iterator<Item = SourceResult<Datum>> + Send,
{
    pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            iter: iter.into_iter(),
            failed: false,
        }
    }
}

impl<I> DatumSource for FallibleSource<I>
where
    I: Iterator<Item = SourceResult<Datum>> + Send,
{
    fn next_datum(&mut self) -> Option<SourceResult<Datum>> {
        if self.failed {
            return None;
        }
        let next = self.iter.next();
        if matches!(next, Some(Err(_))) {
            self.failed = true;
        }
        next
    }
}
