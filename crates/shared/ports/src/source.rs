use meridian_core::Datum;

use crate::error::SourceResult;

/// Port for one ordered stream of market datums
///
/// Implementations must yield datums in non-decreasing timestamp order.
/// The merge engine never re-sorts within a source, so a source that goes
/// backwards in time voids the global ordering guarantee for its items.
pub trait DatumSource: Send {
    /// Pull the next datum
    ///
    /// Returns `None` once the source is exhausted. An `Err` means the
    /// source failed; callers treat the source as finished afterwards.
    fn next_datum(&mut self) -> Option<SourceResult<Datum>>;

    /// Optional size hint for logging
    fn len_hint(&self) -> Option<usize> {
        None
    }
}

impl<S: DatumSource + ?Sized> DatumSource for Box<S> {
    fn next_datum(&mut self) -> Option<SourceResult<Datum>> {
        (**self).next_datum()
    }

    fn len_hint(&self) -> Option<usize> {
        (**self).len_hint()
    }
}
