//! Errors returned by registration and retrieval operations.
//!
//! The recording path never returns an error. Dropped late samples, data
//! discarded on view unregistration, and snapshots lost to a slow subscriber
//! are documented data loss, not failures.

use std::time::Duration;

use thiserror::Error;

/// Any error that may be returned by a [`Collector`] operation.
///
/// [`Collector`]: crate::Collector
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A different measure is already registered under this name.
    #[error("a different measure named `{0}` is already registered")]
    DuplicateMeasure(String),

    /// A view is already registered under this name.
    #[error("a view named `{0}` is already registered")]
    DuplicateView(String),

    /// The named measure is not registered.
    #[error("no measure named `{0}` is registered")]
    UnknownMeasure(String),

    /// The named view is not registered.
    #[error("no view named `{0}` is registered")]
    UnknownView(String),

    /// The measure cannot be unregistered while a view still aggregates it.
    #[error("measure `{measure}` is still referenced by view `{view}`")]
    MeasureInUse {
        /// Name of the measure being unregistered.
        measure: String,
        /// Name of one view still bound to the measure.
        view: String,
    },

    /// The view descriptor failed validation.
    #[error("view `{view}` is invalid: {reason}")]
    InvalidView {
        /// Name of the rejected view.
        view: String,
        /// What failed validation.
        reason: String,
    },

    /// A measurement batch had mismatched measure and value slice lengths.
    ///
    /// Nothing from the batch is recorded.
    #[error("batch length mismatch: {measures} measures but {values} values")]
    BatchLengthMismatch {
        /// Number of measure names in the batch.
        measures: usize,
        /// Number of values in the batch.
        values: usize,
    },

    /// The export period hints are inverted.
    #[error("invalid export period: min {min:?} exceeds max {max:?}")]
    InvalidExportPeriod {
        /// Requested minimum period.
        min: Duration,
        /// Requested maximum period.
        max: Duration,
    },
}
