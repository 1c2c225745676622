//! View descriptors bind a measure to an aggregation over chosen tag keys.

use std::sync::Arc;
use std::time::Duration;

use crate::error::Error;
use crate::tag::TagKey;

/// Default number of sub-intervals for a sliding window.
pub const DEFAULT_SUB_INTERVALS: usize = 5;

pub(crate) const MIN_SUB_INTERVALS: usize = 2;
pub(crate) const MAX_SUB_INTERVALS: usize = 20;

/// How a view folds recorded values together.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Aggregation {
    /// Number of recorded samples.
    Count,
    /// Sum of recorded values.
    Sum,
    /// Incrementally maintained arithmetic mean, stable over unbounded
    /// sample counts.
    Mean,
    /// The most recently recorded value.
    LastValue,
    /// Bucketed distribution with count, min, max, sum and mean.
    Distribution {
        /// Strictly increasing bucket boundaries. Bucket `i` covers
        /// `[bounds[i-1], bounds[i])`; the first bucket is unbounded below
        /// and the last unbounded above. Empty bounds mean a single
        /// unbounded bucket.
        bounds: Arc<[f64]>,
    },
}

impl Aggregation {
    /// Distribution aggregation over the given bucket boundaries.
    pub fn distribution(bounds: impl Into<Arc<[f64]>>) -> Self {
        Self::Distribution {
            bounds: bounds.into(),
        }
    }

    pub(crate) fn bounds(&self) -> Arc<[f64]> {
        match self {
            Self::Distribution { bounds } => bounds.clone(),
            _ => Arc::from([]),
        }
    }
}

/// Time-window policy of a view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Window {
    /// Accumulate since view registration, never reset.
    Cumulative,
    /// Report only a trailing window, approximated by rotating
    /// sub-intervals. The approximation error is bounded by
    /// `window / sub_intervals`.
    Sliding {
        /// Width of the trailing window.
        window: Duration,
        /// Number of sub-intervals the window is divided into, in `2..=20`.
        sub_intervals: usize,
    },
}

impl Window {
    /// A sliding window with [`DEFAULT_SUB_INTERVALS`] sub-intervals.
    pub fn sliding(window: Duration) -> Self {
        Self::Sliding {
            window,
            sub_intervals: DEFAULT_SUB_INTERVALS,
        }
    }
}

/// Describes one named aggregation of a measure.
///
/// The tag `columns` fix both the subset of tags the view groups by and the
/// canonical slot order of its aggregation signatures.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewDescriptor {
    name: String,
    measure_name: String,
    columns: Vec<TagKey>,
    aggregation: Aggregation,
    window: Window,
}

impl ViewDescriptor {
    /// Create a descriptor for a view named `name` over `measure_name`.
    pub fn new(
        name: impl Into<String>,
        measure_name: impl Into<String>,
        columns: Vec<TagKey>,
        aggregation: Aggregation,
        window: Window,
    ) -> Self {
        Self {
            name: name.into(),
            measure_name: measure_name.into(),
            columns,
            aggregation,
            window,
        }
    }

    /// The unique view name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the measure this view aggregates.
    pub fn measure_name(&self) -> &str {
        &self.measure_name
    }

    /// The tag keys this view groups by, in canonical order.
    pub fn columns(&self) -> &[TagKey] {
        &self.columns
    }

    /// The aggregation kind.
    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    /// The window policy.
    pub fn window(&self) -> &Window {
        &self.window
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty() {
            return self.invalid("view name must not be empty");
        }
        if self.measure_name.is_empty() {
            return self.invalid("measure name must not be empty");
        }
        for (idx, key) in self.columns.iter().enumerate() {
            if self.columns[..idx].contains(key) {
                return self.invalid(format!("duplicate tag column `{}`", key.name()));
            }
        }
        if let Aggregation::Distribution { bounds } = &self.aggregation {
            if bounds.iter().any(|b| !b.is_finite()) {
                return self.invalid("distribution bounds must be finite");
            }
            if bounds.windows(2).any(|pair| pair[0] >= pair[1]) {
                return self.invalid("distribution bounds must be strictly increasing");
            }
        }
        if let Window::Sliding {
            window,
            sub_intervals,
        } = &self.window
        {
            if window.is_zero() {
                return self.invalid("sliding window must be non-zero");
            }
            if !(MIN_SUB_INTERVALS..=MAX_SUB_INTERVALS).contains(sub_intervals) {
                return self.invalid(format!(
                    "sub-interval count {sub_intervals} outside {MIN_SUB_INTERVALS}..={MAX_SUB_INTERVALS}"
                ));
            }
            if matches!(self.aggregation, Aggregation::LastValue) {
                return self.invalid("last value aggregation is windowless; use Window::Cumulative");
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> Result<(), Error> {
        Err(Error::InvalidView {
            view: self.name.clone(),
            reason: reason.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(aggregation: Aggregation, window: Window) -> ViewDescriptor {
        ViewDescriptor::new("v", "m", vec![TagKey::new("k")], aggregation, window)
    }

    #[test]
    fn accepts_a_plain_cumulative_view() {
        assert_eq!(base(Aggregation::Count, Window::Cumulative).validate(), Ok(()));
    }

    #[test]
    fn rejects_non_increasing_bounds() {
        let view = base(
            Aggregation::distribution([1.0, 1.0, 2.0]),
            Window::Cumulative,
        );
        assert!(matches!(view.validate(), Err(Error::InvalidView { .. })));
    }

    #[test]
    fn rejects_non_finite_bounds() {
        let view = base(
            Aggregation::distribution([1.0, f64::NAN]),
            Window::Cumulative,
        );
        assert!(matches!(view.validate(), Err(Error::InvalidView { .. })));
    }

    #[test]
    fn rejects_sub_interval_count_out_of_range() {
        for sub_intervals in [0, 1, 21] {
            let view = base(
                Aggregation::Sum,
                Window::Sliding {
                    window: Duration::from_secs(60),
                    sub_intervals,
                },
            );
            assert!(matches!(view.validate(), Err(Error::InvalidView { .. })));
        }
    }

    #[test]
    fn rejects_duplicate_columns() {
        let key = TagKey::new("k");
        let view = ViewDescriptor::new(
            "v",
            "m",
            vec![key.clone(), key],
            Aggregation::Count,
            Window::Cumulative,
        );
        assert!(matches!(view.validate(), Err(Error::InvalidView { .. })));
    }

    #[test]
    fn rejects_last_value_with_a_sliding_window() {
        let view = base(
            Aggregation::LastValue,
            Window::sliding(Duration::from_secs(60)),
        );
        assert!(matches!(view.validate(), Err(Error::InvalidView { .. })));
    }

    #[test]
    fn empty_bounds_are_a_single_unbounded_bucket() {
        let view = base(Aggregation::distribution(Vec::<f64>::new()), Window::Cumulative);
        assert_eq!(view.validate(), Ok(()));
    }
}
