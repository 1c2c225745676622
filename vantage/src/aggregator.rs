//! The closed set of aggregator variants and their snapshot form.

use std::time::SystemTime;

use crate::histogram::DistributionData;
use crate::interval::IntervalAggregator;
use crate::value::{CountData, LastValueData, MeanData, SumData};
use crate::view::{Aggregation, ViewDescriptor, Window};

/// Mutable running state for one `(view, signature)` pair.
///
/// The variant is fixed by the owning view's aggregation and window at
/// creation time; there is no runtime re-dispatch on sample or snapshot.
#[derive(Debug)]
pub(crate) enum Aggregator {
    Count(CountData),
    Sum(SumData),
    Mean(MeanData),
    LastValue(LastValueData),
    Distribution(DistributionData),
    Interval(IntervalAggregator),
}

impl Aggregator {
    pub(crate) fn new(view: &ViewDescriptor) -> Self {
        match view.window() {
            Window::Sliding {
                window,
                sub_intervals,
            } => Self::Interval(IntervalAggregator::new(
                *window,
                *sub_intervals,
                view.aggregation().bounds(),
            )),
            Window::Cumulative => match view.aggregation() {
                Aggregation::Count => Self::Count(CountData::default()),
                Aggregation::Sum => Self::Sum(SumData::default()),
                Aggregation::Mean => Self::Mean(MeanData::default()),
                Aggregation::LastValue => Self::LastValue(LastValueData::default()),
                Aggregation::Distribution { bounds } => {
                    Self::Distribution(DistributionData::new(bounds.clone()))
                }
            },
        }
    }

    /// Fold one measurement into the running state. Never fails; values are
    /// valid floats by contract with the recorder.
    pub(crate) fn add_sample(&mut self, value: f64, timestamp: SystemTime) {
        match self {
            Self::Count(data) => data.add_sample(),
            Self::Sum(data) => data.add_sample(value),
            Self::Mean(data) => data.add_sample(value),
            Self::LastValue(data) => data.add_sample(value, timestamp),
            Self::Distribution(data) => data.add_sample(value),
            Self::Interval(data) => data.add_sample(value, timestamp),
        }
    }

    /// Produce the exported form of the current state.
    ///
    /// Cumulative variants clone their full accumulated state; interval
    /// variants compute the trailing-window difference as of `now` and then
    /// reduce it to the view's aggregation kind.
    pub(crate) fn snapshot(&self, aggregation: &Aggregation, now: SystemTime) -> AggregationData {
        match self {
            Self::Count(data) => AggregationData::Count(data.count()),
            Self::Sum(data) => AggregationData::Sum(data.sum()),
            Self::Mean(data) => AggregationData::Mean {
                mean: data.mean(),
                count: data.count(),
            },
            Self::LastValue(data) => AggregationData::LastValue {
                value: data.value(),
                timestamp: data.timestamp(),
            },
            Self::Distribution(data) => AggregationData::Distribution(data.clone()),
            Self::Interval(interval) => {
                let window = interval.snapshot(now);
                match aggregation {
                    Aggregation::Count => AggregationData::Count(window.count()),
                    Aggregation::Sum => AggregationData::Sum(window.sum()),
                    Aggregation::Mean => AggregationData::Mean {
                        mean: window.mean(),
                        count: window.count(),
                    },
                    Aggregation::Distribution { .. } => AggregationData::Distribution(window),
                    Aggregation::LastValue => {
                        unreachable!("last value views cannot have sliding windows")
                    }
                }
            }
        }
    }
}

/// Exported statistics for one tag combination of a view.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum AggregationData {
    /// Number of recorded samples.
    Count(u64),
    /// Sum of recorded values.
    Sum(f64),
    /// Arithmetic mean of recorded values.
    Mean {
        /// The mean.
        mean: f64,
        /// Number of samples it was computed over.
        count: u64,
    },
    /// The most recently recorded value.
    LastValue {
        /// The value.
        value: f64,
        /// When it was recorded.
        timestamp: SystemTime,
    },
    /// Bucketed distribution statistics.
    Distribution(DistributionData),
}

impl AggregationData {
    /// Number of samples behind this data point.
    ///
    /// `None` for last-value data, which does not track a count.
    pub fn sample_count(&self) -> Option<u64> {
        match self {
            Self::Count(count) => Some(*count),
            Self::Mean { count, .. } => Some(*count),
            Self::Distribution(dist) => Some(dist.count()),
            Self::Sum(_) | Self::LastValue { .. } => None,
        }
    }
}
