//! Scalar running aggregations.
//!
//! All updates here are commutative, so concurrent recorders interleaving in
//! either order converge on the same result.

use std::time::{SystemTime, UNIX_EPOCH};

/// Running count of recorded samples.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct CountData {
    count: u64,
}

impl CountData {
    pub(crate) fn add_sample(&mut self) {
        self.count += 1;
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }
}

/// Running sum of recorded values.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SumData {
    sum: f64,
}

impl SumData {
    pub(crate) fn add_sample(&mut self, value: f64) {
        self.sum += value;
    }

    pub(crate) fn sum(&self) -> f64 {
        self.sum
    }
}

/// Incrementally maintained arithmetic mean.
///
/// Uses the Welford update rather than a running sum divided by count, so the
/// mean stays numerically stable over unbounded sample counts in
/// long-running processes.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct MeanData {
    count: u64,
    mean: f64,
}

impl MeanData {
    pub(crate) fn add_sample(&mut self, value: f64) {
        self.count += 1;
        self.mean += (value - self.mean) / self.count as f64;
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }

    pub(crate) fn mean(&self) -> f64 {
        self.mean
    }
}

/// The most recently recorded value, with its timestamp.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LastValueData {
    value: f64,
    timestamp: SystemTime,
}

impl Default for LastValueData {
    // Placeholder until the first sample lands; an aggregator only becomes
    // visible to readers once its first sample has been applied.
    fn default() -> Self {
        Self {
            value: 0.0,
            timestamp: UNIX_EPOCH,
        }
    }
}

impl LastValueData {
    pub(crate) fn add_sample(&mut self, value: f64, timestamp: SystemTime) {
        self.value = value;
        self.timestamp = timestamp;
    }

    pub(crate) fn value(&self) -> f64 {
        self.value
    }

    pub(crate) fn timestamp(&self) -> SystemTime {
        self.timestamp
    }
}
