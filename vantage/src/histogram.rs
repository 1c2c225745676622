//! Bucketed distribution aggregation.
//!
//! A distribution tracks count, min, max, sum, an incrementally maintained
//! mean, and one counter per bucket. Buckets follow the half-open rule:
//! for bounds `[b0, .., bn]`, bucket 0 covers `(-inf, b0)`, bucket `i`
//! covers `[b(i-1), b(i))`, and the last bucket covers `[bn, +inf)`. With no
//! bounds there is exactly one unbounded bucket.
//!
//! Bounds are validated (strictly increasing, finite) when the owning view
//! is registered; there is no silent sorting of misordered bounds.

use std::sync::Arc;

/// Statistics of a distribution of recorded values.
///
/// This is both the running state of a cumulative distribution view and the
/// snapshot form handed to exporters.
#[derive(Clone, Debug, PartialEq)]
pub struct DistributionData {
    count: u64,
    min: f64,
    max: f64,
    sum: f64,
    mean: f64,
    bounds: Arc<[f64]>,
    bucket_counts: Vec<u64>,
}

impl DistributionData {
    pub(crate) fn new(bounds: Arc<[f64]>) -> Self {
        let buckets = bounds.len() + 1;
        Self {
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
            mean: 0.0,
            bounds,
            bucket_counts: vec![0; buckets],
        }
    }

    pub(crate) fn add_sample(&mut self, value: f64) {
        self.count += 1;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
        self.sum += value;
        self.mean += (value - self.mean) / self.count as f64;

        let bucket = self.bounds.partition_point(|bound| *bound <= value);
        self.bucket_counts[bucket] += 1;
    }

    /// Difference of two snapshots of the same lineage, `self - earlier`.
    ///
    /// Counts, sums and per-bucket counts subtract element-wise and the mean
    /// is recomputed from the differenced count and sum. Min and max are not
    /// recoverable by subtraction and are carried over from `self`.
    pub(crate) fn diff(&self, earlier: &Self) -> Self {
        let count = self.count.saturating_sub(earlier.count);
        let sum = self.sum - earlier.sum;
        let bucket_counts = self
            .bucket_counts
            .iter()
            .zip(&earlier.bucket_counts)
            .map(|(now, then)| now.saturating_sub(*then))
            .collect();
        Self {
            count,
            min: self.min,
            max: self.max,
            sum,
            mean: if count == 0 { 0.0 } else { sum / count as f64 },
            bounds: self.bounds.clone(),
            bucket_counts,
        }
    }

    /// Number of recorded samples.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Smallest recorded value. Meaningless while [`Self::count`] is zero.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest recorded value. Meaningless while [`Self::count`] is zero.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Sum of recorded values.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Arithmetic mean of recorded values.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// The bucket boundaries this distribution was configured with.
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Per-bucket sample counts, `bounds().len() + 1` entries.
    pub fn bucket_counts(&self) -> &[u64] {
        &self.bucket_counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn distribution(bounds: &[f64]) -> DistributionData {
        DistributionData::new(bounds.to_vec().into())
    }

    #[rstest]
    #[case(10.0, 0)] // (-inf, 15)
    #[case(20.0, 1)] // [15, +inf)
    #[case(15.0, 1)] // boundary lands in the upper bucket
    fn single_bound_bucket_assignment(#[case] value: f64, #[case] expected: usize) {
        let mut dist = distribution(&[15.0]);
        dist.add_sample(value);

        let mut want = vec![0, 0];
        want[expected] = 1;
        assert_eq!(dist.bucket_counts(), &want[..]);
    }

    #[rstest]
    #[case(-3.0, 0)]
    #[case(0.0, 1)]
    #[case(5.0, 1)]
    #[case(10.0, 2)]
    #[case(100.0, 3)]
    fn three_bucket_assignment(#[case] value: f64, #[case] expected: usize) {
        let mut dist = distribution(&[0.0, 10.0, 50.0]);
        dist.add_sample(value);
        assert_eq!(dist.bucket_counts()[expected], 1);
    }

    #[test]
    fn stats_over_three_samples() {
        let mut dist = distribution(&[15.0, 25.0]);
        for value in [10.0, 20.0, 30.0] {
            dist.add_sample(value);
        }

        assert_eq!(dist.count(), 3);
        assert_eq!(dist.min(), 10.0);
        assert_eq!(dist.max(), 30.0);
        assert_eq!(dist.sum(), 60.0);
        assert_eq!(dist.mean(), 20.0);
        assert_eq!(dist.bucket_counts(), &[1, 1, 1]);
    }

    #[test]
    fn no_bounds_is_one_unbounded_bucket() {
        let mut dist = distribution(&[]);
        dist.add_sample(-1e300);
        dist.add_sample(1e300);
        assert_eq!(dist.bucket_counts(), &[2]);
    }

    #[test]
    fn diff_subtracts_counts_sums_and_buckets() {
        let mut dist = distribution(&[15.0]);
        dist.add_sample(10.0);
        let earlier = dist.clone();
        dist.add_sample(20.0);
        dist.add_sample(30.0);

        let window = dist.diff(&earlier);
        assert_eq!(window.count(), 2);
        assert_eq!(window.sum(), 50.0);
        assert_eq!(window.mean(), 25.0);
        assert_eq!(window.bucket_counts(), &[0, 2]);
    }
}
