//! Sliding-window aggregation over rotating sub-intervals.
//!
//! A sliding view answers "stats over the trailing window" without storing
//! raw samples. The window is divided into fixed-width sub-intervals; the
//! aggregator keeps a small ring of slots, each holding the cumulative
//! distribution as of the last sample that landed in that sub-interval. A
//! trailing-window read subtracts the slot nearest the window's trailing
//! edge from the newest slot.
//!
//! The result is approximate by construction: memory and read cost are
//! `O(sub_intervals)` instead of `O(samples)`, and in exchange the window
//! boundary can be off by up to one sub-interval width
//! (`window / sub_intervals`) while samples are being recorded steadily.
//! After an idle gap the surviving slots can be older than the window, and a
//! read may over-report until new samples rotate them out.
//!
//! Slots reset on write: a sample whose sub-interval index is newer than the
//! slot it maps to overwrites the slot. A sample whose index is older than
//! the stored one arrived after its slot already rotated away; it is dropped
//! without retroactive correction.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::histogram::DistributionData;

#[derive(Clone, Debug)]
struct Slot {
    /// Monotonically increasing sub-interval index,
    /// `floor(unix_time / slot_width)`.
    index: u64,
    /// Time of the newest sample that landed in this sub-interval.
    updated: SystemTime,
    /// Cumulative distribution as of `updated`.
    accumulated: DistributionData,
}

/// Running state of one tag combination under a sliding-window view.
#[derive(Clone, Debug)]
pub(crate) struct IntervalAggregator {
    window: Duration,
    slot_width: Duration,
    // one extra slot keeps the trailing edge within a sub-interval of the
    // window boundary while the ring rotates
    slots: Vec<Option<Slot>>,
    cumulative: DistributionData,
    dropped: u64,
}

impl IntervalAggregator {
    pub(crate) fn new(window: Duration, sub_intervals: usize, bounds: Arc<[f64]>) -> Self {
        debug_assert!(sub_intervals >= 2, "validated at view registration");
        Self {
            window,
            slot_width: window / sub_intervals as u32,
            slots: vec![None; sub_intervals + 1],
            cumulative: DistributionData::new(bounds),
            dropped: 0,
        }
    }

    fn slot_index(&self, timestamp: SystemTime) -> u64 {
        let since_epoch = timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        (since_epoch.as_nanos() / self.slot_width.as_nanos()) as u64
    }

    pub(crate) fn add_sample(&mut self, value: f64, timestamp: SystemTime) {
        let index = self.slot_index(timestamp);
        let position = (index % self.slots.len() as u64) as usize;

        let updated = match &self.slots[position] {
            Some(slot) if slot.index > index => {
                // late sample, its sub-interval already rotated away
                self.dropped += 1;
                tracing::debug!(
                    dropped = self.dropped,
                    "dropping sample older than the sliding window"
                );
                return;
            }
            Some(slot) if slot.index == index => slot.updated.max(timestamp),
            _ => timestamp,
        };

        self.cumulative.add_sample(value);
        self.slots[position] = Some(Slot {
            index,
            updated,
            accumulated: self.cumulative.clone(),
        });
    }

    /// Stats over the trailing window ending at `now`.
    pub(crate) fn snapshot(&self, now: SystemTime) -> DistributionData {
        let mut live = self.slots.iter().flatten();
        let Some(first) = live.next() else {
            return self.cumulative.clone();
        };
        let newest = live.fold(first, |a, b| if b.index > a.index { b } else { a });

        let trailing_edge = now
            .checked_sub(self.window)
            .unwrap_or(UNIX_EPOCH);
        let trailing = self
            .slots
            .iter()
            .flatten()
            .filter(|slot| slot.index != newest.index)
            .min_by_key(|slot| distance(slot.updated, trailing_edge));

        match trailing {
            Some(trailing) => newest.accumulated.diff(&trailing.accumulated),
            None => newest.accumulated.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn dropped(&self) -> u64 {
        self.dropped
    }
}

fn distance(a: SystemTime, b: SystemTime) -> Duration {
    a.duration_since(b)
        .or_else(|_| b.duration_since(a))
        .unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);
    const HOUR: Duration = Duration::from_secs(3600);

    fn at(minutes: u64) -> SystemTime {
        UNIX_EPOCH + MINUTE * minutes as u32
    }

    fn aggregator() -> IntervalAggregator {
        // 1 hour window, 5 sub-intervals of 12 minutes
        IntervalAggregator::new(HOUR, 5, Arc::from([]))
    }

    #[test]
    fn single_sub_interval_reports_without_a_diff() {
        let mut agg = aggregator();
        agg.add_sample(10.0, at(1));
        agg.add_sample(20.0, at(2));

        let stats = agg.snapshot(at(2));
        assert_eq!(stats.count(), 2);
        assert_eq!(stats.sum(), 30.0);
    }

    #[test]
    fn snapshot_subtracts_the_trailing_edge_slot() {
        let mut agg = aggregator();
        // one sample per sub-interval for two hours
        for minutes in (0..120).step_by(12) {
            agg.add_sample(1.0, at(minutes));
        }

        let stats = agg.snapshot(at(120));
        // the trailing hour holds 5 of the 10 samples, give or take one
        // sub-interval at the boundary
        assert!(stats.count() >= 4 && stats.count() <= 6, "{}", stats.count());
    }

    #[test]
    fn late_samples_are_dropped() {
        let mut agg = aggregator();
        for minutes in (0..120).step_by(12) {
            agg.add_sample(1.0, at(minutes));
        }
        let before = agg.snapshot(at(120)).count();

        // minute 12 maps to a slot that has rotated past its index
        agg.add_sample(100.0, at(12));

        assert_eq!(agg.dropped(), 1);
        assert_eq!(agg.snapshot(at(120)).count(), before);
    }

    #[test]
    fn same_sub_interval_accumulates_rather_than_resets() {
        let mut agg = aggregator();
        agg.add_sample(1.0, at(0));
        agg.add_sample(1.0, at(70));
        agg.add_sample(1.0, at(71));
        agg.add_sample(1.0, at(70)); // out of order within the live slot

        let stats = agg.snapshot(at(71));
        // trailing slot is the one from minute 0 (single sample)
        assert_eq!(stats.count(), 3);
    }

    #[test]
    fn empty_aggregator_snapshots_to_zero() {
        let agg = aggregator();
        assert_eq!(agg.snapshot(at(0)).count(), 0);
    }
}
