//! Sliding-window views driven by a manually advanced clock.

use assert2::check;
use std::time::{Duration, UNIX_EPOCH};

use vantage::{
    Aggregation, AggregationData, Collector, Measure, TagSet, ViewDescriptor, Window,
};
use vantage_timesource::{TimeSource, fakes::ManualClock};

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

fn sliding_collector(aggregation: Aggregation) -> (Collector, ManualClock) {
    let clock = ManualClock::starting_at(UNIX_EPOCH);
    let collector = Collector::with_time_source(TimeSource::custom(clock.clone()));
    collector
        .register_measure(Measure::new("latency", "request latency", "ms"))
        .unwrap();
    collector
        .register_view(ViewDescriptor::new(
            "trailing_hour",
            "latency",
            vec![],
            aggregation,
            Window::Sliding {
                window: HOUR,
                sub_intervals: 5,
            },
        ))
        .unwrap();
    (collector, clock)
}

fn window_count(collector: &Collector) -> u64 {
    let data = collector.retrieve_view("trailing_hour").unwrap();
    match data.rows()[0].data() {
        AggregationData::Count(count) => *count,
        other => panic!("expected count data, got {other:?}"),
    }
}

#[test]
fn two_hours_of_samples_read_back_as_the_trailing_hour() {
    let (collector, clock) = sliding_collector(Aggregation::Count);

    // one sample per minute for two hours
    for _ in 0..120 {
        collector.record(&TagSet::empty(), "latency", 1.0);
        clock.advance(MINUTE);
    }

    let count = window_count(&collector);
    // exactly one hour would be 60; the sub-interval approximation may cut
    // up to window/5 (12 samples) from the trailing edge
    check!(count <= 60);
    check!(count >= 48);
    // and never the full two-hour history
    check!(count < 120);
}

#[test]
fn early_life_reports_everything_recorded_so_far() {
    let (collector, clock) = sliding_collector(Aggregation::Count);

    for _ in 0..5 {
        collector.record(&TagSet::empty(), "latency", 1.0);
        clock.advance(MINUTE);
    }

    check!(window_count(&collector) == 5);
}

#[test]
fn late_samples_are_dropped_without_retroactive_correction() {
    let (collector, clock) = sliding_collector(Aggregation::Count);

    for _ in 0..120 {
        collector.record(&TagSet::empty(), "latency", 1.0);
        clock.advance(MINUTE);
    }
    let before = window_count(&collector);

    // a sample stamped an hour and a half ago maps to a rotated sub-interval
    collector.record_at(
        UNIX_EPOCH + 30 * MINUTE,
        &TagSet::empty(),
        "latency",
        1.0,
    );

    check!(window_count(&collector) == before);
}

#[test]
fn sliding_distribution_reports_window_stats() {
    let (collector, clock) = sliding_collector(Aggregation::distribution([50.0]));

    // first hour: all small values; second hour: all large values
    for _ in 0..60 {
        collector.record(&TagSet::empty(), "latency", 10.0);
        clock.advance(MINUTE);
    }
    for _ in 0..60 {
        collector.record(&TagSet::empty(), "latency", 100.0);
        clock.advance(MINUTE);
    }

    let data = collector.retrieve_view("trailing_hour").unwrap();
    let AggregationData::Distribution(dist) = data.rows()[0].data() else {
        panic!("expected distribution data");
    };

    // the trailing hour contains only large values, up to one sub-interval
    // of small ones at the boundary
    check!(dist.bucket_counts()[1] >= 48);
    check!(dist.bucket_counts()[0] <= 12);
    check!(dist.count() <= 60);
}

#[test]
fn sliding_sum_reduces_to_the_window() {
    let (collector, clock) = sliding_collector(Aggregation::Sum);

    for _ in 0..120 {
        collector.record(&TagSet::empty(), "latency", 2.0);
        clock.advance(MINUTE);
    }

    let data = collector.retrieve_view("trailing_hour").unwrap();
    let AggregationData::Sum(sum) = data.rows()[0].data() else {
        panic!("expected sum data");
    };
    check!(*sum <= 120.0);
    check!(*sum >= 96.0);
}
