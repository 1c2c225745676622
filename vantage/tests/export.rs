//! Delivery of view snapshots to subscribers through the export worker.

use assert2::check;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use vantage::{
    Aggregation, AggregationData, Collector, ExportWorker, Measure, TagSet, ViewData,
    ViewDescriptor, Window,
};

// long enough that only explicit flushes drive exports during a test
const QUIET: Duration = Duration::from_secs(3600);

fn collector() -> Arc<Collector> {
    let collector = Collector::new();
    collector
        .register_measure(Measure::new("requests", "handled requests", "1"))
        .unwrap();
    Arc::new(collector)
}

fn count_view(name: &str) -> ViewDescriptor {
    ViewDescriptor::new(name, "requests", vec![], Aggregation::Count, Window::Cumulative)
}

#[tokio::test]
async fn flush_delivers_one_snapshot_per_subscribed_view() {
    let collector = collector();
    let (tx, mut rx) = mpsc::channel::<ViewData>(16);
    collector
        .register_subscribed_view(count_view("exported"), tx)
        .unwrap();
    // a view without subscribers is polled, not pushed
    collector.register_view(count_view("pull_only")).unwrap();

    collector.record(&TagSet::empty(), "requests", 1.0);

    let worker = ExportWorker::spawn(collector.clone(), QUIET);
    worker.flush().await;

    let data = rx.try_recv().unwrap();
    check!(data.descriptor().name() == "exported");
    check!(data.rows()[0].data() == &AggregationData::Count(1));
    check!(rx.try_recv().is_err());
}

#[tokio::test]
async fn slow_subscriber_loses_snapshots_without_blocking() {
    let collector = collector();
    let (tx, mut rx) = mpsc::channel::<ViewData>(1);
    collector
        .register_subscribed_view(count_view("exported"), tx)
        .unwrap();

    let worker = ExportWorker::spawn(collector.clone(), QUIET);
    worker.flush().await;
    // the channel is now full; this snapshot is dropped
    worker.flush().await;

    check!(rx.try_recv().is_ok());
    check!(rx.try_recv().is_err());

    // the worker stays healthy and delivers again once there is room
    worker.flush().await;
    check!(rx.try_recv().is_ok());
}

#[tokio::test]
async fn closure_subscribers_receive_snapshots() {
    let collector = collector();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    collector
        .register_subscribed_view(count_view("exported"), move |data: ViewData| {
            sink.lock().unwrap().push(data);
        })
        .unwrap();

    collector.record(&TagSet::empty(), "requests", 1.0);
    collector.record(&TagSet::empty(), "requests", 1.0);

    let worker = ExportWorker::spawn(collector.clone(), QUIET);
    worker.flush().await;

    let received = received.lock().unwrap();
    check!(received.len() == 1);
    check!(received[0].rows()[0].data() == &AggregationData::Count(2));
}

#[tokio::test]
async fn dropping_the_worker_delivers_a_final_round() {
    let collector = collector();
    let (tx, mut rx) = mpsc::channel::<ViewData>(16);
    collector
        .register_subscribed_view(count_view("exported"), tx)
        .unwrap();
    collector.record(&TagSet::empty(), "requests", 1.0);

    let worker = ExportWorker::spawn(collector.clone(), QUIET);
    drop(worker);

    let data = rx.try_recv().unwrap();
    check!(data.rows()[0].data() == &AggregationData::Count(1));
}

#[tokio::test]
async fn unregistered_views_are_gone_from_the_export_round() {
    let collector = collector();
    let (tx, mut rx) = mpsc::channel::<ViewData>(16);
    collector
        .register_subscribed_view(count_view("exported"), tx)
        .unwrap();
    collector.record(&TagSet::empty(), "requests", 1.0);

    // aggregated but never exported; discarded by design
    collector.unregister_view("exported").unwrap();

    let worker = ExportWorker::spawn(collector.clone(), QUIET);
    worker.flush().await;
    check!(rx.try_recv().is_err());
}
