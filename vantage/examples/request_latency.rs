//! Record request latencies and read back two views of the same measure.
//!
//! Run with `cargo run --example request_latency`.

use std::time::Duration;

use vantage::{
    Aggregation, Collector, Measure, TagKey, TagSet, ViewDescriptor, Window,
};

fn main() -> Result<(), vantage::Error> {
    let collector = Collector::new();
    let method = TagKey::new("method");
    let status = TagKey::new("status");

    collector.register_measure(Measure::new("latency", "request latency", "ms"))?;
    collector.register_view(ViewDescriptor::new(
        "latency_by_method",
        "latency",
        vec![method.clone()],
        Aggregation::distribution([25.0, 100.0, 500.0]),
        Window::Cumulative,
    ))?;
    collector.register_view(ViewDescriptor::new(
        "recent_errors",
        "latency",
        vec![method.clone(), status.clone()],
        Aggregation::Count,
        Window::sliding(Duration::from_secs(600)),
    ))?;

    for (m, s, latency) in [
        ("GET", "200", 12.0),
        ("GET", "200", 48.0),
        ("POST", "200", 130.0),
        ("POST", "500", 641.0),
        ("GET", "200", 19.0),
    ] {
        let tags = TagSet::builder()
            .insert(method.clone(), m)
            .insert(status.clone(), s)
            .build();
        collector.record(&tags, "latency", latency);
    }

    for view in ["latency_by_method", "recent_errors"] {
        let data = collector.retrieve_view(view)?;
        println!("{view}:");
        for row in data.rows() {
            let tags: Vec<_> = row
                .tags()
                .iter()
                .map(|tag| format!("{}={}", tag.key.name(), tag.value))
                .collect();
            println!("  [{}] {:?}", tags.join(", "), row.data());
        }
    }

    Ok(())
}
