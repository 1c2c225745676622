//! The collector: registration façade and recording entry point.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime};

use vantage_timesource::TimeSource;

use crate::error::Error;
use crate::export::{ViewData, ViewSubscriber};
use crate::measure::Measure;
use crate::registry::Registry;
use crate::tag::TagSet;
use crate::view::ViewDescriptor;

/// Advisory bounds on how often subscribed views should be exported.
///
/// The aggregation core never drives exports itself; these hints are read by
/// whatever owns the export loop, such as [`ExportWorker`].
///
/// [`ExportWorker`]: crate::ExportWorker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportPeriod {
    min: Duration,
    max: Duration,
}

impl ExportPeriod {
    /// Create hints; `min` must not exceed `max`.
    pub fn new(min: Duration, max: Duration) -> Result<Self, Error> {
        if min > max {
            return Err(Error::InvalidExportPeriod { min, max });
        }
        Ok(Self { min, max })
    }

    /// The shortest period an exporter should use.
    pub fn min(&self) -> Duration {
        self.min
    }

    /// The longest period an exporter should use.
    pub fn max(&self) -> Duration {
        self.max
    }

    pub(crate) fn clamp(&self, period: Duration) -> Duration {
        period.clamp(self.min, self.max)
    }
}

impl Default for ExportPeriod {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(1),
            max: Duration::from_secs(60),
        }
    }
}

/// The entry point of the instrumentation library.
///
/// A `Collector` owns measure and view registrations and routes recorded
/// measurements to every view bound to the measure. It is an explicit object
/// rather than process-global state: construct one at the composition root,
/// share it by reference (or `Arc`), and tests can run any number of
/// isolated collectors side by side.
///
/// All operations are synchronous, in-memory and safe to call from any
/// number of threads.
///
/// # Example
///
/// ```
/// use vantage::{Aggregation, Collector, Measure, TagKey, TagSet, ViewDescriptor, Window};
///
/// let collector = Collector::new();
/// let status = TagKey::new("status");
///
/// collector.register_measure(Measure::new("requests", "handled requests", "1"))?;
/// collector.register_view(ViewDescriptor::new(
///     "requests_by_status",
///     "requests",
///     vec![status.clone()],
///     Aggregation::Count,
///     Window::Cumulative,
/// ))?;
///
/// let tags = TagSet::builder().insert(status, "200").build();
/// collector.record(&tags, "requests", 1.0);
///
/// let data = collector.retrieve_view("requests_by_status")?;
/// assert_eq!(data.rows().len(), 1);
/// # Ok::<(), vantage::Error>(())
/// ```
pub struct Collector {
    time_source: TimeSource,
    measures: RwLock<HashMap<String, Measure>>,
    registry: Registry,
    export_period: Mutex<ExportPeriod>,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector {
    /// Create a collector using the system clock.
    pub fn new() -> Self {
        Self::with_time_source(TimeSource::System)
    }

    /// Create a collector reading time from `time_source`.
    ///
    /// Tests pass a fake clock here to make window rotation and snapshot
    /// timestamps deterministic.
    pub fn with_time_source(time_source: TimeSource) -> Self {
        Self {
            time_source,
            measures: RwLock::new(HashMap::new()),
            registry: Registry::default(),
            export_period: Mutex::new(ExportPeriod::default()),
        }
    }

    /// The time source measurements are stamped with.
    pub fn time_source(&self) -> &TimeSource {
        &self.time_source
    }

    /// Register a measure.
    ///
    /// Registering the identical descriptor again is an accepted no-op;
    /// a different descriptor under the same name is rejected and leaves
    /// the registered one untouched.
    pub fn register_measure(&self, measure: Measure) -> Result<(), Error> {
        let mut measures = self.measures.write().unwrap();
        match measures.entry(measure.name().to_owned()) {
            Entry::Occupied(existing) if *existing.get() == measure => Ok(()),
            Entry::Occupied(existing) => {
                Err(Error::DuplicateMeasure(existing.get().name().to_owned()))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(measure);
                Ok(())
            }
        }
    }

    /// Unregister a measure.
    ///
    /// Fails if the measure is unknown or while any view still aggregates
    /// it; unregister the views first.
    pub fn unregister_measure(&self, name: &str) -> Result<(), Error> {
        let mut measures = self.measures.write().unwrap();
        if !measures.contains_key(name) {
            return Err(Error::UnknownMeasure(name.to_owned()));
        }
        if let Some(view) = self.registry.view_bound_to(name) {
            return Err(Error::MeasureInUse {
                measure: name.to_owned(),
                view,
            });
        }
        measures.remove(name);
        Ok(())
    }

    /// Register a view.
    ///
    /// The measure it aggregates must already be registered. The view
    /// starts accumulating from this instant; aggregators for tag
    /// combinations are created lazily as samples arrive.
    pub fn register_view(&self, descriptor: ViewDescriptor) -> Result<(), Error> {
        self.register_view_inner(descriptor, None)
    }

    /// Register a view together with a subscriber that will receive its
    /// snapshots from the export path.
    pub fn register_subscribed_view(
        &self,
        descriptor: ViewDescriptor,
        subscriber: impl ViewSubscriber + 'static,
    ) -> Result<(), Error> {
        self.register_view_inner(descriptor, Some(Arc::new(subscriber)))
    }

    fn register_view_inner(
        &self,
        descriptor: ViewDescriptor,
        subscriber: Option<Arc<dyn ViewSubscriber>>,
    ) -> Result<(), Error> {
        let measures = self.measures.read().unwrap();
        if !measures.contains_key(descriptor.measure_name()) {
            return Err(Error::UnknownMeasure(descriptor.measure_name().to_owned()));
        }
        self.registry
            .register(descriptor, self.time_source.now(), subscriber)
    }

    /// Unregister a view, discarding all of its aggregated state and
    /// subscriptions without a final export.
    ///
    /// Re-registering the same name later starts a fresh aggregation with a
    /// new start time and an empty signature index; history is not restored.
    pub fn unregister_view(&self, name: &str) -> Result<(), Error> {
        self.registry.unregister(name)
    }

    /// Record one measurement, stamped with the collector's current time.
    ///
    /// The value is routed to every view bound to `measure`. Recording never
    /// fails: a measure with no registered views (or not registered at all)
    /// simply aggregates nowhere.
    pub fn record(&self, tags: &TagSet, measure: &str, value: f64) {
        self.record_at(self.time_source.now(), tags, measure, value);
    }

    /// Record one measurement with an explicit timestamp.
    pub fn record_at(&self, timestamp: SystemTime, tags: &TagSet, measure: &str, value: f64) {
        self.registry.record(tags, measure, value, timestamp);
    }

    /// Record several measurements sharing one tag set and timestamp.
    ///
    /// `measures` and `values` are parallel slices; on a length mismatch the
    /// whole batch is rejected and nothing is recorded.
    pub fn record_batch(
        &self,
        timestamp: SystemTime,
        tags: &TagSet,
        measures: &[&str],
        values: &[f64],
    ) -> Result<(), Error> {
        if measures.len() != values.len() {
            return Err(Error::BatchLengthMismatch {
                measures: measures.len(),
                values: values.len(),
            });
        }
        for (measure, value) in measures.iter().zip(values) {
            self.registry.record(tags, measure, *value, timestamp);
        }
        Ok(())
    }

    /// Snapshot one view by name.
    pub fn retrieve_view(&self, name: &str) -> Result<ViewData, Error> {
        self.registry.retrieve(name, self.time_source.now())
    }

    /// The advisory export period hints.
    pub fn export_period(&self) -> ExportPeriod {
        *self.export_period.lock().unwrap()
    }

    /// Replace the advisory export period hints.
    pub fn set_export_period(&self, period: ExportPeriod) {
        *self.export_period.lock().unwrap() = period;
    }

    pub(crate) fn snapshot_subscribed(&self) -> Vec<(ViewData, Vec<Arc<dyn ViewSubscriber>>)> {
        self.registry.snapshot_subscribed(self.time_source.now())
    }
}
