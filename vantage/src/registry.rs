//! The view registry: per-view signature indexes and snapshot assembly.
//!
//! Locking discipline, per view: the signature index sits behind a `RwLock`
//! and every aggregator behind its own `Mutex`. Recording an existing
//! signature takes the index read lock plus that one aggregator's lock, so
//! unrelated signatures never contend. A first-seen signature upgrades to
//! the index write lock and creates its aggregator exactly once; the first
//! sample is applied before the write lock is released, so readers never
//! observe an empty aggregator. Snapshot readers take the read lock and each
//! aggregator's lock in turn and therefore never see a torn multi-field
//! update.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::SystemTime;

use crate::aggregator::Aggregator;
use crate::error::Error;
use crate::export::{Row, ViewData, ViewSubscriber};
use crate::key::{Signature, SignatureBuf, project_into};
use crate::tag::TagSet;
use crate::view::ViewDescriptor;

pub(crate) struct ViewState {
    descriptor: Arc<ViewDescriptor>,
    start: SystemTime,
    rows: RwLock<hashbrown::HashMap<Signature, Mutex<Aggregator>>>,
    subscribers: Mutex<Vec<Arc<dyn ViewSubscriber>>>,
}

impl ViewState {
    fn new(descriptor: ViewDescriptor, start: SystemTime) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            start,
            rows: RwLock::new(hashbrown::HashMap::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    fn add_sample(&self, tags: &TagSet, value: f64, timestamp: SystemTime) {
        let mut signature = SignatureBuf::new();
        project_into(tags, self.descriptor.columns(), &mut signature);

        {
            let rows = self.rows.read().unwrap();
            if let Some(aggregator) = rows.get(signature.as_slice()) {
                aggregator.lock().unwrap().add_sample(value, timestamp);
                return;
            }
        }

        // First sample for this signature. The owned key is only allocated
        // if the entry is still vacant after re-checking under the write
        // lock, so racing recorders create the aggregator exactly once.
        let mut rows = self.rows.write().unwrap();
        rows.entry_ref(signature.as_slice())
            .or_insert_with(|| Mutex::new(Aggregator::new(&self.descriptor)))
            .lock()
            .unwrap()
            .add_sample(value, timestamp);
    }

    fn snapshot(&self, end: SystemTime) -> ViewData {
        let rows = self.rows.read().unwrap();
        let mut entries: Vec<_> = rows
            .iter()
            .map(|(signature, aggregator)| {
                let data = aggregator
                    .lock()
                    .unwrap()
                    .snapshot(self.descriptor.aggregation(), end);
                (signature.clone(), data)
            })
            .collect();
        drop(rows);

        entries.sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));
        let rows = entries
            .into_iter()
            .map(|(signature, data)| Row {
                tags: signature.decode(self.descriptor.columns()),
                data,
            })
            .collect();
        ViewData::new(self.descriptor.clone(), self.start, end, rows)
    }

    fn subscribers(&self) -> Vec<Arc<dyn ViewSubscriber>> {
        self.subscribers.lock().unwrap().clone()
    }
}

/// Owns every registered view and routes measurements to their aggregators.
#[derive(Default)]
pub(crate) struct Registry {
    views: RwLock<HashMap<String, Arc<ViewState>>>,
    by_measure: RwLock<HashMap<String, Vec<Arc<ViewState>>>>,
}

impl Registry {
    pub(crate) fn register(
        &self,
        descriptor: ViewDescriptor,
        start: SystemTime,
        subscriber: Option<Arc<dyn ViewSubscriber>>,
    ) -> Result<(), Error> {
        descriptor.validate()?;

        let mut views = self.views.write().unwrap();
        if views.contains_key(descriptor.name()) {
            return Err(Error::DuplicateView(descriptor.name().to_owned()));
        }

        let state = Arc::new(ViewState::new(descriptor, start));
        if let Some(subscriber) = subscriber {
            state.subscribers.lock().unwrap().push(subscriber);
        }
        views.insert(state.descriptor.name().to_owned(), state.clone());
        self.by_measure
            .write()
            .unwrap()
            .entry(state.descriptor.measure_name().to_owned())
            .or_default()
            .push(state);
        Ok(())
    }

    /// Drop the view and everything it accumulated. Aggregated but not yet
    /// exported data is discarded, not flushed.
    pub(crate) fn unregister(&self, name: &str) -> Result<(), Error> {
        let mut views = self.views.write().unwrap();
        let state = views
            .remove(name)
            .ok_or_else(|| Error::UnknownView(name.to_owned()))?;

        let mut by_measure = self.by_measure.write().unwrap();
        if let Some(bound) = by_measure.get_mut(state.descriptor.measure_name()) {
            bound.retain(|other| !Arc::ptr_eq(other, &state));
            if bound.is_empty() {
                by_measure.remove(state.descriptor.measure_name());
            }
        }
        Ok(())
    }

    pub(crate) fn record(
        &self,
        tags: &TagSet,
        measure_name: &str,
        value: f64,
        timestamp: SystemTime,
    ) {
        let by_measure = self.by_measure.read().unwrap();
        let Some(bound) = by_measure.get(measure_name) else {
            return;
        };
        for state in bound {
            state.add_sample(tags, value, timestamp);
        }
    }

    pub(crate) fn retrieve(&self, name: &str, now: SystemTime) -> Result<ViewData, Error> {
        let views = self.views.read().unwrap();
        let state = views
            .get(name)
            .ok_or_else(|| Error::UnknownView(name.to_owned()))?;
        Ok(state.snapshot(now))
    }

    /// Name of one view bound to `measure_name`, if any.
    pub(crate) fn view_bound_to(&self, measure_name: &str) -> Option<String> {
        let by_measure = self.by_measure.read().unwrap();
        by_measure
            .get(measure_name)?
            .first()
            .map(|state| state.descriptor.name().to_owned())
    }

    /// Snapshot every view that has at least one subscriber, paired with the
    /// subscribers to deliver to.
    pub(crate) fn snapshot_subscribed(
        &self,
        now: SystemTime,
    ) -> Vec<(ViewData, Vec<Arc<dyn ViewSubscriber>>)> {
        let views = self.views.read().unwrap();
        let states: Vec<_> = views.values().cloned().collect();
        drop(views);

        states
            .into_iter()
            .filter_map(|state| {
                let subscribers = state.subscribers();
                if subscribers.is_empty() {
                    return None;
                }
                Some((state.snapshot(now), subscribers))
            })
            .collect()
    }
}
