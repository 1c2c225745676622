// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The outbound boundary: view snapshots and their consumers.
//!
//! Nothing in this crate serializes to a wire format. Exporters either pull
//! snapshots with [`Collector::retrieve_view`], or implement
//! [`ViewSubscriber`] and let an [`ExportWorker`] deliver periodically.
//!
//! [`Collector::retrieve_view`]: crate::Collector::retrieve_view
//! [`ExportWorker`]: crate::ExportWorker

use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::mpsc;

use crate::aggregator::AggregationData;
use crate::tag::TagSet;
use crate::view::ViewDescriptor;

mod worker;

pub use worker::ExportWorker;

/// One view's aggregated data over a time range.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewData {
    descriptor: Arc<ViewDescriptor>,
    start: SystemTime,
    end: SystemTime,
    rows: Vec<Row>,
}

impl ViewData {
    pub(crate) fn new(
        descriptor: Arc<ViewDescriptor>,
        start: SystemTime,
        end: SystemTime,
        rows: Vec<Row>,
    ) -> Self {
        Self {
            descriptor,
            start,
            end,
            rows,
        }
    }

    /// The descriptor of the view this data belongs to.
    pub fn descriptor(&self) -> &ViewDescriptor {
        &self.descriptor
    }

    /// When aggregation started. For cumulative views all data since this
    /// instant is included; sliding views only report their trailing window.
    pub fn start(&self) -> SystemTime {
        self.start
    }

    /// When the snapshot was taken.
    pub fn end(&self) -> SystemTime {
        self.end
    }

    /// One row per distinct tag combination, in canonical signature order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Find the row for an exact tag combination.
    pub fn row(&self, tags: &TagSet) -> Option<&Row> {
        self.rows.iter().find(|row| &row.tags == tags)
    }
}

/// Aggregated statistics for one tag combination.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub(crate) tags: TagSet,
    pub(crate) data: AggregationData,
}

impl Row {
    /// The tag combination, restricted to the view's columns.
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// The statistics recorded for this combination.
    pub fn data(&self) -> &AggregationData {
        &self.data
    }
}

/// Receives view snapshots from the export path.
///
/// Delivery must not block: the export path is shared by all subscribed
/// views. A consumer that cannot keep up should drop snapshots, never buffer
/// them indefinitely.
pub trait ViewSubscriber: Send + Sync {
    /// Deliver one snapshot.
    fn receive(&self, data: ViewData);
}

/// Channel-backed subscription. Snapshots are delivered with `try_send`; if
/// the channel is full the snapshot is dropped and a warning is logged.
impl ViewSubscriber for mpsc::Sender<ViewData> {
    fn receive(&self, data: ViewData) {
        match self.try_send(data) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(data)) => {
                tracing::warn!(
                    view = data.descriptor().name(),
                    "subscriber cannot keep up, dropping view snapshot"
                );
            }
            Err(mpsc::error::TrySendError::Closed(data)) => {
                tracing::debug!(
                    view = data.descriptor().name(),
                    "subscriber closed, dropping view snapshot"
                );
            }
        }
    }
}

impl<F> ViewSubscriber for F
where
    F: Fn(ViewData) + Send + Sync,
{
    fn receive(&self, data: ViewData) {
        self(data)
    }
}
