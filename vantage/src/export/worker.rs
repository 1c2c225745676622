// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Background thread driving periodic export of subscribed views.

use std::sync::Arc;
use std::sync::mpsc::{RecvTimeoutError, Sender, channel};
use std::thread;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::collector::Collector;

enum Command {
    Flush(oneshot::Sender<()>),
}

/// Periodic reader that snapshots every subscribed view and delivers the
/// snapshots to the views' subscribers.
///
/// The worker runs on a dedicated thread. Dropping the handle delivers one
/// final round of snapshots for still-registered views, then stops the
/// thread. Data discarded by unregistering a view before that is lost, as
/// documented on [`Collector::unregister_view`].
pub struct ExportWorker {
    sender: Sender<Command>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ExportWorker {
    /// Start a worker exporting roughly every `period`.
    ///
    /// The period is clamped into the collector's advisory
    /// [`export_period`] hints as they are at spawn time.
    ///
    /// [`export_period`]: Collector::export_period
    pub fn spawn(collector: Arc<Collector>, period: Duration) -> Self {
        let period = collector.export_period().clamp(period);
        let (sender, receiver) = channel();

        let handle = thread::spawn(move || {
            loop {
                match receiver.recv_timeout(period) {
                    Ok(Command::Flush(ack)) => {
                        export_once(&collector);
                        let _ = ack.send(());
                    }
                    Err(RecvTimeoutError::Timeout) => export_once(&collector),
                    Err(RecvTimeoutError::Disconnected) => {
                        export_once(&collector);
                        break;
                    }
                }
            }
            tracing::debug!("export worker stopped");
        });

        Self {
            sender,
            handle: Some(handle),
        }
    }

    /// Force one export round now and wait until it has been delivered.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(Command::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}

impl Drop for ExportWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            // closing the channel makes the worker run a final export round
            let (sender, _) = channel();
            drop(std::mem::replace(&mut self.sender, sender));
            if handle.join().is_err() {
                tracing::error!("export worker panicked during shutdown");
            }
        }
    }
}

fn export_once(collector: &Collector) {
    for (data, subscribers) in collector.snapshot_subscribed() {
        for subscriber in &subscribers {
            subscriber.receive(data.clone());
        }
    }
}
