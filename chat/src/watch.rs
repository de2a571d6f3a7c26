//! Inbox refresh: periodic polling or change-feed driven.
//!
//! Both modes run on a background task and deliver snapshots through
//! [`InboxWatch::next`]. Polling has a staleness bound equal to its interval.
//! Stopping a watch ends the task; a query already in flight completes and
//! its result is dropped.

use std::sync::Arc;
use std::time::Duration;

use chat_core::{InboxEntry, Result};
use docstore_core::{DocumentStore, Filter};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::inbox::InboxAggregator;
use crate::records::{THREADS, UNREAD};

pub type InboxSnapshot = Result<Vec<InboxEntry>>;

/// Shorter polling intervals are raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Handle to a running inbox refresh task.
pub struct InboxWatch {
    snapshots: mpsc::Receiver<InboxSnapshot>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl InboxWatch {
    /// Refreshes the user's inbox every `interval`, starting immediately.
    pub fn poll(inbox: InboxAggregator, user_id: impl Into<String>, interval: Duration) -> Self {
        let user_id = user_id.into();
        let interval = interval.max(MIN_POLL_INTERVAL);
        let (tx, snapshots) = mpsc::channel(1);
        let (shutdown, mut stop) = watch::channel(false);

        let task = tokio::spawn(async move {
            info!(user_id = %user_id, interval_ms = interval.as_millis() as u64, "Inbox polling started");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = stop.changed() => break,
                    _ = ticker.tick() => {}
                }
                let snapshot = inbox.list_inbox_for_user(&user_id).await;
                if !deliver(&tx, &mut stop, snapshot).await {
                    break;
                }
            }
            info!(user_id = %user_id, "Inbox polling stopped");
        });

        Self {
            snapshots,
            shutdown,
            task,
        }
    }

    /// Refreshes the user's inbox once now and again after every committed
    /// change to one of their threads or unread markers.
    pub fn subscribe(
        inbox: InboxAggregator,
        store: Arc<dyn DocumentStore>,
        user_id: impl Into<String>,
    ) -> Self {
        let user_id = user_id.into();
        let (tx, snapshots) = mpsc::channel(1);
        let (shutdown, mut stop) = watch::channel(false);

        // Subscribe before the first snapshot so no change falls in between.
        let mut threads = store.subscribe(
            THREADS,
            vec![Filter::array_contains("participants", user_id.as_str())],
        );
        let mut markers = store.subscribe(UNREAD, vec![Filter::eq("userId", user_id.as_str())]);

        let task = tokio::spawn(async move {
            info!(user_id = %user_id, "Inbox subscription started");
            loop {
                let snapshot = inbox.list_inbox_for_user(&user_id).await;
                if !deliver(&tx, &mut stop, snapshot).await {
                    break;
                }
                let alive = tokio::select! {
                    _ = stop.changed() => false,
                    changed = threads.next() => changed.is_some(),
                    changed = markers.next() => changed.is_some(),
                };
                if !alive {
                    break;
                }
            }
            info!(user_id = %user_id, "Inbox subscription stopped");
        });

        Self {
            snapshots,
            shutdown,
            task,
        }
    }

    /// Waits for the next snapshot. `None` once the watch has stopped.
    pub async fn next(&mut self) -> Option<InboxSnapshot> {
        self.snapshots.recv().await
    }

    /// Stops the task and waits for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        drop(self.snapshots);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Inbox watch task ended abnormally");
        }
    }
}

/// Sends a snapshot unless the watch was stopped meanwhile. Returns false when
/// the task should exit.
async fn deliver(
    tx: &mpsc::Sender<InboxSnapshot>,
    stop: &mut watch::Receiver<bool>,
    snapshot: InboxSnapshot,
) -> bool {
    let stopped = *stop.borrow();
    if stopped {
        debug!("Inbox watch stopped during refresh, discarding snapshot");
        return false;
    }
    if let Err(e) = &snapshot {
        warn!(error = %e, "Inbox refresh failed");
    }
    tokio::select! {
        sent = tx.send(snapshot) => sent.is_ok(),
        _ = stop.changed() => false,
    }
}
