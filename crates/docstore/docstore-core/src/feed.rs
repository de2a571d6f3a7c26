//! # Change Feed
//!
//! In-process fan-out of committed document changes. Backends publish every
//! written document after a successful commit; [`Subscription`]s receive the
//! ones matching their collection and filters.

use tokio::sync::broadcast;
use tracing::warn;

use crate::document::Document;
use crate::filter::{matches_all, Filter};

const DEFAULT_CAPACITY: usize = 256;

/// A committed write.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub collection: String,
    pub document: Document,
}

/// Broadcast hub owned by a store backend.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes a change. Having no subscribers is not an error.
    pub fn publish(&self, collection: &str, document: Document) {
        let _ = self.sender.send(ChangeEvent {
            collection: collection.to_string(),
            document,
        });
    }

    pub fn subscribe(&self, collection: &str, filters: Vec<Filter>) -> Subscription {
        Subscription {
            collection: collection.to_string(),
            filters,
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Live stream of changed documents in one collection.
///
/// Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    collection: String,
    filters: Vec<Filter>,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Waits for the next matching document. Returns `None` once the store is gone.
    ///
    /// When the subscriber falls behind, skipped events are logged and dropped;
    /// consumers are expected to re-read state rather than rely on every event.
    pub async fn next(&mut self) -> Option<Document> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if event.collection == self.collection
                        && matches_all(&self.filters, &event.document)
                    {
                        return Some(event.document);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        collection = %self.collection,
                        skipped,
                        "Subscription lagged behind change feed"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
