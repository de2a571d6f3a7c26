//! # In-Memory Document Store
//!
//! This crate provides an in-memory implementation of the `DocumentStore` trait
//! from `docstore-core`.
//!
//! ## InMemoryDocumentStore
//!
//! Simple in-process storage for tests, demos and single-process deployments.
//!
//! **Advantages**:
//! - No I/O, no setup
//! - Batches are atomic under a single write lock
//!
//! **Limitations**:
//! - Data is lost on restart
//! - Queries scan the whole collection
//!
//! ## Example
//!
//! ```rust
//! use docstore_core::{DocumentStore, Fields, Filter};
//! use docstore_inmemory::InMemoryDocumentStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), docstore_core::StoreError> {
//!     let store = InMemoryDocumentStore::new();
//!
//!     store
//!         .upsert("unread", "t1:bob", Fields::new().set("userId", "bob").increment("count", 1))
//!         .await?;
//!
//!     let docs = store.query("unread", &[Filter::eq("userId", "bob")]).await?;
//!     assert_eq!(docs.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Thread Safety
//!
//! The store uses `Arc<RwLock<>>` to ensure thread-safe concurrent access.

use docstore_core::{
    matches_all, ChangeFeed, Document, DocumentStore, Filter, ServerClock, StoreError,
    Subscription, WriteOp, WriteResult,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

type Collection = BTreeMap<String, Document>;

/// In-memory document store.
#[derive(Debug, Clone)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
    clock: Arc<ServerClock>,
    feed: ChangeFeed,
}

impl InMemoryDocumentStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            clock: Arc::new(ServerClock::new()),
            feed: ChangeFeed::new(),
        }
    }

    /// Returns the number of documents in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map(|c| c.len()).unwrap_or(0)
    }

    /// Returns true if no collection holds any document.
    pub async fn is_empty(&self) -> bool {
        let collections = self.collections.read().await;
        collections.values().all(|c| c.is_empty())
    }

    /// Clears all collections.
    pub async fn clear(&self) {
        let mut collections = self.collections.write().await;
        collections.clear();
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        let found = collections.get(collection).and_then(|c| c.get(id)).cloned();
        debug!(collection, id, found = found.is_some(), "In-memory store get");
        Ok(found)
    }

    async fn query(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let results: Vec<Document> = collections
            .get(collection)
            .map(|c| {
                c.values()
                    .filter(|d| matches_all(filters, d))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        debug!(
            collection,
            filters = filters.len(),
            count = results.len(),
            "In-memory store query returned"
        );
        Ok(results)
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> Result<Vec<WriteResult>, StoreError> {
        let mut collections = self.collections.write().await;
        let now = self.clock.now();

        // Staged writes shadow stored documents so later ops see earlier ones.
        let mut staged: Vec<(String, Document)> = Vec::new();
        let mut results = Vec::with_capacity(ops.len());

        for op in &ops {
            let collection = op.collection();
            let id = op
                .id()
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string());

            let existing = staged
                .iter()
                .rev()
                .find(|(c, d)| c == collection && d.id == id)
                .map(|(_, d)| d.clone())
                .or_else(|| collections.get(collection).and_then(|c| c.get(&id)).cloned());

            let resolved = op.resolve(&id, existing, now)?;
            if resolved.changed {
                staged.push((collection.to_string(), resolved.result.document.clone()));
            }
            results.push(resolved.result);
        }

        for (collection, document) in &staged {
            collections
                .entry(collection.clone())
                .or_default()
                .insert(document.id.clone(), document.clone());
        }
        drop(collections);

        debug!(ops = ops.len(), written = staged.len(), "In-memory store commit applied");
        for (collection, document) in staged {
            self.feed.publish(&collection, document);
        }
        Ok(results)
    }

    fn subscribe(&self, collection: &str, filters: Vec<Filter>) -> Subscription {
        self.feed.subscribe(collection, filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore_core::{parse_timestamp, Fields};
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryDocumentStore::new();
        let doc = store
            .create("messages", Fields::new().set("text", "Hi"))
            .await
            .unwrap();

        let found = store.get("messages", &doc.id).await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().fields["text"], json!("Hi"));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let store = InMemoryDocumentStore::new();
        let found = store.get("messages", "missing").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_create_if_absent_is_idempotent() {
        let store = InMemoryDocumentStore::new();

        let first = store
            .create_if_absent("threads", "t1", Fields::new().set("n", 1))
            .await
            .unwrap();
        let second = store
            .create_if_absent("threads", "t1", Fields::new().set("n", 2))
            .await
            .unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(second.document.fields["n"], json!(1));
        assert_eq!(store.len("threads").await, 1);
    }

    #[tokio::test]
    async fn test_update_missing_fails() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .update("threads", "nope", Fields::new().set("n", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_batch_writes_nothing() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .commit(vec![
                WriteOp::create("messages", Fields::new().set("text", "Hi")),
                WriteOp::update("threads", "missing", Fields::new().set("n", 1)),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_batch_shares_server_timestamp() {
        let store = InMemoryDocumentStore::new();
        let results = store
            .commit(vec![
                WriteOp::create("messages", Fields::new().server_timestamp("createdAt")),
                WriteOp::upsert("threads", "t1", Fields::new().server_timestamp("lastActivityAt")),
            ])
            .await
            .unwrap();

        let a = parse_timestamp(&results[0].document.fields["createdAt"]);
        let b = parse_timestamp(&results[1].document.fields["lastActivityAt"]);
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_batch_ops_see_earlier_writes() {
        let store = InMemoryDocumentStore::new();
        store
            .commit(vec![
                WriteOp::upsert("unread", "u1", Fields::new().increment("count", 1)),
                WriteOp::upsert("unread", "u1", Fields::new().increment("count", 1)),
            ])
            .await
            .unwrap();

        let doc = store.get("unread", "u1").await.unwrap().unwrap();
        assert_eq!(doc.fields["count"], json!(2));
    }

    #[tokio::test]
    async fn test_query_filters() {
        let store = InMemoryDocumentStore::new();
        store
            .upsert("threads", "t1", Fields::new().set("participants", json!(["alice", "bob"])))
            .await
            .unwrap();
        store
            .upsert("threads", "t2", Fields::new().set("participants", json!(["bob", "carol"])))
            .await
            .unwrap();

        let bob = store
            .query("threads", &[Filter::array_contains("participants", "bob")])
            .await
            .unwrap();
        let alice = store
            .query("threads", &[Filter::array_contains("participants", "alice")])
            .await
            .unwrap();
        let none = store.query("other", &[]).await.unwrap();

        assert_eq!(bob.len(), 2);
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].id, "t1");
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_receives_committed_changes() {
        let store = InMemoryDocumentStore::new();
        let mut sub = store.subscribe("unread", vec![Filter::eq("userId", "bob")]);

        store
            .upsert("unread", "t1:alice", Fields::new().set("userId", "alice"))
            .await
            .unwrap();
        store
            .upsert("unread", "t1:bob", Fields::new().set("userId", "bob"))
            .await
            .unwrap();

        let changed = sub.next().await.unwrap();
        assert_eq!(changed.id, "t1:bob");
    }

    #[tokio::test]
    async fn test_len_is_empty_and_clear() {
        let store = InMemoryDocumentStore::new();
        assert!(store.is_empty().await);

        store.create("messages", Fields::new()).await.unwrap();
        assert_eq!(store.len("messages").await, 1);
        assert!(!store.is_empty().await);

        store.clear().await;
        assert_eq!(store.len("messages").await, 0);
    }

    #[test]
    fn test_clones_share_state() {
        let store = InMemoryDocumentStore::default();
        let handle = store.clone();

        tokio_test::block_on(async {
            handle
                .upsert("users", "alice", Fields::new().set("displayName", "Alice"))
                .await
                .unwrap();
            assert_eq!(store.len("users").await, 1);
        });
    }

    #[tokio::test]
    async fn test_upsert_if_skips_when_guard_fails() {
        let store = InMemoryDocumentStore::new();
        store
            .upsert(
                "unread",
                "t1:bob",
                Fields::new()
                    .set("count", 0)
                    .set("lastReadAt", "2024-05-01T10:00:00.000000Z"),
            )
            .await
            .unwrap();

        let stale = vec![Filter::eq("lastReadAt", serde_json::Value::Null)];
        let results = store
            .commit(vec![WriteOp::upsert_if(
                "unread",
                "t1:bob",
                stale,
                Fields::new().set("count", 3),
            )])
            .await
            .unwrap();
        assert!(!results[0].applied);

        let current = vec![Filter::eq("lastReadAt", "2024-05-01T10:00:00.000000Z")];
        let results = store
            .commit(vec![WriteOp::upsert_if(
                "unread",
                "t1:bob",
                current,
                Fields::new().set("count", 2),
            )])
            .await
            .unwrap();
        assert!(results[0].applied);

        let doc = store.get("unread", "t1:bob").await.unwrap().unwrap();
        assert_eq!(doc.fields["count"], json!(2));
    }
}
