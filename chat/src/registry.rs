//! Thread registry: one conversation per (unordered pair, listing).
//!
//! The thread id is derived from the [`ThreadKey`], so "get or create" is a
//! read followed by a single create-if-absent on that id. Two racing first
//! contacts both land on the same document; the loser simply reads it back.

use std::sync::Arc;

use chat_core::{require_id, Result, Thread, ThreadKey};
use docstore_core::{DocumentStore, Fields, Filter};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::records::{load_thread, thread_from_doc, THREADS};

#[derive(Clone)]
pub struct ThreadRegistry {
    store: Arc<dyn DocumentStore>,
}

impl ThreadRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Returns the id of the thread between `user_a` and `user_b` about `listing_id`,
    /// creating it on first contact. Argument order of the users does not matter.
    #[instrument(skip(self))]
    pub async fn get_or_create_thread(
        &self,
        user_a: &str,
        user_b: &str,
        listing_id: Option<&str>,
    ) -> Result<String> {
        let key = ThreadKey::new(user_a, user_b, listing_id)?;
        let thread_id = key.document_id();

        if self.store.get(THREADS, &thread_id).await?.is_some() {
            debug!(thread_id = %thread_id, "Existing thread found");
            return Ok(thread_id);
        }

        let fields = Fields::new()
            .set("participants", key.participants().to_vec())
            .set("listingId", key.listing_id())
            .server_timestamp("createdAt")
            .server_timestamp("lastActivityAt")
            .set("lastMessage", Value::Null);

        let outcome = self.store.create_if_absent(THREADS, &thread_id, fields).await?;
        if outcome.created {
            info!(
                thread_id = %thread_id,
                listing_id = ?key.listing_id(),
                "Thread created"
            );
        } else {
            debug!(thread_id = %thread_id, "Thread created concurrently, reusing it");
        }
        Ok(thread_id)
    }

    /// Loads a thread; `NotFound` when the id is unknown.
    pub async fn get_thread(&self, thread_id: &str) -> Result<Thread> {
        require_id("thread id", thread_id)?;
        load_thread(self.store.as_ref(), thread_id).await
    }

    /// All threads `user_id` takes part in, in store order.
    pub async fn threads_for_user(&self, user_id: &str) -> Result<Vec<Thread>> {
        require_id("user id", user_id)?;
        let docs = self
            .store
            .query(THREADS, &[Filter::array_contains("participants", user_id)])
            .await?;
        debug!(user_id, count = docs.len(), "Loaded threads for user");
        docs.iter().map(thread_from_doc).collect()
    }
}
