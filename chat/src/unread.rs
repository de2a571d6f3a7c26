//! Unread counters.
//!
//! Each (thread, participant) pair has one marker document holding a counter
//! and the last-read timestamp. Appends increment the recipient's counter in
//! the same batch as the message; reads reset it to zero.

use std::collections::HashMap;
use std::sync::Arc;

use chat_core::{require_id, Result, UnreadMarker};
use docstore_core::{timestamp_value, DocumentStore, Fields, Filter, WriteOp};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::records::{
    load_messages, load_thread, marker_from_doc, require_participant, unread_id, UNREAD,
};

/// Recount attempts before falling back to the stored counter.
const RECOUNT_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct UnreadCounter {
    store: Arc<dyn DocumentStore>,
}

impl UnreadCounter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Resets the user's counter on the thread and stamps the read time. Idempotent.
    #[instrument(skip(self))]
    pub async fn mark_read(&self, thread_id: &str, user_id: &str) -> Result<()> {
        require_id("thread id", thread_id)?;
        let thread = load_thread(self.store.as_ref(), thread_id).await?;
        require_participant(&thread, user_id)?;

        self.store
            .upsert(
                UNREAD,
                &unread_id(thread_id, user_id),
                Fields::new()
                    .set("threadId", thread_id)
                    .set("userId", user_id)
                    .set("count", 0)
                    .server_timestamp("lastReadAt"),
            )
            .await?;

        info!(thread_id, user_id, "Thread marked read");
        Ok(())
    }

    /// Messages in the thread the user has not read yet.
    pub async fn get_unread_count(&self, thread_id: &str, user_id: &str) -> Result<u64> {
        require_id("thread id", thread_id)?;
        let thread = load_thread(self.store.as_ref(), thread_id).await?;
        require_participant(&thread, user_id)?;

        let count = self
            .marker(thread_id, user_id)
            .await?
            .map(|m| m.count)
            .unwrap_or(0);
        debug!(thread_id, user_id, count, "Unread count read");
        Ok(count)
    }

    /// The stored marker, if the user ever received a message or read the thread.
    pub async fn marker(&self, thread_id: &str, user_id: &str) -> Result<Option<UnreadMarker>> {
        self.store
            .get(UNREAD, &unread_id(thread_id, user_id))
            .await?
            .as_ref()
            .map(marker_from_doc)
            .transpose()
    }

    /// Unread counts of every thread the user has a marker for, keyed by thread id.
    pub async fn counts_for_user(&self, user_id: &str) -> Result<HashMap<String, u64>> {
        require_id("user id", user_id)?;
        let docs = self
            .store
            .query(UNREAD, &[Filter::eq("userId", user_id)])
            .await?;
        docs.iter()
            .map(|d| marker_from_doc(d).map(|m| (m.thread_id, m.count)))
            .collect()
    }

    /// Sum of the user's unread counts across all threads.
    pub async fn total_unread(&self, user_id: &str) -> Result<u64> {
        let total: u64 = self.counts_for_user(user_id).await?.values().sum();
        debug!(user_id, total, "Total unread computed");
        Ok(total)
    }

    /// Recomputes the counter from the message log: messages from the other
    /// participant newer than the user's last read. Stores and returns it.
    ///
    /// The write is guarded on the `lastReadAt` seen before the scan, so a
    /// `mark_read` landing in between wins and the recount starts over.
    #[instrument(skip(self))]
    pub async fn recount(&self, thread_id: &str, user_id: &str) -> Result<u64> {
        require_id("thread id", thread_id)?;
        let thread = load_thread(self.store.as_ref(), thread_id).await?;
        require_participant(&thread, user_id)?;

        let marker_id = unread_id(thread_id, user_id);
        for attempt in 1..=RECOUNT_ATTEMPTS {
            let last_read_at = self
                .marker(thread_id, user_id)
                .await?
                .and_then(|m| m.last_read_at);
            let count = load_messages(self.store.as_ref(), thread_id)
                .await?
                .iter()
                .filter(|m| m.sender_id != user_id)
                .filter(|m| last_read_at.map_or(true, |read| m.created_at > read))
                .count() as u64;

            let guard = Filter::eq(
                "lastReadAt",
                last_read_at.map(timestamp_value).unwrap_or(Value::Null),
            );
            let op = WriteOp::upsert_if(
                UNREAD,
                marker_id.as_str(),
                vec![guard],
                Fields::new()
                    .set("threadId", thread_id)
                    .set("userId", user_id)
                    .set("count", count),
            );
            let applied = self
                .store
                .commit(vec![op])
                .await?
                .first()
                .map(|r| r.applied)
                .unwrap_or(false);

            if applied {
                info!(thread_id, user_id, count, "Unread counter recounted");
                return Ok(count);
            }
            debug!(thread_id, user_id, attempt, "Thread read during recount, retrying");
        }

        // Every attempt lost to a concurrent read; report the stored counter.
        let count = self
            .marker(thread_id, user_id)
            .await?
            .map(|m| m.count)
            .unwrap_or(0);
        warn!(thread_id, user_id, count, "Recount gave up, keeping stored counter");
        Ok(count)
    }
}
