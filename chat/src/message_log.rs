//! Message append log.
//!
//! Appending writes the message, refreshes the thread's last-message cache
//! and bumps the recipient's unread counter in one atomic store batch.

use std::sync::Arc;

use chat_core::{require_id, ChatError, ChatMessage, Result};
use docstore_core::{DocumentStore, Fields, StoreError, WriteOp};
use tracing::{debug, info, instrument};

use crate::records::{
    load_messages, load_thread, require_participant, unread_id, MESSAGES, THREADS, UNREAD,
};

/// Default maximum message length, in characters.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 2000;

#[derive(Clone)]
pub struct MessageLog {
    store: Arc<dyn DocumentStore>,
    max_message_len: usize,
}

impl MessageLog {
    pub fn new(store: Arc<dyn DocumentStore>, max_message_len: usize) -> Self {
        Self {
            store,
            max_message_len,
        }
    }

    pub fn max_message_len(&self) -> usize {
        self.max_message_len
    }

    /// Appends `text` from `sender_id` to the thread and returns the new message id.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn append_message(&self, thread_id: &str, sender_id: &str, text: &str) -> Result<String> {
        validate_text(text, self.max_message_len)?;
        require_id("thread id", thread_id)?;
        require_id("sender id", sender_id)?;

        let thread = load_thread(self.store.as_ref(), thread_id).await?;
        require_participant(&thread, sender_id)?;
        let recipient = thread
            .other_participant(sender_id)
            .ok_or_else(|| ChatError::Authorization(sender_id.to_string()))?;

        let ops = vec![
            WriteOp::create(
                MESSAGES,
                Fields::new()
                    .set("threadId", thread_id)
                    .set("senderId", sender_id)
                    .set("text", text)
                    .server_timestamp("createdAt"),
            ),
            WriteOp::update(
                THREADS,
                thread_id,
                Fields::new()
                    .set("lastMessage.text", text)
                    .set("lastMessage.senderId", sender_id)
                    .server_timestamp("lastMessage.sentAt")
                    .server_timestamp("lastActivityAt"),
            ),
            WriteOp::upsert(
                UNREAD,
                unread_id(thread_id, recipient),
                Fields::new()
                    .set("threadId", thread_id)
                    .set("userId", recipient)
                    .increment("count", 1),
            ),
        ];

        let results = self.store.commit(ops).await?;
        let message_id = results
            .first()
            .map(|r| r.document.id.clone())
            .ok_or_else(|| StoreError::Backend("empty commit result".to_string()))?;

        info!(
            thread_id,
            sender_id,
            recipient,
            message_id = %message_id,
            "Message appended"
        );
        Ok(message_id)
    }

    /// The newest `limit` messages of a thread (all when `None`), oldest first.
    /// Only participants may read a thread.
    pub async fn list_messages(
        &self,
        thread_id: &str,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>> {
        require_id("thread id", thread_id)?;
        let thread = load_thread(self.store.as_ref(), thread_id).await?;
        require_participant(&thread, user_id)?;

        let mut messages = load_messages(self.store.as_ref(), thread_id).await?;
        if let Some(limit) = limit {
            let skip = messages.len().saturating_sub(limit);
            messages.drain(..skip);
        }
        debug!(thread_id, count = messages.len(), "Listed messages");
        Ok(messages)
    }
}

/// Rejects blank text and text longer than `max_len` characters.
pub fn validate_text(text: &str, max_len: usize) -> Result<()> {
    if text.trim().is_empty() {
        return Err(ChatError::Validation("message text must not be empty".to_string()));
    }
    let len = text.chars().count();
    if len > max_len {
        return Err(ChatError::Validation(format!(
            "message text is {} characters, maximum is {}",
            len, max_len
        )));
    }
    Ok(())
}
