//! Chat service: one handle wiring the components over an injected store.
//!
//! The process entry point owns the store and profile directory and passes
//! them in; nothing here is global.

use std::sync::Arc;
use std::time::Duration;

use chat_core::{ChatMessage, InboxEntry, ProfileDirectory, Result, Thread};
use docstore_core::DocumentStore;

use crate::inbox::InboxAggregator;
use crate::message_log::{MessageLog, DEFAULT_MAX_MESSAGE_LEN};
use crate::profiles::StoreProfileDirectory;
use crate::registry::ThreadRegistry;
use crate::unread::UnreadCounter;
use crate::watch::InboxWatch;

/// Tunables of the chat service.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Maximum message length in characters.
    pub max_message_len: usize,
    /// Interval used by [`ChatService::watch_inbox`].
    pub inbox_poll_interval: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
            inbox_poll_interval: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn DocumentStore>,
    registry: ThreadRegistry,
    messages: MessageLog,
    unread: UnreadCounter,
    inbox: InboxAggregator,
    config: ChatConfig,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        profiles: Arc<dyn ProfileDirectory>,
        config: ChatConfig,
    ) -> Self {
        let registry = ThreadRegistry::new(Arc::clone(&store));
        let messages = MessageLog::new(Arc::clone(&store), config.max_message_len);
        let unread = UnreadCounter::new(Arc::clone(&store));
        let inbox = InboxAggregator::new(registry.clone(), unread.clone(), profiles);
        Self {
            store,
            registry,
            messages,
            unread,
            inbox,
            config,
        }
    }

    /// Service whose profiles come from the same store's `users` collection.
    pub fn with_store_profiles(store: Arc<dyn DocumentStore>, config: ChatConfig) -> Self {
        let profiles = Arc::new(StoreProfileDirectory::new(Arc::clone(&store)));
        Self::new(store, profiles, config)
    }

    pub async fn get_or_create_thread(
        &self,
        user_a: &str,
        user_b: &str,
        listing_id: Option<&str>,
    ) -> Result<String> {
        self.registry.get_or_create_thread(user_a, user_b, listing_id).await
    }

    pub async fn get_thread(&self, thread_id: &str) -> Result<Thread> {
        self.registry.get_thread(thread_id).await
    }

    pub async fn append_message(&self, thread_id: &str, sender_id: &str, text: &str) -> Result<String> {
        self.messages.append_message(thread_id, sender_id, text).await
    }

    pub async fn list_messages(
        &self,
        thread_id: &str,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>> {
        self.messages.list_messages(thread_id, user_id, limit).await
    }

    pub async fn mark_read(&self, thread_id: &str, user_id: &str) -> Result<()> {
        self.unread.mark_read(thread_id, user_id).await
    }

    pub async fn get_unread_count(&self, thread_id: &str, user_id: &str) -> Result<u64> {
        self.unread.get_unread_count(thread_id, user_id).await
    }

    pub async fn total_unread(&self, user_id: &str) -> Result<u64> {
        self.unread.total_unread(user_id).await
    }

    pub async fn recount_unread(&self, thread_id: &str, user_id: &str) -> Result<u64> {
        self.unread.recount(thread_id, user_id).await
    }

    pub async fn list_inbox_for_user(&self, user_id: &str) -> Result<Vec<InboxEntry>> {
        self.inbox.list_inbox_for_user(user_id).await
    }

    /// Polls the user's inbox at the configured interval.
    pub fn watch_inbox(&self, user_id: &str) -> InboxWatch {
        self.poll_inbox(user_id, self.config.inbox_poll_interval)
    }

    pub fn poll_inbox(&self, user_id: &str, interval: Duration) -> InboxWatch {
        InboxWatch::poll(self.inbox.clone(), user_id, interval)
    }

    /// Pushes a fresh inbox whenever the store reports a relevant change.
    pub fn subscribe_inbox(&self, user_id: &str) -> InboxWatch {
        InboxWatch::subscribe(self.inbox.clone(), Arc::clone(&self.store), user_id)
    }
}
