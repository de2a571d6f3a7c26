//! Inbox aggregation.
//!
//! One thread query, one unread query, then the counterpart profiles are
//! fetched concurrently and merged. A failed profile lookup degrades that
//! entry to a fallback profile instead of failing the whole inbox.

use std::sync::Arc;

use chat_core::{require_id, InboxEntry, ProfileDirectory, Result, UserProfile};
use futures::future::join_all;
use tracing::{debug, instrument, warn};

use crate::registry::ThreadRegistry;
use crate::unread::UnreadCounter;

#[derive(Clone)]
pub struct InboxAggregator {
    registry: ThreadRegistry,
    unread: UnreadCounter,
    profiles: Arc<dyn ProfileDirectory>,
}

impl InboxAggregator {
    pub fn new(
        registry: ThreadRegistry,
        unread: UnreadCounter,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            registry,
            unread,
            profiles,
        }
    }

    /// The user's threads with counterpart profile and unread count, most recent first.
    /// Empty when the user has no threads.
    #[instrument(skip(self))]
    pub async fn list_inbox_for_user(&self, user_id: &str) -> Result<Vec<InboxEntry>> {
        require_id("user id", user_id)?;

        let threads = self.registry.threads_for_user(user_id).await?;
        if threads.is_empty() {
            debug!(user_id, "Inbox is empty");
            return Ok(Vec::new());
        }
        let counts = self.unread.counts_for_user(user_id).await?;

        let lookups = threads.iter().map(|thread| {
            let counterpart = thread.other_participant(user_id).unwrap_or_default().to_string();
            let profiles = Arc::clone(&self.profiles);
            async move {
                let profile = profiles.get_profile(&counterpart).await;
                (counterpart, profile)
            }
        });
        let profiles = join_all(lookups).await;

        let mut entries: Vec<InboxEntry> = threads
            .into_iter()
            .zip(profiles)
            .map(|(thread, (counterpart, profile))| {
                let counterpart = match profile {
                    Ok(profile) => profile,
                    Err(e) => {
                        warn!(
                            thread_id = %thread.id,
                            counterpart = %counterpart,
                            error = %e,
                            "Profile lookup failed, using fallback profile"
                        );
                        UserProfile::fallback(&counterpart)
                    }
                };
                let unread_count = counts.get(&thread.id).copied().unwrap_or(0);
                InboxEntry {
                    thread,
                    counterpart,
                    unread_count,
                }
            })
            .collect();

        sort_inbox(&mut entries);
        debug!(user_id, count = entries.len(), "Inbox aggregated");
        Ok(entries)
    }
}

/// Most recent activity first; equal timestamps ordered by thread id.
pub fn sort_inbox(entries: &mut [InboxEntry]) {
    entries.sort_by(|a, b| {
        b.last_activity_at()
            .cmp(&a.last_activity_at())
            .then_with(|| a.thread.id.cmp(&b.thread.id))
    });
}
