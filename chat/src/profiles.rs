//! Profile directory backed by the `users` collection.

use std::sync::Arc;

use async_trait::async_trait;
use chat_core::{require_id, ChatError, ProfileDirectory, Result, UserProfile};
use docstore_core::{DocumentStore, Fields};
use tracing::info;

use crate::records::{profile_from_doc, USERS};

#[derive(Clone)]
pub struct StoreProfileDirectory {
    store: Arc<dyn DocumentStore>,
}

impl StoreProfileDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Creates or replaces a user's profile.
    pub async fn put_profile(&self, profile: &UserProfile) -> Result<()> {
        require_id("user id", &profile.user_id)?;
        if profile.display_name.trim().is_empty() {
            return Err(ChatError::Validation("display name must not be empty".to_string()));
        }
        self.store
            .upsert(
                USERS,
                &profile.user_id,
                Fields::new()
                    .set("displayName", profile.display_name.as_str())
                    .set("avatarUrl", profile.avatar_url.as_deref()),
            )
            .await?;
        info!(user_id = %profile.user_id, "Profile saved");
        Ok(())
    }
}

#[async_trait]
impl ProfileDirectory for StoreProfileDirectory {
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile> {
        let doc = self
            .store
            .get(USERS, user_id)
            .await?
            .ok_or_else(|| ChatError::NotFound(format!("profile {}", user_id)))?;
        profile_from_doc(&doc)
    }
}
