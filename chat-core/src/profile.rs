//! User profile lookup consumed by the inbox.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::UserProfile;

/// Resolves a user id to its display profile.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Returns the profile, or [`ChatError::NotFound`](crate::ChatError::NotFound) for unknown users.
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile>;
}
