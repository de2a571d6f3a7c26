//! Store error types.
//!
//! Returned by every [`DocumentStore`](crate::DocumentStore) backend.

use thiserror::Error;

/// Errors that can occur when using document store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid field path: {0}")]
    InvalidPath(String),
}

impl StoreError {
    /// `NotFound` for a document addressed by collection and id.
    pub fn not_found(collection: &str, id: &str) -> Self {
        StoreError::NotFound(format!("{}/{}", collection, id))
    }

    /// `AlreadyExists` for a document addressed by collection and id.
    pub fn already_exists(collection: &str, id: &str) -> Self {
        StoreError::AlreadyExists(format!("{}/{}", collection, id))
    }
}
