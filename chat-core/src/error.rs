use docstore_core::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    /// Bad input: blank ids, self-chat, empty or oversized text.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The caller is not a participant of the thread.
    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ChatError>;
