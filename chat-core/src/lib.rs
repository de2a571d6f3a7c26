//! # chat-core
//!
//! Core types and traits for the marketplace chat: [`ThreadKey`], [`Thread`],
//! [`ChatMessage`], [`UnreadMarker`], [`InboxEntry`], the [`ProfileDirectory`]
//! collaborator, the [`ChatError`] taxonomy and tracing initialization.
//! Store-agnostic; used by the `chat` crate and the CLI.

pub mod error;
pub mod logger;
pub mod profile;
pub mod types;

pub use error::{ChatError, Result};
pub use logger::init_tracing;
pub use profile::ProfileDirectory;
pub use types::{
    require_id, ChatMessage, InboxEntry, LastMessage, Thread, ThreadKey, UnreadMarker,
    UserProfile,
};
