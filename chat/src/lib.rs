//! Chat crate: conversations between marketplace users over a document store.
//!
//! ## Modules
//!
//! - [`registry`] - ThreadRegistry (get-or-create per pair and listing)
//! - [`message_log`] - MessageLog (append, list)
//! - [`unread`] - UnreadCounter (increment on append, reset on read, recount)
//! - [`inbox`] - InboxAggregator (threads + profiles + unread, by recency)
//! - [`watch`] - InboxWatch (polling or change-feed refresh)
//! - [`profiles`] - StoreProfileDirectory (`users` collection)
//! - [`service`] - ChatService facade and ChatConfig
//! - [`records`] - document layout of the chat collections

pub mod inbox;
pub mod message_log;
pub mod profiles;
pub mod records;
pub mod registry;
pub mod service;
pub mod unread;
pub mod watch;

#[cfg(test)]
mod message_log_test;

pub use inbox::{sort_inbox, InboxAggregator};
pub use message_log::{validate_text, MessageLog, DEFAULT_MAX_MESSAGE_LEN};
pub use profiles::StoreProfileDirectory;
pub use registry::ThreadRegistry;
pub use service::{ChatConfig, ChatService};
pub use unread::UnreadCounter;
pub use watch::{InboxSnapshot, InboxWatch};
