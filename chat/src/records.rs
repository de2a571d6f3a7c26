//! Document layout of the chat collections and conversions to domain types.
//!
//! | collection | id | fields |
//! |---|---|---|
//! | `threads` | [`ThreadKey::document_id`](chat_core::ThreadKey::document_id) | `participants`, `listingId`, `createdAt`, `lastActivityAt`, `lastMessage` |
//! | `messages` | random | `threadId`, `senderId`, `text`, `createdAt` |
//! | `unread` | `<threadId>:<userId>` | `threadId`, `userId`, `count`, `lastReadAt` |
//! | `users` | user id | `displayName`, `avatarUrl` |

use chat_core::{
    ChatError, ChatMessage, LastMessage, Result, Thread, UnreadMarker, UserProfile,
};
use chrono::{DateTime, Utc};
use docstore_core::{Document, DocumentStore, Filter};
use serde::Deserialize;

pub const THREADS: &str = "threads";
pub const MESSAGES: &str = "messages";
pub const UNREAD: &str = "unread";
pub const USERS: &str = "users";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadFields {
    participants: [String; 2],
    #[serde(default)]
    listing_id: Option<String>,
    created_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    #[serde(default)]
    last_message: Option<LastMessageFields>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LastMessageFields {
    text: String,
    sender_id: String,
    sent_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageFields {
    thread_id: String,
    sender_id: String,
    text: String,
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnreadFields {
    thread_id: String,
    user_id: String,
    #[serde(default)]
    count: i64,
    #[serde(default)]
    last_read_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileFields {
    display_name: String,
    #[serde(default)]
    avatar_url: Option<String>,
}

/// Id of the unread marker document for (thread, user).
pub fn unread_id(thread_id: &str, user_id: &str) -> String {
    format!("{}:{}", thread_id, user_id)
}

pub fn thread_from_doc(doc: &Document) -> Result<Thread> {
    let f: ThreadFields = doc.decode()?;
    Ok(Thread {
        id: doc.id.clone(),
        participants: f.participants,
        listing_id: f.listing_id,
        created_at: f.created_at,
        last_activity_at: f.last_activity_at,
        last_message: f.last_message.map(|m| LastMessage {
            text: m.text,
            sender_id: m.sender_id,
            sent_at: m.sent_at,
        }),
    })
}

pub fn message_from_doc(doc: &Document) -> Result<ChatMessage> {
    let f: MessageFields = doc.decode()?;
    Ok(ChatMessage {
        id: doc.id.clone(),
        thread_id: f.thread_id,
        sender_id: f.sender_id,
        text: f.text,
        created_at: f.created_at,
    })
}

/// Counters are clamped at zero when read.
pub fn marker_from_doc(doc: &Document) -> Result<UnreadMarker> {
    let f: UnreadFields = doc.decode()?;
    Ok(UnreadMarker {
        thread_id: f.thread_id,
        user_id: f.user_id,
        count: u64::try_from(f.count).unwrap_or(0),
        last_read_at: f.last_read_at,
    })
}

pub fn profile_from_doc(doc: &Document) -> Result<UserProfile> {
    let f: ProfileFields = doc.decode()?;
    Ok(UserProfile {
        user_id: doc.id.clone(),
        display_name: f.display_name,
        avatar_url: f.avatar_url,
    })
}

/// Loads a thread or fails with `NotFound`.
pub async fn load_thread(store: &dyn DocumentStore, thread_id: &str) -> Result<Thread> {
    let doc = store
        .get(THREADS, thread_id)
        .await?
        .ok_or_else(|| ChatError::NotFound(format!("thread {}", thread_id)))?;
    thread_from_doc(&doc)
}

/// Every message of a thread in chronological order (ties by id).
pub async fn load_messages(store: &dyn DocumentStore, thread_id: &str) -> Result<Vec<ChatMessage>> {
    let docs = store
        .query(MESSAGES, &[Filter::eq("threadId", thread_id)])
        .await?;
    let mut messages = docs
        .iter()
        .map(message_from_doc)
        .collect::<Result<Vec<_>>>()?;
    messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(messages)
}

/// Fails with `Authorization` unless `user_id` takes part in `thread`.
pub fn require_participant(thread: &Thread, user_id: &str) -> Result<()> {
    if thread.has_participant(user_id) {
        Ok(())
    } else {
        Err(ChatError::Authorization(format!(
            "{} is not a participant of thread {}",
            user_id, thread.id
        )))
    }
}
