//! # Core Types
//!
//! Domain types of the chat subsystem.
//!
//! ## ThreadKey
//!
//! The canonical (sorted pair, listing) triple identifying a conversation. Its
//! [`document_id`](ThreadKey::document_id) is deterministic, so creating a thread
//! is a single create-if-absent against that id.
//!
//! ## Thread / ChatMessage / UnreadMarker
//!
//! Persisted records, see the `chat` crate for their document layout.
//!
//! ## InboxEntry
//!
//! Derived view joining a thread with the counterpart's profile and unread count.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ChatError, Result};

/// Namespace for thread ids derived from [`ThreadKey`].
const THREAD_NAMESPACE: Uuid = Uuid::from_u128(0x6d61726b_6574_4368_6174_546872656164);

/// Canonical identity of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadKey {
    participants: [String; 2],
    listing_id: Option<String>,
}

impl ThreadKey {
    /// Builds the key for two users and an optional listing. Order of users does not matter.
    ///
    /// Fails with [`ChatError::Validation`] for blank ids or when both users are the same.
    pub fn new(user_a: &str, user_b: &str, listing_id: Option<&str>) -> Result<Self> {
        let user_a = require_id("user id", user_a)?;
        let user_b = require_id("user id", user_b)?;
        if user_a == user_b {
            return Err(ChatError::Validation(format!(
                "cannot open a thread with yourself ({})",
                user_a
            )));
        }
        let listing_id = listing_id
            .map(|l| require_id("listing id", l))
            .transpose()?
            .map(str::to_string);

        let participants = if user_a < user_b {
            [user_a.to_string(), user_b.to_string()]
        } else {
            [user_b.to_string(), user_a.to_string()]
        };
        Ok(Self {
            participants,
            listing_id,
        })
    }

    pub fn participants(&self) -> &[String; 2] {
        &self.participants
    }

    pub fn listing_id(&self) -> Option<&str> {
        self.listing_id.as_deref()
    }

    /// Deterministic thread id (UUID v5 over a length-prefixed encoding of the key).
    pub fn document_id(&self) -> String {
        let [a, b] = &self.participants;
        let mut canonical = format!("{}:{}|{}:{}|", a.len(), a, b.len(), b);
        match &self.listing_id {
            Some(listing) => canonical.push_str(&format!("{}:{}", listing.len(), listing)),
            None => canonical.push('-'),
        }
        Uuid::new_v5(&THREAD_NAMESPACE, canonical.as_bytes()).to_string()
    }
}

/// Rejects blank identifiers; returns the id unchanged otherwise.
pub fn require_id<'a>(what: &str, id: &'a str) -> Result<&'a str> {
    if id.trim().is_empty() {
        return Err(ChatError::Validation(format!("{} must not be empty", what)));
    }
    Ok(id)
}

/// Cached summary of the newest message in a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastMessage {
    pub text: String,
    pub sender_id: String,
    pub sent_at: DateTime<Utc>,
}

/// A conversation between exactly two users, optionally about one listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    /// Sorted participant ids.
    pub participants: [String; 2],
    pub listing_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub last_message: Option<LastMessage>,
}

impl Thread {
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }

    /// The participant that is not `user_id`, or `None` when `user_id` is not in the thread.
    pub fn other_participant(&self, user_id: &str) -> Option<&str> {
        let [a, b] = &self.participants;
        if a == user_id {
            Some(b.as_str())
        } else if b == user_id {
            Some(a.as_str())
        } else {
            None
        }
    }
}

/// One chat message. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub thread_id: String,
    pub sender_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Per (thread, participant) unread bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnreadMarker {
    pub thread_id: String,
    pub user_id: String,
    pub count: u64,
    pub last_read_at: Option<DateTime<Utc>>,
}

/// Display identity of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl UserProfile {
    /// Profile shown when the real one cannot be loaded: the id as name, no avatar.
    pub fn fallback(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            display_name: user_id.to_string(),
            avatar_url: None,
        }
    }
}

/// One row of a user's inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxEntry {
    pub thread: Thread,
    pub counterpart: UserProfile,
    pub unread_count: u64,
}

impl InboxEntry {
    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.thread.last_activity_at
    }

    pub fn last_message(&self) -> Option<&LastMessage> {
        self.thread.last_message.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_key_is_order_insensitive() {
        let ab = ThreadKey::new("alice", "bob", Some("L1")).unwrap();
        let ba = ThreadKey::new("bob", "alice", Some("L1")).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.document_id(), ba.document_id());
        assert_eq!(ab.participants(), &["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn test_thread_key_listing_changes_id() {
        let l1 = ThreadKey::new("alice", "bob", Some("L1")).unwrap();
        let l2 = ThreadKey::new("alice", "bob", Some("L2")).unwrap();
        let none = ThreadKey::new("alice", "bob", None).unwrap();
        assert_ne!(l1.document_id(), l2.document_id());
        assert_ne!(l1.document_id(), none.document_id());
    }

    #[test]
    fn test_thread_key_encoding_is_unambiguous() {
        let a = ThreadKey::new("a|b", "c", None).unwrap();
        let b = ThreadKey::new("a", "b|c", None).unwrap();
        assert_ne!(a.document_id(), b.document_id());
    }

    #[test]
    fn test_thread_key_rejects_self_chat_and_blank_ids() {
        assert!(matches!(
            ThreadKey::new("alice", "alice", None),
            Err(ChatError::Validation(_))
        ));
        assert!(matches!(
            ThreadKey::new(" ", "bob", None),
            Err(ChatError::Validation(_))
        ));
        assert!(matches!(
            ThreadKey::new("alice", "bob", Some("")),
            Err(ChatError::Validation(_))
        ));
    }

    #[test]
    fn test_other_participant() {
        let now = Utc::now();
        let thread = Thread {
            id: "t1".to_string(),
            participants: ["alice".to_string(), "bob".to_string()],
            listing_id: None,
            created_at: now,
            last_activity_at: now,
            last_message: None,
        };
        assert_eq!(thread.other_participant("alice"), Some("bob"));
        assert_eq!(thread.other_participant("bob"), Some("alice"));
        assert_eq!(thread.other_participant("carol"), None);
        assert!(thread.has_participant("bob"));
        assert!(!thread.has_participant("carol"));
    }
}
