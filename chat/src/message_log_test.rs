//! Unit tests for MessageLog.
//!
//! Covers validation, authorization, the last-message cache and listing.

use std::sync::Arc;

use chat_core::ChatError;
use docstore_inmemory::InMemoryDocumentStore;

use crate::message_log::{validate_text, MessageLog};
use crate::records::{MESSAGES, UNREAD};
use crate::registry::ThreadRegistry;

struct Fixture {
    store: InMemoryDocumentStore,
    registry: ThreadRegistry,
    log: MessageLog,
}

fn setup(max_len: usize) -> Fixture {
    let store = InMemoryDocumentStore::new();
    let shared = Arc::new(store.clone());
    Fixture {
        registry: ThreadRegistry::new(shared.clone()),
        log: MessageLog::new(shared, max_len),
        store,
    }
}

#[test]
fn test_validate_text() {
    assert!(validate_text("Hi", 10).is_ok());
    assert!(validate_text("0123456789", 10).is_ok());
    assert!(matches!(validate_text("", 10), Err(ChatError::Validation(_))));
    assert!(matches!(validate_text("  \n\t", 10), Err(ChatError::Validation(_))));
    assert!(matches!(validate_text("01234567890", 10), Err(ChatError::Validation(_))));
    // Length is counted in characters, not bytes.
    assert!(validate_text("ééééé", 5).is_ok());
}

#[tokio::test]
async fn test_append_updates_last_message_cache() {
    let f = setup(2000);
    let thread_id = f.registry.get_or_create_thread("alice", "bob", Some("L1")).await.unwrap();

    let message_id = f.log.append_message(&thread_id, "alice", "Hi").await.unwrap();

    let thread = f.registry.get_thread(&thread_id).await.unwrap();
    let messages = f.log.list_messages(&thread_id, "bob", None).await.unwrap();
    let last = thread.last_message.expect("last message cached");

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, message_id);
    assert_eq!(last.text, "Hi");
    assert_eq!(last.sender_id, "alice");
    assert_eq!(last.sent_at, messages[0].created_at);
    assert_eq!(thread.last_activity_at, messages[0].created_at);
    assert!(thread.last_activity_at > thread.created_at);
}

#[tokio::test]
async fn test_append_rejects_non_participant() {
    let f = setup(2000);
    let thread_id = f.registry.get_or_create_thread("alice", "bob", None).await.unwrap();

    let err = f
        .log
        .append_message(&thread_id, "mallory", "spam")
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::Authorization(_)));
    assert_eq!(f.store.len(MESSAGES).await, 0);
    assert_eq!(f.store.len(UNREAD).await, 0);
}

#[tokio::test]
async fn test_append_rejects_bad_text_before_writing() {
    let f = setup(5);
    let thread_id = f.registry.get_or_create_thread("alice", "bob", None).await.unwrap();

    let empty = f.log.append_message(&thread_id, "alice", "   ").await.unwrap_err();
    let long = f.log.append_message(&thread_id, "alice", "too long").await.unwrap_err();

    assert!(matches!(empty, ChatError::Validation(_)));
    assert!(matches!(long, ChatError::Validation(_)));
    assert_eq!(f.store.len(MESSAGES).await, 0);
}

#[tokio::test]
async fn test_append_to_missing_thread() {
    let f = setup(2000);
    let err = f.log.append_message("nope", "alice", "Hi").await.unwrap_err();
    assert!(matches!(err, ChatError::NotFound(_)));
}

#[tokio::test]
async fn test_list_messages_order_and_limit() {
    let f = setup(2000);
    let thread_id = f.registry.get_or_create_thread("alice", "bob", None).await.unwrap();

    for (sender, text) in [("alice", "one"), ("bob", "two"), ("alice", "three")] {
        f.log.append_message(&thread_id, sender, text).await.unwrap();
    }

    let all = f.log.list_messages(&thread_id, "alice", None).await.unwrap();
    let texts: Vec<&str> = all.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["one", "two", "three"]);

    let last_two = f.log.list_messages(&thread_id, "bob", Some(2)).await.unwrap();
    let texts: Vec<&str> = last_two.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["two", "three"]);

    let err = f
        .log
        .list_messages(&thread_id, "mallory", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Authorization(_)));
}
