//! End-to-end chat behaviour over the in-memory store.
//!
//! Walks the buyer/seller conversation flow and checks the thread,
//! message, unread and inbox properties after each step.

mod common;

use chat_core::ChatError;
use common::setup;

#[tokio::test]
async fn test_buyer_seller_conversation() {
    let chat = setup().await;
    let svc = &chat.service;

    // Buyer opens the conversation about a listing.
    let thread_id = svc.get_or_create_thread("alice", "bob", Some("L1")).await.unwrap();
    let again = svc.get_or_create_thread("bob", "alice", Some("L1")).await.unwrap();
    assert_eq!(thread_id, again);

    svc.append_message(&thread_id, "alice", "Hi").await.unwrap();
    assert_eq!(svc.get_unread_count(&thread_id, "bob").await.unwrap(), 1);
    assert_eq!(svc.get_unread_count(&thread_id, "alice").await.unwrap(), 0);

    let inbox = svc.list_inbox_for_user("bob").await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].thread.id, thread_id);
    assert_eq!(inbox[0].counterpart.user_id, "alice");
    assert_eq!(inbox[0].counterpart.display_name, "Alice");
    assert_eq!(inbox[0].unread_count, 1);
    let preview = inbox[0].last_message().expect("preview");
    assert_eq!(preview.text, "Hi");
    assert_eq!(preview.sender_id, "alice");

    svc.mark_read(&thread_id, "bob").await.unwrap();
    assert_eq!(svc.get_unread_count(&thread_id, "bob").await.unwrap(), 0);

    // Seller replies.
    svc.append_message(&thread_id, "bob", "Still available").await.unwrap();
    assert_eq!(svc.get_unread_count(&thread_id, "alice").await.unwrap(), 1);

    let alice_inbox = svc.list_inbox_for_user("alice").await.unwrap();
    assert_eq!(alice_inbox[0].counterpart.display_name, "Bob");
    assert_eq!(alice_inbox[0].last_message().unwrap().text, "Still available");
    assert_eq!(alice_inbox[0].unread_count, 1);
}

#[tokio::test]
async fn test_unread_equals_number_of_appends() {
    let chat = setup().await;
    let svc = &chat.service;
    let thread_id = svc.get_or_create_thread("alice", "bob", None).await.unwrap();

    for i in 0..7 {
        svc.append_message(&thread_id, "alice", &format!("message {}", i))
            .await
            .unwrap();
    }

    assert_eq!(svc.get_unread_count(&thread_id, "bob").await.unwrap(), 7);
    assert_eq!(svc.total_unread("bob").await.unwrap(), 7);
    assert_eq!(svc.recount_unread(&thread_id, "bob").await.unwrap(), 7);
}

#[tokio::test]
async fn test_unread_never_exceeds_counterpart_messages() {
    let chat = setup().await;
    let svc = &chat.service;
    let thread_id = svc.get_or_create_thread("alice", "bob", Some("L9")).await.unwrap();

    let script = [
        ("alice", true),
        ("bob", false),
        ("alice", false),
        ("alice", true),
        ("bob", true),
        ("alice", false),
    ];
    for (sender, bob_reads_after) in script {
        svc.append_message(&thread_id, sender, "text").await.unwrap();
        if bob_reads_after {
            svc.mark_read(&thread_id, "bob").await.unwrap();
        }
        let from_alice = svc
            .list_messages(&thread_id, "bob", None)
            .await
            .unwrap()
            .iter()
            .filter(|m| m.sender_id == "alice")
            .count() as u64;
        let unread = svc.get_unread_count(&thread_id, "bob").await.unwrap();
        assert!(unread <= from_alice);
    }
    assert_eq!(svc.get_unread_count(&thread_id, "bob").await.unwrap(), 1);
}

#[tokio::test]
async fn test_last_message_cache_matches_latest_message() {
    let chat = setup().await;
    let svc = &chat.service;
    let thread_id = svc.get_or_create_thread("carol", "bob", None).await.unwrap();

    svc.append_message(&thread_id, "carol", "first").await.unwrap();
    let id = svc.append_message(&thread_id, "bob", "second").await.unwrap();

    let thread = svc.get_thread(&thread_id).await.unwrap();
    let latest = svc.list_messages(&thread_id, "carol", Some(1)).await.unwrap();
    let cached = thread.last_message.unwrap();

    assert_eq!(latest[0].id, id);
    assert_eq!(cached.text, latest[0].text);
    assert_eq!(cached.sender_id, latest[0].sender_id);
    assert_eq!(cached.sent_at, latest[0].created_at);
    assert_eq!(thread.last_activity_at, latest[0].created_at);
}

#[tokio::test]
async fn test_inbox_ordered_by_recent_activity() {
    let chat = setup().await;
    let svc = &chat.service;

    let with_alice = svc.get_or_create_thread("alice", "bob", Some("L1")).await.unwrap();
    let with_carol = svc.get_or_create_thread("carol", "bob", Some("L2")).await.unwrap();
    let quiet = svc.get_or_create_thread("bob", "carol", Some("L3")).await.unwrap();

    svc.append_message(&with_carol, "carol", "older").await.unwrap();
    svc.append_message(&with_alice, "alice", "newer").await.unwrap();

    let inbox = svc.list_inbox_for_user("bob").await.unwrap();
    let order: Vec<&str> = inbox.iter().map(|e| e.thread.id.as_str()).collect();
    assert_eq!(order, vec![with_alice.as_str(), with_carol.as_str(), quiet.as_str()]);

    for pair in inbox.windows(2) {
        assert!(pair[0].last_activity_at() >= pair[1].last_activity_at());
    }
    assert!(inbox[2].last_message().is_none());
}

#[tokio::test]
async fn test_inbox_empty_for_user_without_threads() {
    let chat = setup().await;
    chat.service
        .get_or_create_thread("alice", "bob", None)
        .await
        .unwrap();

    let inbox = chat.service.list_inbox_for_user("carol").await.unwrap();
    assert!(inbox.is_empty());
}

#[tokio::test]
async fn test_errors_are_classified() {
    let chat = setup().await;
    let svc = &chat.service;
    let thread_id = svc.get_or_create_thread("alice", "bob", None).await.unwrap();

    assert!(matches!(
        svc.get_or_create_thread("alice", "", None).await,
        Err(ChatError::Validation(_))
    ));
    assert!(matches!(
        svc.append_message(&thread_id, "alice", "").await,
        Err(ChatError::Validation(_))
    ));
    assert!(matches!(
        svc.append_message(&thread_id, "carol", "hello").await,
        Err(ChatError::Authorization(_))
    ));
    assert!(matches!(
        svc.append_message("unknown", "alice", "hello").await,
        Err(ChatError::NotFound(_))
    ));
    assert!(matches!(
        svc.mark_read("unknown", "alice").await,
        Err(ChatError::NotFound(_))
    ));
}
