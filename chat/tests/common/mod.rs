//! Shared fixtures for chat integration tests.
//!
//! Builds a ChatService over a fresh in-memory store with a few seeded
//! profiles, and a mockall double of ProfileDirectory.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chat::{ChatConfig, ChatService, InboxWatch, StoreProfileDirectory};
use chat_core::{InboxEntry, ProfileDirectory, Result, UserProfile};
use docstore_core::DocumentStore;
use docstore_inmemory::InMemoryDocumentStore;
use mockall::mock;

mock! {
    pub Profiles {}

    #[async_trait]
    impl ProfileDirectory for Profiles {
        async fn get_profile(&self, user_id: &str) -> Result<UserProfile>;
    }
}

pub struct TestChat {
    pub store: InMemoryDocumentStore,
    pub service: ChatService,
}

pub fn profile(user_id: &str, display_name: &str) -> UserProfile {
    UserProfile {
        user_id: user_id.to_string(),
        display_name: display_name.to_string(),
        avatar_url: Some(format!("https://img.example/{}.png", user_id)),
    }
}

/// Seeds profiles for alice, bob and carol into `store`.
pub async fn seed_profiles(store: Arc<dyn DocumentStore>) {
    let directory = StoreProfileDirectory::new(store);
    for (id, name) in [("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")] {
        directory
            .put_profile(&profile(id, name))
            .await
            .expect("Failed to seed profile");
    }
}

/// Chat service over a fresh in-memory store with seeded profiles.
pub async fn setup() -> TestChat {
    let store = InMemoryDocumentStore::new();
    let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
    seed_profiles(Arc::clone(&shared)).await;
    TestChat {
        service: ChatService::with_store_profiles(shared, ChatConfig::default()),
        store,
    }
}

/// Chat service over a fresh in-memory store with the given profile directory.
pub fn setup_with_profiles(profiles: Arc<dyn ProfileDirectory>) -> TestChat {
    let store = InMemoryDocumentStore::new();
    TestChat {
        service: ChatService::new(Arc::new(store.clone()), profiles, ChatConfig::default()),
        store,
    }
}

/// Waits for the first snapshot accepted by `accept`, failing after two seconds.
pub async fn next_matching<F>(watch: &mut InboxWatch, accept: F) -> Vec<InboxEntry>
where
    F: Fn(&[InboxEntry]) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let snapshot = watch
                .next()
                .await
                .expect("Watch ended unexpectedly")
                .expect("Inbox refresh failed");
            if accept(&snapshot) {
                return snapshot;
            }
        }
    })
    .await
    .expect("Timed out waiting for inbox snapshot")
}
