//! # SQLite Document Store
//!
//! This crate provides an SQLite-based implementation of the `DocumentStore`
//! trait from `docstore-core`.
//!
//! ## SqliteDocumentStore
//!
//! Persistent storage: every document is one row holding its JSON body.
//!
//! **Advantages**:
//! - Persistent storage (data survives restarts)
//! - No external database required
//! - Equality and array-contains filters run inside SQLite via `json_extract` / `json_each`
//!
//! **Limitations**:
//! - Commits are serialized per process
//! - Change subscriptions only see writes made through the same store handle
//!
//! ## Example
//!
//! ```rust,no_run
//! use docstore_core::{DocumentStore, Fields};
//! use docstore_sqlite::SqliteDocumentStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), docstore_core::StoreError> {
//!     let store = SqliteDocumentStore::new("marketchat.db").await?;
//!     store
//!         .create("messages", Fields::new().set("text", "Hi").server_timestamp("createdAt"))
//!         .await?;
//!     Ok(())
//! }
//! ```

mod sqlite_pool;
mod store;

pub use sqlite_pool::SqlitePoolManager;
pub use store::SqliteDocumentStore;
