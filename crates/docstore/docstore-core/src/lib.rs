//! # Docstore Core
//!
//! Core types and traits for the collection-oriented document store.
//! Used by the store backends and by the `chat` crate.
//!
//! ## Modules
//!
//! - [`document`] - Document, dotted field paths, timestamp encoding
//! - [`filter`] - Query filters (equality, array-contains)
//! - [`fields`] - Field writes (set, server timestamp, increment)
//! - [`store`] - DocumentStore trait and write batches
//! - [`clock`] - Monotonic server clock
//! - [`feed`] - Change feed and subscriptions
//! - [`error`] - StoreError

pub mod clock;
pub mod document;
pub mod error;
pub mod feed;
pub mod fields;
pub mod filter;
pub mod store;

pub use clock::ServerClock;
pub use document::{get_path, parse_timestamp, set_path, timestamp_value, Document};
pub use error::StoreError;
pub use feed::{ChangeEvent, ChangeFeed, Subscription};
pub use fields::{FieldWrite, Fields};
pub use filter::{matches_all, Filter};
pub use store::{DocumentStore, Resolved, WriteOp, WriteResult};
