//! # Document Storage
//!
//! This module defines the document store interface consumed by the chat layer.
//!
//! The `DocumentStore` trait is implemented by storage backends (in-memory, SQLite).
//! Backends implement the four primitives (`get`, `query`, `commit`, `subscribe`);
//! the single-write helpers are provided on top of `commit`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Map;

use crate::document::Document;
use crate::error::StoreError;
use crate::feed::Subscription;
use crate::fields::Fields;
use crate::filter::{matches_all, Filter};

/// One write inside a batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Inserts a new document. Without an id the store assigns a random one.
    /// Fails with `AlreadyExists` when the id is taken.
    Create {
        collection: String,
        id: Option<String>,
        fields: Fields,
    },
    /// Inserts the document only if the id is free; otherwise leaves it untouched.
    CreateIfAbsent {
        collection: String,
        id: String,
        fields: Fields,
    },
    /// Merges writes into an existing document. Fails with `NotFound` when absent.
    Update {
        collection: String,
        id: String,
        fields: Fields,
    },
    /// Merges writes into the document, creating it empty first when absent.
    Upsert {
        collection: String,
        id: String,
        fields: Fields,
    },
    /// Like `Upsert`, but only when the stored document (an empty one when
    /// absent) matches every guard filter. Otherwise nothing is written and
    /// the result reports `applied == false`.
    UpsertIf {
        collection: String,
        id: String,
        guards: Vec<Filter>,
        fields: Fields,
    },
}

impl WriteOp {
    pub fn create(collection: impl Into<String>, fields: Fields) -> Self {
        WriteOp::Create {
            collection: collection.into(),
            id: None,
            fields,
        }
    }

    pub fn create_with_id(collection: impl Into<String>, id: impl Into<String>, fields: Fields) -> Self {
        WriteOp::Create {
            collection: collection.into(),
            id: Some(id.into()),
            fields,
        }
    }

    pub fn create_if_absent(collection: impl Into<String>, id: impl Into<String>, fields: Fields) -> Self {
        WriteOp::CreateIfAbsent {
            collection: collection.into(),
            id: id.into(),
            fields,
        }
    }

    pub fn update(collection: impl Into<String>, id: impl Into<String>, fields: Fields) -> Self {
        WriteOp::Update {
            collection: collection.into(),
            id: id.into(),
            fields,
        }
    }

    pub fn upsert(collection: impl Into<String>, id: impl Into<String>, fields: Fields) -> Self {
        WriteOp::Upsert {
            collection: collection.into(),
            id: id.into(),
            fields,
        }
    }

    pub fn upsert_if(
        collection: impl Into<String>,
        id: impl Into<String>,
        guards: Vec<Filter>,
        fields: Fields,
    ) -> Self {
        WriteOp::UpsertIf {
            collection: collection.into(),
            id: id.into(),
            guards,
            fields,
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            WriteOp::Create { collection, .. }
            | WriteOp::CreateIfAbsent { collection, .. }
            | WriteOp::Update { collection, .. }
            | WriteOp::Upsert { collection, .. }
            | WriteOp::UpsertIf { collection, .. } => collection,
        }
    }

    /// The addressed document id; `None` for a create with a store-assigned id.
    pub fn id(&self) -> Option<&str> {
        match self {
            WriteOp::Create { id, .. } => id.as_deref(),
            WriteOp::CreateIfAbsent { id, .. }
            | WriteOp::Update { id, .. }
            | WriteOp::Upsert { id, .. }
            | WriteOp::UpsertIf { id, .. } => Some(id),
        }
    }

    /// Resolves this write against the current state of document `id`.
    ///
    /// Backends call this inside their atomic section with the document as
    /// currently stored (including earlier writes of the same batch).
    pub fn resolve(
        &self,
        id: &str,
        existing: Option<Document>,
        now: DateTime<Utc>,
    ) -> Result<Resolved, StoreError> {
        match (self, existing) {
            (WriteOp::UpsertIf { guards, fields, .. }, existing) => {
                let created = existing.is_none();
                let mut current = existing.unwrap_or_else(|| Document::new(id, Map::new()));
                if !matches_all(guards, &current) {
                    return Ok(Resolved {
                        result: WriteResult {
                            document: current,
                            created: false,
                            applied: false,
                        },
                        changed: false,
                    });
                }
                fields.apply(&mut current.fields, now)?;
                Ok(Resolved {
                    result: WriteResult {
                        document: current,
                        created,
                        applied: true,
                    },
                    changed: true,
                })
            }
            (WriteOp::Create { collection, .. }, Some(_)) => {
                Err(StoreError::already_exists(collection, id))
            }
            (WriteOp::CreateIfAbsent { .. }, Some(current)) => Ok(Resolved {
                result: WriteResult {
                    document: current,
                    created: false,
                    applied: false,
                },
                changed: false,
            }),
            (WriteOp::Update { collection, .. }, None) => Err(StoreError::not_found(collection, id)),
            (
                WriteOp::Create { fields, .. }
                | WriteOp::CreateIfAbsent { fields, .. }
                | WriteOp::Upsert { fields, .. },
                None,
            ) => {
                let mut map = Map::new();
                fields.apply(&mut map, now)?;
                Ok(Resolved {
                    result: WriteResult {
                        document: Document::new(id, map),
                        created: true,
                        applied: true,
                    },
                    changed: true,
                })
            }
            (WriteOp::Update { fields, .. } | WriteOp::Upsert { fields, .. }, Some(mut current)) => {
                fields.apply(&mut current.fields, now)?;
                Ok(Resolved {
                    result: WriteResult {
                        document: current,
                        created: false,
                        applied: true,
                    },
                    changed: true,
                })
            }
        }
    }
}

/// A write resolved against stored state, ready for the backend to persist.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub result: WriteResult,
    /// False when nothing must be persisted (create-if-absent hit an existing id).
    pub changed: bool,
}

/// Outcome of one write: the document as stored after the batch.
#[derive(Debug, Clone)]
pub struct WriteResult {
    pub document: Document,
    /// True when the write inserted a new document.
    pub created: bool,
    /// False when the write was skipped: create-if-absent found the id taken,
    /// or an upsert-if guard did not match.
    pub applied: bool,
}

/// Trait for collection-oriented document storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Retrieves a document by id. Returns `None` if not found.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Retrieves every document of `collection` matching all `filters`.
    async fn query(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, StoreError>;

    /// Applies all writes atomically: either every op succeeds or none is visible.
    /// All server timestamps in one batch resolve to the same instant.
    async fn commit(&self, ops: Vec<WriteOp>) -> Result<Vec<WriteResult>, StoreError>;

    /// Subscribes to changes committed to `collection` that match `filters`.
    fn subscribe(&self, collection: &str, filters: Vec<Filter>) -> Subscription;

    /// Creates a document with a store-assigned id.
    async fn create(&self, collection: &str, fields: Fields) -> Result<Document, StoreError> {
        let result = self.commit(vec![WriteOp::create(collection, fields)]).await?;
        single(result)
    }

    /// Creates a document under `id` unless one exists; returns the stored document.
    async fn create_if_absent(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<WriteResult, StoreError> {
        let mut result = self
            .commit(vec![WriteOp::create_if_absent(collection, id, fields)])
            .await?;
        result
            .pop()
            .ok_or_else(|| StoreError::Backend("empty commit result".to_string()))
    }

    /// Merges writes into an existing document.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<Document, StoreError> {
        let result = self.commit(vec![WriteOp::update(collection, id, fields)]).await?;
        single(result)
    }

    /// Merges writes into a document, creating it when absent.
    async fn upsert(&self, collection: &str, id: &str, fields: Fields) -> Result<Document, StoreError> {
        let result = self.commit(vec![WriteOp::upsert(collection, id, fields)]).await?;
        single(result)
    }
}

fn single(mut results: Vec<WriteResult>) -> Result<Document, StoreError> {
    results
        .pop()
        .map(|r| r.document)
        .ok_or_else(|| StoreError::Backend("empty commit result".to_string()))
}
