//! SQLite-backed `DocumentStore`.

use async_trait::async_trait;
use chrono::SecondsFormat;
use docstore_core::{
    matches_all, ChangeFeed, Document, DocumentStore, Filter, ServerClock, StoreError,
    Subscription, WriteOp, WriteResult,
};
use serde_json::{Map, Value};
use sqlx::Row;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::sqlite_pool::SqlitePoolManager;

/// SQLite document store: one JSON document per row of the `documents` table.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool_manager: SqlitePoolManager,
    clock: Arc<ServerClock>,
    feed: ChangeFeed,
    write_gate: Arc<Mutex<()>>,
}

enum Bind {
    Text(String),
    Int(i64),
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn decode_body(id: String, body: &str) -> Result<Document, StoreError> {
    let fields: Map<String, Value> = serde_json::from_str(body)?;
    Ok(Document::new(id, fields))
}

/// `$.a.b` for `a.b`, or `None` when a segment needs quoting.
fn json_path(path: &str) -> Option<String> {
    let valid = path
        .split('.')
        .all(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    valid.then(|| format!("$.{}", path))
}

fn bind_value(value: &Value) -> Option<Bind> {
    match value {
        Value::String(s) => Some(Bind::Text(s.clone())),
        Value::Number(n) => n.as_i64().map(Bind::Int),
        Value::Bool(b) => Some(Bind::Int(i64::from(*b))),
        _ => None,
    }
}

/// SQL clause narrowing the scan for one filter, when it can be expressed.
fn pushdown(filter: &Filter) -> Option<(&'static str, Bind, Bind)> {
    let path = json_path(filter.path())?;
    let value = bind_value(filter.value())?;
    let clause = match filter {
        Filter::Eq(..) => " AND json_extract(body, ?) = ?",
        Filter::ArrayContains(..) => {
            " AND EXISTS (SELECT 1 FROM json_each(documents.body, ?) WHERE json_each.value = ?)"
        }
    };
    Some((clause, Bind::Text(path), value))
}

impl SqliteDocumentStore {
    /// Opens (and if needed creates) the store at `database_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if database connection or schema initialization fails.
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let pool_manager = SqlitePoolManager::new(database_url).await.map_err(backend)?;
        let store = Self {
            pool_manager,
            clock: Arc::new(ServerClock::new()),
            feed: ChangeFeed::new(),
            write_gate: Arc::new(Mutex::new(())),
        };
        store.init_schema().await?;
        Ok(store)
    }

    /// Creates the `documents` table if missing.
    ///
    /// ```sql
    /// CREATE TABLE documents (
    ///     collection TEXT NOT NULL,
    ///     id TEXT NOT NULL,
    ///     body TEXT NOT NULL,       -- JSON object
    ///     updated_at TEXT NOT NULL, -- commit server timestamp
    ///     PRIMARY KEY (collection, id)
    /// );
    /// ```
    async fn init_schema(&self) -> Result<(), StoreError> {
        info!("Creating document tables if not exist");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_updated_at ON documents(collection, updated_at);
            "#,
        )
        .execute(self.pool_manager.pool())
        .await
        .map_err(backend)?;

        Ok(())
    }

    /// Returns the number of documents in a collection.
    pub async fn count(&self, collection: &str) -> Result<i64, StoreError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(self.pool_manager.pool())
            .await
            .map_err(backend)?;
        Ok(row.0)
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(self.pool_manager.pool())
            .await
            .map_err(backend)?;

        match row {
            Some(r) => {
                let body: String = r.try_get("body").map_err(backend)?;
                Ok(Some(decode_body(id.to_string(), &body)?))
            }
            None => Ok(None),
        }
    }

    async fn query(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, StoreError> {
        let mut sql = String::from("SELECT id, body FROM documents WHERE collection = ?");
        let mut binds = vec![Bind::Text(collection.to_string())];
        for filter in filters {
            if let Some((clause, path, value)) = pushdown(filter) {
                sql.push_str(clause);
                binds.push(path);
                binds.push(value);
            }
        }
        sql.push_str(" ORDER BY id");

        let mut query = sqlx::query(&sql);
        for bind in binds {
            query = match bind {
                Bind::Text(s) => query.bind(s),
                Bind::Int(i) => query.bind(i),
            };
        }

        let rows = query
            .fetch_all(self.pool_manager.pool())
            .await
            .map_err(backend)?;

        // SQL narrows the scan; the final match is evaluated on the decoded document.
        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id").map_err(backend)?;
            let body: String = row.try_get("body").map_err(backend)?;
            let document = decode_body(id, &body)?;
            if matches_all(filters, &document) {
                documents.push(document);
            }
        }

        debug!(
            collection,
            filters = filters.len(),
            count = documents.len(),
            "SQLite store query returned"
        );
        Ok(documents)
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> Result<Vec<WriteResult>, StoreError> {
        let gate = self.write_gate.lock().await;
        let now = self.clock.now();
        let stamp = now.to_rfc3339_opts(SecondsFormat::Micros, true);

        let mut tx = self.pool_manager.pool().begin().await.map_err(backend)?;
        let mut results = Vec::with_capacity(ops.len());
        let mut written = Vec::new();

        for op in &ops {
            let collection = op.collection();
            let id = op
                .id()
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string());

            let row = sqlx::query("SELECT body FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(&id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(backend)?;
            let existing = match row {
                Some(r) => {
                    let body: String = r.try_get("body").map_err(backend)?;
                    Some(decode_body(id.clone(), &body)?)
                }
                None => None,
            };

            let resolved = op.resolve(&id, existing, now)?;
            if resolved.changed {
                let body = serde_json::to_string(&resolved.result.document.fields)?;
                sqlx::query(
                    r#"
                    INSERT INTO documents (collection, id, body, updated_at)
                    VALUES (?, ?, ?, ?)
                    ON CONFLICT(collection, id) DO UPDATE SET
                        body = excluded.body,
                        updated_at = excluded.updated_at
                    "#,
                )
                .bind(collection)
                .bind(&id)
                .bind(&body)
                .bind(&stamp)
                .execute(&mut *tx)
                .await
                .map_err(backend)?;
                written.push((collection.to_string(), resolved.result.document.clone()));
            }
            results.push(resolved.result);
        }

        tx.commit().await.map_err(backend)?;
        drop(gate);

        debug!(ops = ops.len(), written = written.len(), "SQLite store commit applied");
        for (collection, document) in written {
            self.feed.publish(&collection, document);
        }
        Ok(results)
    }

    fn subscribe(&self, collection: &str, filters: Vec<Filter>) -> Subscription {
        self.feed.subscribe(collection, filters)
    }
}
