//! Field writes applied by create/update/upsert operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::{get_path, set_path, timestamp_value};
use crate::error::StoreError;

/// One write to one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldWrite {
    /// Replace the field with a value.
    Set(Value),
    /// Replace the field with the commit's server timestamp.
    ServerTimestamp,
    /// Add to an integer field; a missing or non-integer field counts as 0.
    Increment(i64),
}

/// Ordered list of field writes keyed by dotted path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fields {
    writes: Vec<(String, FieldWrite)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.writes.push((path.into(), FieldWrite::Set(value.into())));
        self
    }

    pub fn server_timestamp(mut self, path: impl Into<String>) -> Self {
        self.writes.push((path.into(), FieldWrite::ServerTimestamp));
        self
    }

    pub fn increment(mut self, path: impl Into<String>, delta: i64) -> Self {
        self.writes.push((path.into(), FieldWrite::Increment(delta)));
        self
    }

    /// Applies every write in order to `target`, stamping server timestamps with `now`.
    pub fn apply(&self, target: &mut Map<String, Value>, now: DateTime<Utc>) -> Result<(), StoreError> {
        for (path, write) in &self.writes {
            let value = match write {
                FieldWrite::Set(value) => value.clone(),
                FieldWrite::ServerTimestamp => timestamp_value(now),
                FieldWrite::Increment(delta) => {
                    let current = get_path(target, path).and_then(Value::as_i64).unwrap_or(0);
                    Value::from(current.saturating_add(*delta))
                }
            };
            set_path(target, path, value)?;
        }
        Ok(())
    }
}
