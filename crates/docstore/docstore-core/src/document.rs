//! # Documents
//!
//! A [`Document`] is a schemaless JSON object stored under an id inside a
//! named collection. Fields are addressed by dotted paths (`lastMessage.text`).
//!
//! Timestamps are stored as RFC 3339 UTC strings with microsecond precision so
//! that they compare the same way as strings and as instants.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// A stored record: id plus its JSON fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Returns the value at a dotted path, if every segment exists.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        get_path(&self.fields, path)
    }

    /// Deserializes the fields into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }
}

/// Looks up a dotted path inside a JSON object.
pub fn get_path<'a>(fields: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = fields.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Writes `value` at a dotted path, creating intermediate objects.
///
/// Fails with [`StoreError::InvalidPath`] when the path is empty, has an empty
/// segment, or crosses a non-object value.
pub fn set_path(fields: &mut Map<String, Value>, path: &str, value: Value) -> Result<(), StoreError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }

    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;

    let mut current = fields;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if entry.is_null() {
            *entry = Value::Object(Map::new());
        }
        current = entry
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
    }
    current.insert(last.to_string(), value);
    Ok(())
}

/// Renders a timestamp the way the store persists it.
pub fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Parses a stored timestamp value.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
