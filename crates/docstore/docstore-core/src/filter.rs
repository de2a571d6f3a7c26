//! Query filters.
//!
//! A query returns the documents of a collection matching every filter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;

/// A single predicate over a document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// Field at `path` equals `value`. A missing field matches `null`.
    Eq(String, Value),
    /// Field at `path` is an array containing `value`.
    ArrayContains(String, Value),
}

impl Filter {
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(path.into(), value.into())
    }

    pub fn array_contains(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::ArrayContains(path.into(), value.into())
    }

    pub fn path(&self) -> &str {
        match self {
            Filter::Eq(path, _) | Filter::ArrayContains(path, _) => path,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            Filter::Eq(_, value) | Filter::ArrayContains(_, value) => value,
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::Eq(path, expected) => match document.get_path(path) {
                Some(actual) => actual == expected,
                None => expected.is_null(),
            },
            Filter::ArrayContains(path, expected) => document
                .get_path(path)
                .and_then(Value::as_array)
                .map(|items| items.contains(expected))
                .unwrap_or(false),
        }
    }
}

/// True when the document satisfies every filter.
pub fn matches_all(filters: &[Filter], document: &Document) -> bool {
    filters.iter().all(|f| f.matches(document))
}
