//! Result envelope returned by every resolution.

use crate::error::StoreError;
use crate::types::Record;
use serde::Serialize;

/// Data carried by a [`Response`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// A page of records (reads).
    Rows(Vec<Record>),
    /// A single record (the inserted record, or the update patch).
    Row(Record),
    /// Nothing (deletes).
    Empty,
}

/// `{ payload, error }` pair.
///
/// Under the default failure policy `error` is always `None`.
#[derive(Debug)]
pub struct Response {
    pub payload: Payload,
    pub error: Option<StoreError>,
}

impl Response {
    pub fn ok(payload: Payload) -> Self {
        Self {
            payload,
            error: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Rows of a read, or an empty slice for any other payload.
    pub fn rows(&self) -> &[Record] {
        match &self.payload {
            Payload::Rows(rows) => rows,
            _ => &[],
        }
    }

    pub fn into_rows(self) -> Vec<Record> {
        match self.payload {
            Payload::Rows(rows) => rows,
            _ => Vec::new(),
        }
    }

    pub fn row(&self) -> Option<&Record> {
        match &self.payload {
            Payload::Row(row) => Some(row),
            _ => None,
        }
    }

    /// The payload as JSON: an array, an object, or null.
    pub fn payload_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.payload).unwrap_or(serde_json::Value::Null)
    }
}
