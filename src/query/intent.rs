//! Accumulated description of a query or mutation.

use crate::types::{CollectionName, Record};
use std::collections::BTreeMap;

/// What a resolved intent does to its collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Operation {
    /// Filter, sort and paginate.
    #[default]
    Read,
    /// Prepend the record. Filters are ignored.
    Insert(Record),
    /// Shallow-merge the patch into every matching record.
    Update(Record),
    /// Remove every matching record. Without filters this does nothing.
    Delete,
}

impl Operation {
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Insert(_) => "insert",
            Operation::Update(_) => "update",
            Operation::Delete => "delete",
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self, Operation::Read)
    }
}

/// Sort on a single field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub ascending: bool,
}

/// A query or mutation against one collection, not yet executed.
///
/// Filters map a field to the stringified value it must equal. Offset and
/// limit only affect reads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryIntent {
    pub collection: CollectionName,
    pub filters: BTreeMap<String, String>,
    pub sort: Option<SortSpec>,
    pub offset: usize,
    /// `None` means the whole remaining result.
    pub limit: Option<i64>,
    pub operation: Operation,
}

impl QueryIntent {
    /// A plain read of `collection`.
    pub fn read(collection: impl Into<CollectionName>) -> Self {
        Self {
            collection: collection.into(),
            ..Default::default()
        }
    }

    /// True if `record` satisfies every filter. A missing field never matches.
    pub fn matches(&self, record: &Record) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| record.field_text(field).as_deref() == Some(expected.as_str()))
    }
}
