//! Fluent builder over [`QueryIntent`].

use super::engine;
use super::intent::{Operation, QueryIntent, SortSpec};
use super::response::Response;
use crate::store::Store;
use crate::types::{stringify, CollectionName, Record};
use serde_json::Value;
use std::future::{ready, IntoFuture, Ready};
use std::sync::Arc;

/// Chainable query/mutation builder bound to a store.
///
/// Chain methods only record intent; nothing touches the store until the
/// builder is resolved with [`execute`](Self::execute) or `.await`.
/// Resolving the same builder twice runs the same intent against whatever
/// the store holds at that moment.
///
/// ```ignore
/// let page = client
///     .from("inventory")
///     .eq("warehouse_id", "ARMZ28")
///     .order("quantity", true)
///     .limit(20)
///     .await;
/// ```
#[derive(Clone)]
pub struct QueryBuilder {
    store: Arc<Store>,
    intent: QueryIntent,
}

impl QueryBuilder {
    /// A builder with no target collection.
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            intent: QueryIntent::default(),
        }
    }

    /// Target `collection`, discarding any previously recorded intent.
    pub fn from(mut self, collection: impl Into<CollectionName>) -> Self {
        self.intent = QueryIntent::read(collection);
        self
    }

    /// Mark the intent as a read. Accepted for call-site symmetry with
    /// table APIs; the column list does not restrict returned fields.
    ///
    /// Any pending insert, update or delete is discarded, so
    /// `insert(r).select("*")` reads instead of inserting.
    pub fn select(mut self, _columns: &str) -> Self {
        self.intent.operation = Operation::Read;
        self
    }

    /// Require `field` to stringify to the same text as `value`.
    ///
    /// Comparison is on display form only: `eq("qty", 5)` and
    /// `eq("qty", "5")` are the same filter.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.intent.filters.insert(field.into(), stringify(&value.into()));
        self
    }

    /// Sort reads by `field`; `ascending = false` sorts descending.
    pub fn order(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.intent.sort = Some(SortSpec {
            field: field.into(),
            ascending,
        });
        self
    }

    /// Return at most `n` rows. Zero or negative yields no rows.
    pub fn limit(mut self, n: i64) -> Self {
        self.intent.limit = Some(n);
        self
    }

    /// Skip the first `n` rows. Negative values clamp to zero.
    pub fn offset(mut self, n: i64) -> Self {
        self.intent.offset = usize::try_from(n.max(0)).unwrap_or(usize::MAX);
        self
    }

    /// Prepend `record` on resolution.
    pub fn insert(mut self, record: Record) -> Self {
        self.intent.operation = Operation::Insert(record);
        self
    }

    /// Merge `patch` into every record matching the current filters.
    ///
    /// With no filters every record in the collection is updated.
    pub fn update(mut self, patch: Record) -> Self {
        self.intent.operation = Operation::Update(patch);
        self
    }

    /// Remove every record matching the current filters.
    ///
    /// With no filters nothing is removed.
    pub fn delete(mut self) -> Self {
        self.intent.operation = Operation::Delete;
        self
    }

    pub fn intent(&self) -> &QueryIntent {
        &self.intent
    }

    pub fn into_intent(self) -> QueryIntent {
        self.intent
    }

    /// Resolve against the store.
    pub fn execute(&self) -> Response {
        engine::execute(&self.intent, &self.store)
    }
}

impl IntoFuture for QueryBuilder {
    type Output = Response;
    type IntoFuture = Ready<Response>;

    fn into_future(self) -> Self::IntoFuture {
        ready(self.execute())
    }
}

impl<'a> IntoFuture for &'a QueryBuilder {
    type Output = Response;
    type IntoFuture = Ready<Response>;

    fn into_future(self) -> Self::IntoFuture {
        ready(self.execute())
    }
}
