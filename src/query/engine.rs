//! Execution of a [`QueryIntent`] against a [`Store`].

use super::intent::{Operation, QueryIntent, SortSpec};
use super::response::{Payload, Response};
use crate::error::StoreError;
use crate::store::{FailurePolicy, Store};
use crate::types::{compare_values, Record};
use tracing::{debug, error, warn};

/// Collects the first persistence failure for the response envelope.
struct Outcome {
    policy: FailurePolicy,
    error: Option<StoreError>,
}

impl Outcome {
    fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            error: None,
        }
    }

    fn note(&mut self, err: StoreError) {
        if self.policy == FailurePolicy::Surface && self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn finish(self, payload: Payload) -> Response {
        Response {
            payload,
            error: self.error,
        }
    }
}

/// Resolve `intent` against `store`.
///
/// This is the only place the store is touched. Reads load once; mutations
/// load, transform and write the whole collection back. Resolution never
/// fails: failures are logged and, under [`FailurePolicy::Surface`], reported
/// in [`Response::error`].
pub fn execute(intent: &QueryIntent, store: &Store) -> Response {
    let collection = intent.collection.as_str();
    debug!(collection, op = intent.operation.kind(), filters = intent.filters.len(), "executing");

    let mut outcome = Outcome::new(store.failure_policy());

    if matches!(intent.operation, Operation::Delete) && intent.filters.is_empty() {
        debug!(collection, "delete without filters is a no-op");
        return outcome.finish(Payload::Empty);
    }

    let (records, loaded) = match store.try_load(collection) {
        Ok(records) => (records, true),
        Err(e) => {
            warn!(collection, error = %e, "treating unreadable collection as empty");
            outcome.note(e);
            (Vec::new(), false)
        }
    };

    // Writing back over a collection we could not decode would destroy it.
    if !loaded && intent.operation.is_mutation() && outcome.policy == FailurePolicy::Surface {
        return outcome.finish(Payload::Empty);
    }

    match &intent.operation {
        Operation::Read => outcome.finish(Payload::Rows(read(intent, records))),
        Operation::Insert(record) => {
            let mut records = records;
            records.insert(0, record.clone());
            persist(store, collection, &records, &mut outcome);
            outcome.finish(Payload::Row(record.clone()))
        }
        Operation::Update(patch) => {
            let records: Vec<Record> = records
                .into_iter()
                .map(|r| if intent.matches(&r) { r.merged(patch) } else { r })
                .collect();
            persist(store, collection, &records, &mut outcome);
            outcome.finish(Payload::Row(patch.clone()))
        }
        Operation::Delete => {
            let before = records.len();
            let remaining: Vec<Record> = records.into_iter().filter(|r| !intent.matches(r)).collect();
            debug!(collection, removed = before - remaining.len(), "delete");
            persist(store, collection, &remaining, &mut outcome);
            outcome.finish(Payload::Empty)
        }
    }
}

fn persist(store: &Store, collection: &str, records: &[Record], outcome: &mut Outcome) {
    if let Err(e) = store.try_save(collection, records) {
        error!(collection, error = %e, "failed to persist collection");
        outcome.note(e);
    }
}

/// Filter, then stable sort, then slice.
fn read(intent: &QueryIntent, records: Vec<Record>) -> Vec<Record> {
    let mut rows: Vec<Record> = records.into_iter().filter(|r| intent.matches(r)).collect();
    if let Some(sort) = &intent.sort {
        sort_rows(&mut rows, sort);
    }
    paginate(rows, intent.offset, intent.limit)
}

fn sort_rows(rows: &mut [Record], sort: &SortSpec) {
    // sort_by is stable; reversing the comparator keeps ties in input order.
    rows.sort_by(|a, b| {
        let ord = compare_values(a.get(&sort.field), b.get(&sort.field));
        if sort.ascending {
            ord
        } else {
            ord.reverse()
        }
    });
}

/// Records `[offset, offset + limit)`. A limit of zero or less yields nothing.
fn paginate(rows: Vec<Record>, offset: usize, limit: Option<i64>) -> Vec<Record> {
    let take = match limit {
        None => usize::MAX,
        Some(n) if n <= 0 => 0,
        Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
    };
    rows.into_iter().skip(offset).take(take).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, MemoryBackend};
    use crate::store::StoreConfig;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn rec(value: Value) -> Record {
        Record::try_from(value).unwrap()
    }

    fn seeded(collection: &str, rows: Vec<Value>) -> Store {
        let store = Store::in_memory();
        let records: Vec<Record> = rows.into_iter().map(rec).collect();
        store.save(collection, &records);
        store
    }

    fn field(rows: &[Record], name: &str) -> Vec<Value> {
        rows.iter().map(|r| r.get(name).cloned().unwrap_or(Value::Null)).collect()
    }

    #[test]
    fn test_read_filters_and_sorts() {
        let store = seeded(
            "inventory",
            vec![
                json!({"sku": "C", "qty": 30, "warehouse_id": "ARMZ28"}),
                json!({"sku": "A", "qty": 10, "warehouse_id": "ARMZ28"}),
                json!({"sku": "B", "qty": 20, "warehouse_id": "ARMZ33"}),
            ],
        );

        let mut intent = QueryIntent::read("inventory");
        intent.filters.insert("warehouse_id".into(), "ARMZ28".into());
        intent.sort = Some(SortSpec {
            field: "qty".into(),
            ascending: true,
        });

        let rows = execute(&intent, &store).into_rows();
        assert_eq!(field(&rows, "sku"), vec![json!("A"), json!("C")]);
    }

    #[test]
    fn test_numeric_sort_is_not_lexicographic() {
        let store = seeded("inventory", vec![json!({"qty": 9}), json!({"qty": 100}), json!({"qty": 25})]);
        let mut intent = QueryIntent::read("inventory");
        intent.sort = Some(SortSpec {
            field: "qty".into(),
            ascending: false,
        });

        let rows = execute(&intent, &store).into_rows();
        assert_eq!(field(&rows, "qty"), vec![json!(100), json!(25), json!(9)]);
    }

    #[test]
    fn test_descending_sort_keeps_ties_in_order() {
        let store = seeded(
            "material_requests",
            vec![
                json!({"id": 1, "priority": "normal"}),
                json!({"id": 2, "priority": "alta"}),
                json!({"id": 3, "priority": "normal"}),
            ],
        );
        let mut intent = QueryIntent::read("material_requests");
        intent.sort = Some(SortSpec {
            field: "priority".into(),
            ascending: false,
        });

        let rows = execute(&intent, &store).into_rows();
        assert_eq!(field(&rows, "id"), vec![json!(1), json!(3), json!(2)]);
    }

    #[test]
    fn test_sort_with_missing_and_mixed_keys() {
        let store = seeded(
            "inventory",
            vec![
                json!({"id": "a", "qty": 3}),
                json!({"id": "b"}),
                json!({"id": "c", "qty": 1}),
                json!({"id": "d", "qty": "many"}),
                json!({"id": "e"}),
                json!({"id": "f", "qty": 2}),
                json!({"id": "g", "qty": null}),
            ],
        );
        let mut intent = QueryIntent::read("inventory");
        intent.sort = Some(SortSpec {
            field: "qty".into(),
            ascending: true,
        });

        let rows = execute(&intent, &store).into_rows();
        assert_eq!(
            field(&rows, "id"),
            vec![json!("b"), json!("e"), json!("g"), json!("c"), json!("f"), json!("a"), json!("d")]
        );

        intent.sort = Some(SortSpec {
            field: "qty".into(),
            ascending: false,
        });
        let rows = execute(&intent, &store).into_rows();
        assert_eq!(
            field(&rows, "id"),
            vec![json!("d"), json!("a"), json!("f"), json!("c"), json!("b"), json!("e"), json!("g")]
        );
    }

    #[test]
    fn test_sort_many_mixed_rows_does_not_panic() {
        let rows: Vec<Value> = (0..300u64)
            .map(|i| match i % 4 {
                0 => json!({"i": i, "qty": (i * 37) % 101}),
                1 => json!({"i": i}),
                2 => json!({"i": i, "qty": format!("t{}", (i * 13) % 17)}),
                _ => json!({"i": i, "qty": ((i * 7) % 50) as f64 + 0.5}),
            })
            .collect();
        let store = seeded("inventory", rows);
        let mut intent = QueryIntent::read("inventory");
        intent.sort = Some(SortSpec {
            field: "qty".into(),
            ascending: true,
        });

        let sorted = execute(&intent, &store).into_rows();
        assert_eq!(sorted.len(), 300);
        for pair in sorted.windows(2) {
            assert_ne!(
                compare_values(pair[0].get("qty"), pair[1].get("qty")),
                std::cmp::Ordering::Greater
            );
        }
    }

    #[test]
    fn test_paginate_bounds() {
        let rows: Vec<Record> = (0..5).map(|i| rec(json!({"i": i}))).collect();

        assert_eq!(paginate(rows.clone(), 1, Some(2)).len(), 2);
        assert_eq!(paginate(rows.clone(), 4, Some(10)).len(), 1);
        assert!(paginate(rows.clone(), 5, None).is_empty());
        assert!(paginate(rows.clone(), 0, Some(0)).is_empty());
        assert!(paginate(rows.clone(), 0, Some(-3)).is_empty());
        assert_eq!(paginate(rows, 0, None).len(), 5);
    }

    #[test]
    fn test_pagination_ignored_for_mutations() {
        let store = seeded("users", vec![json!({"id": "a", "role": "x"}), json!({"id": "b", "role": "x"})]);
        let mut intent = QueryIntent::read("users");
        intent.filters.insert("role".into(), "x".into());
        intent.limit = Some(1);
        intent.offset = 1;
        intent.operation = Operation::Update(rec(json!({"status": "inactive"})));

        execute(&intent, &store);

        let all = store.load("users");
        assert_eq!(field(&all, "status"), vec![json!("inactive"), json!("inactive")]);
    }

    #[test]
    fn test_insert_ignores_filters() {
        let store = seeded("movements", vec![json!({"id": "m1", "type": "in"})]);
        let mut intent = QueryIntent::read("movements");
        intent.filters.insert("type".into(), "out".into());
        intent.operation = Operation::Insert(rec(json!({"id": "m2", "type": "out"})));

        let response = execute(&intent, &store);
        assert_eq!(response.row().and_then(|r| r.get("id")), Some(&json!("m2")));
        assert_eq!(field(&store.load("movements"), "id"), vec![json!("m2"), json!("m1")]);
    }

    #[test]
    fn test_update_returns_patch_not_merged_rows() {
        let store = seeded("vehicles", vec![json!({"plate": "BGM-1001", "status": "Disponível"})]);
        let mut intent = QueryIntent::read("vehicles");
        intent.filters.insert("plate".into(), "BGM-1001".into());
        intent.operation = Operation::Update(rec(json!({"status": "Manutenção"})));

        let response = execute(&intent, &store);
        assert_eq!(response.payload, Payload::Row(rec(json!({"status": "Manutenção"}))));
    }

    #[test]
    fn test_update_matches_numbers_by_display_form() {
        let store = seeded("inventory", vec![json!({"sku": "A", "qty": 5}), json!({"sku": "B", "qty": 6})]);
        let mut intent = QueryIntent::read("inventory");
        intent.filters.insert("qty".into(), "5".into());
        intent.operation = Operation::Update(rec(json!({"status": "low"})));

        execute(&intent, &store);
        let all = store.load("inventory");
        assert_eq!(field(&all, "status"), vec![json!("low"), Value::Null]);
    }

    #[test]
    fn test_delete_without_filters_is_noop() {
        let store = seeded("purchase_orders", vec![json!({"id": 1}), json!({"id": 2})]);
        let mut intent = QueryIntent::read("purchase_orders");
        intent.operation = Operation::Delete;

        let response = execute(&intent, &store);
        assert_eq!(response.payload, Payload::Empty);
        assert_eq!(store.load("purchase_orders").len(), 2);
    }

    #[test]
    fn test_delete_removes_all_matches() {
        let store = seeded(
            "purchase_orders",
            vec![
                json!({"id": 1, "status": "draft"}),
                json!({"id": 2, "status": "sent"}),
                json!({"id": 3, "status": "draft"}),
            ],
        );
        let mut intent = QueryIntent::read("purchase_orders");
        intent.filters.insert("status".into(), "draft".into());
        intent.operation = Operation::Delete;

        execute(&intent, &store);
        assert_eq!(field(&store.load("purchase_orders"), "id"), vec![json!(2)]);
    }

    /// Backend whose writes always fail.
    struct ReadOnlyBackend(MemoryBackend);

    impl Backend for ReadOnlyBackend {
        fn read(&self, key: &str) -> crate::Result<Option<Vec<u8>>> {
            self.0.read(key)
        }
        fn write(&self, _key: &str, _value: &[u8]) -> crate::Result<()> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "quota exceeded",
            )))
        }
        fn remove(&self, key: &str) -> crate::Result<()> {
            self.0.remove(key)
        }
        fn keys(&self) -> crate::Result<Vec<String>> {
            self.0.keys()
        }
    }

    #[test]
    fn test_write_failure_swallowed_by_default() {
        let store = Store::with_backend(
            Arc::new(ReadOnlyBackend(MemoryBackend::new())),
            StoreConfig::default(),
        );
        let mut intent = QueryIntent::read("users");
        intent.operation = Operation::Insert(rec(json!({"id": "x"})));

        let response = execute(&intent, &store);
        assert!(response.is_ok());
        assert_eq!(response.row().and_then(|r| r.get("id")), Some(&json!("x")));
        assert!(store.load("users").is_empty());
    }

    #[test]
    fn test_write_failure_surfaced_when_configured() {
        let store = Store::with_backend(
            Arc::new(ReadOnlyBackend(MemoryBackend::new())),
            StoreConfig {
                failure_policy: FailurePolicy::Surface,
                ..Default::default()
            },
        );
        let mut intent = QueryIntent::read("users");
        intent.operation = Operation::Insert(rec(json!({"id": "x"})));

        let response = execute(&intent, &store);
        assert!(matches!(response.error, Some(StoreError::Io(_))));
        assert!(response.row().is_some());
    }

    #[test]
    fn test_corrupt_collection_not_overwritten_when_surfacing() {
        let backend = Arc::new(MemoryBackend::new());
        backend.write("depot_inventory", b"garbage").unwrap();
        let store = Store::with_backend(
            backend.clone(),
            StoreConfig {
                failure_policy: FailurePolicy::Surface,
                ..Default::default()
            },
        );
        let mut intent = QueryIntent::read("inventory");
        intent.operation = Operation::Insert(rec(json!({"sku": "A"})));

        let response = execute(&intent, &store);
        assert!(matches!(response.error, Some(StoreError::Deserialization { .. })));
        assert_eq!(backend.read("depot_inventory").unwrap().as_deref(), Some(&b"garbage"[..]));
    }

    #[test]
    fn test_corrupt_collection_overwritten_by_default() {
        let backend = Arc::new(MemoryBackend::new());
        backend.write("depot_inventory", b"garbage").unwrap();
        let store = Store::with_backend(backend, StoreConfig::default());
        let mut intent = QueryIntent::read("inventory");
        intent.operation = Operation::Insert(rec(json!({"sku": "A"})));

        let response = execute(&intent, &store);
        assert!(response.is_ok());
        assert_eq!(store.load("inventory").len(), 1);
    }
}
