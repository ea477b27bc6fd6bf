//! Core types for the collection store.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;

/// Name of a collection within the store.
pub type CollectionName = String;

/// A single schema-less record: a mapping of field names to JSON values.
///
/// Identity is whatever field the application chooses (`id`, `sku`,
/// `plate`, ...). The store never inspects or generates it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Get a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a field, returning the previous value if any.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over fields in key order.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Stringified form of a field, or `None` if the field is absent.
    pub fn field_text(&self, field: &str) -> Option<String> {
        self.0.get(field).map(stringify)
    }

    /// Shallow merge: fields of `patch` overwrite, all others are kept.
    pub fn merged(&self, patch: &Record) -> Record {
        let mut out = self.0.clone();
        for (k, v) in &patch.0 {
            out.insert(k.clone(), v.clone());
        }
        Record(out)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Record(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = StoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Record(map)),
            other => Err(StoreError::InvalidRecord(format!(
                "expected an object, got {}",
                kind_name(&other)
            ))),
        }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Record(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.0.clone()))
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "text",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Display form of a value, used for equality filters.
///
/// Text is taken as-is and numbers use their shortest display form, so the
/// number `5` and the text `"5"` stringify identically. Nested values
/// become compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map(float_text).unwrap_or_else(|| n.to_string())
            }
        }
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Shortest text for a float: plain notation for magnitudes in
/// `[1e-6, 1e21)`, exponent notation with an explicit sign otherwise
/// (`1e+21`, `1.5e-7`). A zero fraction is dropped: `5.0` -> `"5"`.
fn float_text(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    let magnitude = f.abs();
    if (1e-6..1e21).contains(&magnitude) || !f.is_finite() {
        return f.to_string();
    }
    let text = format!("{f:e}");
    match text.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => text,
    }
}

/// Sort rank of a value's kind. Absent and null sort together, first.
fn kind_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// Natural ordering between two field values.
///
/// Values of different kinds order by kind: absent/null, then booleans,
/// numbers, text, sequences, mappings. Within a kind numbers compare
/// numerically (integers exactly), text lexicographically, booleans
/// false-before-true, sequences and mappings by their compact JSON.
/// This is a total order, so a stable sort keeps ties in input order.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => compare_numbers(x, y),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x @ Value::Array(_)), Some(y @ Value::Array(_)))
        | (Some(x @ Value::Object(_)), Some(y @ Value::Object(_))) => {
            x.to_string().cmp(&y.to_string())
        }
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

/// A JSON number, integers kept exact.
enum Numeric {
    Int(i128),
    Float(f64),
}

impl Numeric {
    fn of(n: &serde_json::Number) -> Self {
        if let Some(i) = n.as_i64() {
            Numeric::Int(i128::from(i))
        } else if let Some(u) = n.as_u64() {
            Numeric::Int(i128::from(u))
        } else {
            Numeric::Float(n.as_f64().unwrap_or(0.0))
        }
    }
}

fn compare_numbers(x: &serde_json::Number, y: &serde_json::Number) -> Ordering {
    match (Numeric::of(x), Numeric::of(y)) {
        (Numeric::Int(a), Numeric::Int(b)) => a.cmp(&b),
        (Numeric::Float(a), Numeric::Float(b)) => a.total_cmp(&b),
        (Numeric::Int(a), Numeric::Float(b)) => compare_int_float(a, b),
        (Numeric::Float(a), Numeric::Int(b)) => compare_int_float(b, a).reverse(),
    }
}

/// Exact comparison of an integer against a float.
fn compare_int_float(i: i128, f: f64) -> Ordering {
    // Rounding is monotonic: if the rounded integer differs from f, so does i.
    match (i as f64).total_cmp(&f) {
        Ordering::Equal => i.cmp(&(f as i128)),
        ord => ord,
    }
}
