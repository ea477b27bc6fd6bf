//! # Depot
//!
//! A table-style query builder that runs entirely against a local
//! persistent collection store. No network round-trip is involved.
//!
//! ## Core Concepts
//!
//! - **Records**: schema-less mappings of field names to JSON values
//! - **Collections**: named, insertion-ordered sequences of records
//! - **Intents**: accumulated filter/sort/page/mutation descriptions
//! - **Resolution**: executing an intent and getting a `{ payload, error }` envelope
//!
//! ## Example
//!
//! ```ignore
//! use depot::{Client, Record, StoreConfig};
//! use serde_json::json;
//!
//! let client = Client::open(StoreConfig {
//!     path: "./wms-data".into(),
//!     ..Default::default()
//! })?;
//!
//! client
//!     .from("inventory")
//!     .insert(Record::try_from(json!({"sku": "A", "qty": 10}))?)
//!     .await;
//!
//! let low = client
//!     .from("inventory")
//!     .eq("status", "disponivel")
//!     .order("qty", true)
//!     .limit(10)
//!     .await;
//! ```

pub mod backend;
pub mod client;
pub mod collections;
pub mod error;
pub mod query;
pub mod session;
pub mod store;
pub mod types;

// Re-exports
pub use backend::{Backend, FileBackend, MemoryBackend};
pub use client::Client;
pub use error::{Result, StoreError};
pub use query::{execute, Operation, Payload, QueryBuilder, QueryIntent, Response, SortSpec};
pub use session::{SessionToken, AUTH_TOKEN_KEY};
pub use store::{FailurePolicy, Store, StoreConfig};
pub use types::*;
