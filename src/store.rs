//! The persistent collection store.
//!
//! Each collection is persisted as one JSON array under
//! `<namespace><collection>`. Collections are loaded lazily and
//! independently of each other; there is no cross-collection transaction.

use crate::backend::{Backend, FileBackend, MemoryBackend};
use crate::error::{Result, StoreError};
use crate::types::Record;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// What to do when the persistence boundary fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure and carry on. Responses never carry an error.
    #[default]
    LogAndContinue,
    /// Log the failure and report it in the response envelope.
    Surface,
}

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Base path for the store.
    pub path: PathBuf,

    /// Prefix prepended to every collection key.
    pub namespace: String,

    /// Number of decoded collections kept in memory.
    pub cache_capacity: usize,

    /// Whether to create the store if it doesn't exist.
    pub create_if_missing: bool,

    /// How persistence failures are reported.
    pub failure_policy: FailurePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./depot"),
            namespace: "depot_".to_string(),
            cache_capacity: 64,
            create_if_missing: true,
            failure_policy: FailurePolicy::LogAndContinue,
        }
    }
}

/// Collection store over a [`Backend`].
///
/// `load` and `save` never fail: a missing or undecodable collection reads as
/// empty, and a failed write is logged and dropped. `try_load` and `try_save`
/// expose the same operations with typed errors.
///
/// No locking spans a load and the save that follows it; two writers of the
/// same collection race and the last save wins.
pub struct Store {
    config: StoreConfig,
    backend: Arc<dyn Backend>,
    cache: Mutex<LruCache<String, Vec<Record>>>,
}

impl Store {
    /// Open (or create) a file-backed store at `config.path`.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let backend = FileBackend::open_or_create(&config.path, config.create_if_missing)?;
        Ok(Self::with_backend(Arc::new(backend), config))
    }

    /// A store over volatile memory with default settings.
    pub fn in_memory() -> Self {
        Self::with_backend(Arc::new(MemoryBackend::new()), StoreConfig::default())
    }

    /// A store over an arbitrary backend.
    pub fn with_backend(backend: Arc<dyn Backend>, config: StoreConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            backend,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.config.failure_policy
    }

    /// The backend, shared with the session token holder.
    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    /// Backend key for a collection.
    pub fn key_for(&self, collection: &str) -> String {
        format!("{}{}", self.config.namespace, collection)
    }

    /// Records of `collection`, or an empty sequence if absent or corrupt.
    pub fn load(&self, collection: &str) -> Vec<Record> {
        match self.try_load(collection) {
            Ok(records) => records,
            Err(e) => {
                warn!(collection, error = %e, "treating unreadable collection as empty");
                Vec::new()
            }
        }
    }

    /// Records of `collection`. Absent is `Ok(vec![])`; corrupt is an error.
    pub fn try_load(&self, collection: &str) -> Result<Vec<Record>> {
        if let Some(records) = self.cache.lock().get(collection) {
            debug!(collection, "collection cache hit");
            return Ok(records.clone());
        }

        let key = self.key_for(collection);
        let records = match self.backend.read(&key)? {
            None => Vec::new(),
            Some(bytes) => serde_json::from_slice::<Vec<Record>>(&bytes).map_err(|e| {
                StoreError::Deserialization {
                    key: key.clone(),
                    reason: e.to_string(),
                }
            })?,
        };

        debug!(collection, len = records.len(), "collection loaded");
        self.cache.lock().put(collection.to_string(), records.clone());
        Ok(records)
    }

    /// Replace `collection` with `records`. Failures are logged and ignored.
    pub fn save(&self, collection: &str, records: &[Record]) {
        if let Err(e) = self.try_save(collection, records) {
            error!(collection, error = %e, "failed to persist collection");
        }
    }

    /// Replace `collection` with `records`.
    pub fn try_save(&self, collection: &str, records: &[Record]) -> Result<()> {
        let result = serde_json::to_vec(records)
            .map_err(StoreError::from)
            .and_then(|bytes| self.backend.write(&self.key_for(collection), &bytes));

        let mut cache = self.cache.lock();
        match result {
            Ok(()) => {
                cache.put(collection.to_string(), records.to_vec());
                Ok(())
            }
            Err(e) => {
                // Media may still hold the old value.
                cache.pop(collection);
                Err(e)
            }
        }
    }

    /// Remove a collection entirely.
    pub fn clear(&self, collection: &str) -> Result<()> {
        self.cache.lock().pop(collection);
        self.backend.remove(&self.key_for(collection))
    }

    /// Names of all persisted collections in this store's namespace.
    pub fn collections(&self) -> Result<Vec<String>> {
        Ok(self
            .backend
            .keys()?
            .into_iter()
            .filter_map(|key| {
                key.strip_prefix(&self.config.namespace)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
            })
            .collect())
    }

    /// Drop every cached collection so the next load reads the media.
    pub fn invalidate(&self) {
        self.cache.lock().clear();
    }

    /// Sync the backend to durable media.
    pub fn sync(&self) -> Result<()> {
        self.backend.sync()
    }

    /// Sync and release the store. File-backed stores release their lock
    /// once every other handle to the backend is dropped.
    pub fn close(self) -> Result<()> {
        self.sync()
    }
}
