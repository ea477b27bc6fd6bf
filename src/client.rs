//! Client tying the store and session token together.

use crate::error::Result;
use crate::query::QueryBuilder;
use crate::session::SessionToken;
use crate::store::{Store, StoreConfig};
use crate::types::CollectionName;
use std::sync::Arc;

/// Entry point for dashboard code: builds queries and holds the session token.
pub struct Client {
    store: Arc<Store>,
    session: SessionToken,
}

impl Client {
    /// Open a file-backed client.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Ok(Self::with_store(Store::open(config)?))
    }

    /// A client over volatile memory.
    pub fn in_memory() -> Self {
        Self::with_store(Store::in_memory())
    }

    /// Wrap an existing store. The session token shares its backend.
    pub fn with_store(store: Store) -> Self {
        let session = SessionToken::new(store.backend());
        Self {
            store: Arc::new(store),
            session,
        }
    }

    /// Start a query on `collection`.
    pub fn from(&self, collection: impl Into<CollectionName>) -> QueryBuilder {
        QueryBuilder::new(Arc::clone(&self.store)).from(collection)
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn get_token(&self) -> Option<String> {
        self.session.get()
    }

    /// Replace or clear (`None`) the session token.
    pub fn set_token(&self, token: Option<&str>) {
        self.session.set(token);
    }

    /// Sync the store. Outstanding builders keep the store alive until they
    /// are dropped.
    pub fn close(self) -> Result<()> {
        self.store.sync()
    }
}
