//! Session token slot.

use crate::backend::Backend;
use crate::error::StoreError;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{error, warn};

/// Backend key holding the session token. Lives outside the collection
/// namespace.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Holds at most one opaque token, persisted across restarts.
///
/// No validation, expiry or refresh: it is a labeled read/write slot.
pub struct SessionToken {
    backend: Arc<dyn Backend>,
    current: RwLock<Option<String>>,
}

impl SessionToken {
    /// Load the persisted token, if any.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let current = Self::read_persisted(backend.as_ref());
        Self {
            backend,
            current: RwLock::new(current),
        }
    }

    fn read_persisted(backend: &dyn Backend) -> Option<String> {
        let bytes = match backend.read(AUTH_TOKEN_KEY) {
            Ok(bytes) => bytes?,
            Err(e) => {
                warn!(error = %e, "could not read session token");
                return None;
            }
        };
        match serde_json::from_slice::<String>(&bytes) {
            Ok(token) if !token.is_empty() => Some(token),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "ignoring undecodable session token");
                None
            }
        }
    }

    pub fn get(&self) -> Option<String> {
        self.current.read().clone()
    }

    /// Replace the token. `None` or an empty string clears it.
    ///
    /// The in-memory value always changes; a failed persist is only logged.
    pub fn set(&self, token: Option<&str>) {
        let token = token.filter(|t| !t.is_empty()).map(str::to_string);

        let result = match &token {
            Some(t) => serde_json::to_vec(t)
                .map_err(StoreError::from)
                .and_then(|bytes| self.backend.write(AUTH_TOKEN_KEY, &bytes)),
            None => self.backend.remove(AUTH_TOKEN_KEY),
        };
        if let Err(e) = result {
            error!(error = %e, "failed to persist session token");
        }

        *self.current.write() = token;
    }

    pub fn clear(&self) {
        self.set(None);
    }
}
