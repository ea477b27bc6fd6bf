//! Persistent media underneath the store.
//!
//! A backend is a flat key-value byte store. The collection store writes one
//! key per collection and one key for the session token; it never patches a
//! value in place, it always replaces the whole thing.

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use crate::error::{Result, StoreError};

/// Key-value byte storage used by [`Store`](crate::Store) and
/// [`SessionToken`](crate::SessionToken).
pub trait Backend: Send + Sync {
    /// Read the value under `key`, or `None` if absent.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the value under `key`.
    fn write(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently present.
    fn keys(&self) -> Result<Vec<String>>;

    /// Flush anything buffered to durable media.
    fn sync(&self) -> Result<()> {
        Ok(())
    }
}

/// Reject keys that cannot be mapped safely onto a file name.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty()
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0')
        || key == "."
        || key.contains("..")
    {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
