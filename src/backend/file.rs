//! Directory-backed backend: one JSON file per key.

use super::{validate_key, Backend};
use crate::error::{Result, StoreError};
use fs2::FileExt;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

/// Magic bytes for the store manifest.
const STORE_MAGIC: &[u8; 4] = b"DPT\0";

/// Current store format version.
const STORE_VERSION: u8 = 1;

/// Extension of value files.
const VALUE_EXT: &str = "json";

/// Key-value storage in a directory, held exclusively by one process.
///
/// Writes go to a temporary file that is synced and then renamed over the
/// target, so a reader sees either the old or the new value, never a mix.
pub struct FileBackend {
    /// Base directory.
    path: PathBuf,

    /// Lock file for exclusive access.
    _lock_file: File,
}

impl FileBackend {
    /// Open an existing directory or create a new one.
    pub fn open_or_create(path: impl AsRef<Path>, create_if_missing: bool) -> Result<Self> {
        let path = path.as_ref();
        if path.join("MANIFEST").exists() {
            Self::open(path)
        } else if create_if_missing {
            Self::create(path)
        } else {
            Err(StoreError::NotInitialized)
        }
    }

    /// Initialize a new store directory.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        fs::create_dir_all(&path)?;
        Self::write_manifest(&path)?;
        let lock_file = Self::acquire_lock(&path)?;

        Ok(Self {
            path,
            _lock_file: lock_file,
        })
    }

    /// Open an existing store directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        Self::verify_manifest(&path)?;
        let lock_file = Self::acquire_lock(&path)?;

        Ok(Self {
            path,
            _lock_file: lock_file,
        })
    }

    /// Base directory of this backend.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.path.join(format!("{key}.{VALUE_EXT}"))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.path.join(format!("{key}.{VALUE_EXT}.tmp"))
    }

    fn write_manifest(path: &Path) -> Result<()> {
        let mut file = File::create(path.join("MANIFEST"))?;
        file.write_all(STORE_MAGIC)?;
        file.write_all(&[STORE_VERSION])?;
        file.sync_all()?;
        Ok(())
    }

    fn verify_manifest(path: &Path) -> Result<()> {
        let mut file = File::open(path.join("MANIFEST"))?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != STORE_MAGIC {
            return Err(StoreError::InvalidFormat("Invalid store magic".into()));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != STORE_VERSION {
            return Err(StoreError::InvalidFormat(format!(
                "Unsupported store version: {}",
                version[0]
            )));
        }

        Ok(())
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_file = File::create(path.join("LOCK"))?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| StoreError::Locked)?;
        Ok(lock_file)
    }
}

impl Backend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        match fs::read(self.value_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        validate_key(key)?;
        let tmp = self.temp_path(key);
        {
            let mut file = File::create(&tmp)?;
            file.write_all(value)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, self.value_path(key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        match fs::remove_file(self.value_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let suffix = format!(".{VALUE_EXT}");
        let mut keys = Vec::new();

        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if let Some(key) = name.to_string_lossy().strip_suffix(&suffix) {
                keys.push(key.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn sync(&self) -> Result<()> {
        // Directory fsync makes completed renames durable.
        #[cfg(unix)]
        File::open(&self.path)?.sync_all()?;
        Ok(())
    }
}
