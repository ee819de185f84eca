//! Local key-value storage port
//!
//! The identity and city records live in a small string-keyed store.
//! The CLI binds it to a JSON file in the data directory; tests use the
//! in-memory implementation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

/// Errors from the local store
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O operation failed
    #[error("IO error on {path:?}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    /// Stored file could not be parsed or written
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A writer panicked while holding the lock
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Synchronous string key-value store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Volatile store used in tests and for throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store persisted as a JSON object on disk.
///
/// Every `set` rewrites the file through a temporary sibling and a
/// rename, so a crash leaves either the old or the new contents.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating parent directories as needed
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|error| StoreError::Io {
                    path: parent.to_path_buf(),
                    error,
                })?;
            }
        }

        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => return Err(StoreError::Io { path, error }),
        };

        tracing::debug!(path = ?path, keys = entries.len(), "Opened local store");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, content).map_err(|error| StoreError::Io {
            path: tmp.clone(),
            error,
        })?;
        fs::rename(&tmp, &self.path).map_err(|error| StoreError::Io {
            path: self.path.clone(),
            error,
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        let mut updated = entries.clone();
        updated.insert(key.to_string(), value.to_string());
        self.persist(&updated)?;
        *entries = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("city").unwrap(), None);

        store.set("city", "Paris").unwrap();
        store.set("city", "Berlin").unwrap();
        assert_eq!(store.get("city").unwrap().as_deref(), Some("Berlin"));
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("local.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.set("user", "abc").unwrap();
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("user").unwrap().as_deref(), Some("abc"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_store_failed_write_is_not_visible() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local.json");
        let store = FileStore::open(&path).unwrap();
        store.set("city", "Paris").unwrap();

        // A directory in the temp file's place makes the next write fail
        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();

        assert!(store.set("city", "Berlin").is_err());
        assert_eq!(store.get("city").unwrap().as_deref(), Some("Paris"));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
