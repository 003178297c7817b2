//! Durable key-value storage for board state
//!
//! The board keeps a handful of independent keys in one namespace:
//!
//! ```text
//! <data dir>/
//!   kanban.toml          # Configuration (optional)
//!   kanbanTasks          # JSON array of tasks
//!   kanbanTasks.lock     # Advisory lock for writers
//!   theme                # "light" | "dark", owned by the theme layer
//! ```
//!
//! [`FileStore`] maps each key to a file in a directory and writes through
//! the atomic temp-file + rename helpers in [`crate::lock`].
//! [`MemoryStore`] keeps everything in process for tests and embedding.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};

/// Key holding the serialized task collection
pub const TASKS_KEY: &str = "kanbanTasks";

/// Key holding the theme preference. Never written by the task engine.
pub const THEME_KEY: &str = "theme";

/// A byte-oriented key-value namespace.
///
/// Writes replace the whole value; a reader sees either the old or the new
/// bytes, never a mix.
pub trait KeyValueStore: fmt::Debug {
    /// Read the value stored under `key`, `Ok(None)` when absent
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the value stored under `key`
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// When `key` was last written, if the backend can tell
    fn modified(&self, _key: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(None)
    }
}

/// Directory-backed store: one file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the namespace
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it does not exist yet
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Path of the file backing `key`
    pub fn key_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.key_path(key)?;
        lock::read_locked(&path, DEFAULT_LOCK_TIMEOUT_MS)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.key_path(key)?;
        lock::write_atomic_locked(&path, value, DEFAULT_LOCK_TIMEOUT_MS)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        let _lock = lock::FileLock::acquire(lock::lock_path_for(&path), DEFAULT_LOCK_TIMEOUT_MS)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Io(err)),
        }
    }

    fn modified(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let path = self.key_path(key)?;
        match fs::metadata(&path).and_then(|meta| meta.modified()) {
            Ok(time) => Ok(Some(DateTime::<Utc>::from(time))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::Io(err)),
        }
    }
}

/// In-process store.
///
/// Clones share the same map, so a test can keep one handle for inspection
/// while the board owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| Error::OperationFailed("memory store poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        validate_key(key)?;
        self.entries()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.entries()?.remove(key);
        Ok(())
    }
}

pub(crate) fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || ch == '.');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("invalid storage key '{key}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_round_trips_bytes() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("board"));

        assert!(store.get(TASKS_KEY).unwrap().is_none());
        store.set(TASKS_KEY, b"[]").unwrap();
        assert_eq!(store.get(TASKS_KEY).unwrap().as_deref(), Some(&b"[]"[..]));
        assert!(dir.path().join("board").join(TASKS_KEY).exists());
    }

    #[test]
    fn file_store_remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        store.set(THEME_KEY, b"dark").unwrap();
        store.remove(THEME_KEY).unwrap();
        store.remove(THEME_KEY).unwrap();
        assert!(store.get(THEME_KEY).unwrap().is_none());
    }

    #[test]
    fn keys_cannot_escape_the_namespace() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        for key in ["", "../kanbanTasks", "a/b", ".hidden"] {
            let err = store.set(key, b"x").expect_err("invalid key");
            assert!(matches!(err, Error::InvalidArgument(_)), "{key}");
        }
    }

    #[test]
    fn file_store_reports_last_write_time() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.modified(TASKS_KEY).unwrap().is_none());

        let before = Utc::now() - chrono::Duration::seconds(5);
        store.set(TASKS_KEY, b"[]").unwrap();
        let written = store.modified(TASKS_KEY).unwrap().expect("mtime");
        assert!(written >= before);
        assert!(written <= Utc::now() + chrono::Duration::seconds(5));
    }

    #[test]
    fn memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let handle = store.clone();

        store.set(TASKS_KEY, b"[1]").unwrap();
        assert_eq!(handle.get(TASKS_KEY).unwrap(), Some(b"[1]".to_vec()));

        handle.remove(TASKS_KEY).unwrap();
        assert!(store.get(TASKS_KEY).unwrap().is_none());
    }
}
