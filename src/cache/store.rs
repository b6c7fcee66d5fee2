//! Cache store trait and filesystem/in-memory implementations.
//!
//! Writes are atomic (temp file + rename) so a crash mid-write never
//! leaves a corrupt cached artifact. Writers of the same key serialize
//! through a per-key advisory lock; unrelated keys do not contend.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

/// Errors from cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// Metadata refers to an entry whose backing file is missing or
    /// unreadable. Callers treat this as a miss and regenerate.
    #[error("Cache entry '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
}

impl CacheError {
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn corrupt(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Advisory lock for one cache key.
///
/// Cloned handles share the same underlying mutex; hold the guard from
/// `lock()` for the duration of the check-then-populate sequence.
#[derive(Clone)]
pub struct KeyLock {
    inner: Arc<Mutex<()>>,
}

impl KeyLock {
    fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(())),
        }
    }

    /// Block until this key's lock is available.
    pub fn lock(&self) -> parking_lot::MutexGuard<'_, ()> {
        self.inner.lock()
    }
}

/// Key-value store for cached artifacts.
///
/// Keys are slash-separated relative paths. `get` returns the backing
/// file path only when the entry exists and is readable.
pub trait CacheStore: Send + Sync {
    /// Look up a key. Returns the artifact path if present and intact.
    fn get(&self, key: &str) -> Option<PathBuf>;

    /// Write bytes under a key atomically, returning the artifact path.
    fn put(&self, key: &str, bytes: &[u8]) -> CacheResult<PathBuf>;

    /// Remove a key (missing keys are not an error).
    fn remove(&self, key: &str) -> CacheResult<()>;

    /// Advisory lock for a key. Concurrent callers of the same key get
    /// the same lock; different keys lock independently.
    fn key_lock(&self, key: &str) -> KeyLock;

    /// Absolute path an artifact would live at, whether or not it exists.
    fn path_for(&self, key: &str) -> PathBuf;
}

/// Filesystem-backed cache store rooted at one directory.
pub struct FsCacheStore {
    root: PathBuf,
    locks: Mutex<HashMap<String, KeyLock>>,
}

impl FsCacheStore {
    /// Create a store rooted at `root`. The directory is created lazily
    /// on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CacheStore for FsCacheStore {
    fn get(&self, key: &str) -> Option<PathBuf> {
        let path = self.path_for(key);
        // A zero-byte file is a write that never completed elsewhere.
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => Some(path),
            _ => None,
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> CacheResult<PathBuf> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CacheError::io("creating cache directory", e))?;
        }

        // Temp file in the same directory so the rename stays atomic.
        let temp_path = path.with_extension("tmp");
        {
            let mut file = fs::File::create(&temp_path)
                .map_err(|e| CacheError::io("creating cache temp file", e))?;
            file.write_all(bytes)
                .map_err(|e| CacheError::io("writing cache temp file", e))?;
            file.sync_all()
                .map_err(|e| CacheError::io("syncing cache temp file", e))?;
        }
        fs::rename(&temp_path, &path).map_err(|e| CacheError::io("renaming cache entry", e))?;

        Ok(path)
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io("removing cache entry", e)),
        }
    }

    fn key_lock(&self, key: &str) -> KeyLock {
        let mut locks = self.locks.lock();
        locks.entry(key.to_string()).or_insert_with(KeyLock::new).clone()
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

/// In-memory cache store for tests.
///
/// Backed by a tempdir-free map of byte buffers; `path_for` points into a
/// scratch directory so callers that need real files still work.
pub struct MemoryCacheStore {
    scratch: PathBuf,
    entries: Mutex<HashMap<String, Vec<u8>>>,
    locks: Mutex<HashMap<String, KeyLock>>,
}

impl MemoryCacheStore {
    /// Create a store whose materialized files land under `scratch`.
    pub fn new(scratch: impl Into<PathBuf>) -> Self {
        Self {
            scratch: scratch.into(),
            entries: Mutex::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Option<PathBuf> {
        let entries = self.entries.lock();
        if entries.contains_key(key) {
            let path = self.path_for(key);
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    fn put(&self, key: &str, bytes: &[u8]) -> CacheResult<PathBuf> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CacheError::io("creating scratch directory", e))?;
        }
        fs::write(&path, bytes).map_err(|e| CacheError::io("writing scratch entry", e))?;
        self.entries.lock().insert(key.to_string(), bytes.to_vec());
        Ok(path)
    }

    fn remove(&self, key: &str) -> CacheResult<()> {
        self.entries.lock().remove(key);
        let path = self.path_for(key);
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io("removing scratch entry", e)),
        }
    }

    fn key_lock(&self, key: &str) -> KeyLock {
        let mut locks = self.locks.lock();
        locks.entry(key.to_string()).or_insert_with(KeyLock::new).clone()
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.scratch.join(key)
    }
}
