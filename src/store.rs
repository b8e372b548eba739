//! Key-Value Store
//!
//! String-keyed JSON persistence behind a trait so every component receives
//! the store as a dependency instead of reaching into ambient storage.
//! Callers re-read before every write; nothing is cached in memory between
//! ticks, which keeps independent instances over the same backing dir
//! coherent.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::{FaceError, Result};

/// String-keyed JSON get/set
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Typed convenience wrappers over the raw JSON interface
pub trait KvStoreExt: KvStore {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value).map_err(|e| {
                FaceError::StoreError {
                    key: key.to_string(),
                    message: e.to_string(),
                }
            })?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| FaceError::StoreError {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.set(key, value)
    }
}

impl<S: KvStore + ?Sized> KvStoreExt for S {}

/// File-backed store: one JSON file per key under a base directory.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir).map_err(|e| FaceError::StoreError {
            key: base_dir.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { base_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are simple identifiers; anything path-hostile gets mangled
        let safe: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("{safe}.json"))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| FaceError::StoreError {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                // A corrupt entry degrades to "absent" rather than wedging
                // every consumer of the store
                tracing::warn!("Dropping corrupt store entry '{}': {}", key, e);
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let path = self.path_for(key);
        let content = serde_json::to_string_pretty(&value).map_err(|e| FaceError::StoreError {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        fs::write(&path, content).map_err(|e| FaceError::StoreError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| FaceError::StoreError {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}

/// In-memory store for tests and ephemeral runs
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.lock().map_err(|e| FaceError::StoreError {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|e| FaceError::StoreError {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|e| FaceError::StoreError {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        entries.remove(key);
        Ok(())
    }
}
