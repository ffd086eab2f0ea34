// Key-value storage backends for persisted task state

use crate::error::{Result, TaskError};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// String key-value store the task store persists into
pub trait Storage {
    /// Read a value, `None` if the key was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-process storage, optionally capped at a total byte quota
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that refuses writes once keys plus values exceed `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(bytes),
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota {
            let needed = self.used_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(TaskError::persistence(
                    key,
                    format!("quota exceeded ({} of {} bytes)", needed, quota),
                ));
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Directory-backed storage, one `<key>.json` file per key
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Open or create storage in the given directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).map_err(|e| {
            TaskError::persistence(
                base_path.display().to_string(),
                format!("failed to create storage directory: {}", e),
            )
        })?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        Self::validate_key(key)?;
        Ok(self.base_path.join(format!("{}.json", key)))
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(TaskError::persistence(key, "key cannot be empty"));
        }
        if key.len() > 64 {
            return Err(TaskError::persistence(key, "key too long (max 64 chars)"));
        }
        if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
            return Err(TaskError::persistence(key, "key must be alphanumeric with _/-"));
        }
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let read = || -> std::io::Result<String> {
            let mut file = fs::File::open(&path)?;
            file.lock_shared()?;
            let mut content = String::new();
            file.read_to_string(&mut content)?;
            Ok(content)
        };

        read().map(Some).map_err(|e| TaskError::persistence(key, e.to_string()))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;

        let write = || -> std::io::Result<()> {
            let mut file = OpenOptions::new().create(true).write(true).truncate(false).open(&path)?;

            // Truncate only once we hold the lock
            file.lock_exclusive()?;
            file.set_len(0)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            Ok(())
        };

        write().map_err(|e| TaskError::persistence(key, e.to_string()))?;
        debug!(key, bytes = value.len(), "Wrote storage entry");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_storage_roundtrip() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", "v1").unwrap();
        storage.set("k", "v2").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(storage.get("other").unwrap(), None);
    }

    #[test]
    fn test_memory_storage_quota() {
        let mut storage = MemoryStorage::with_quota(10);
        storage.set("ab", "12345678").unwrap();
        // Replacing a key only counts the new value
        storage.set("ab", "87654321").unwrap();

        let err = storage.set("c", "x").unwrap_err();
        assert!(matches!(err, TaskError::Persistence { ref key, .. } if key == "c"));
        assert_eq!(storage.get("c").unwrap(), None);
    }

    #[test]
    fn test_file_storage_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("store");

        let storage = FileStorage::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(storage.base_path(), dir.as_path());
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();

        storage.set("taskflow_tasks", "[1,2,3]").unwrap();
        assert!(temp.path().join("taskflow_tasks.json").exists());
        assert_eq!(storage.get("taskflow_tasks").unwrap().as_deref(), Some("[1,2,3]"));

        // Shorter rewrite must not leave trailing bytes
        storage.set("taskflow_tasks", "[]").unwrap();
        assert_eq!(storage.get("taskflow_tasks").unwrap().as_deref(), Some("[]"));

        // Persists across handles
        let reopened = FileStorage::open(temp.path()).unwrap();
        assert_eq!(reopened.get("taskflow_tasks").unwrap().as_deref(), Some("[]"));
        assert_eq!(reopened.get("taskflow_task_id_counter").unwrap(), None);
    }

    #[test]
    fn test_file_storage_rejects_bad_keys() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();

        assert!(storage.set("../escape", "x").is_err());
        assert!(storage.set("", "x").is_err());
        assert!(storage.get(&"a".repeat(65)).is_err());
        assert!(storage.set("valid_key-1", "x").is_ok());
    }
}
