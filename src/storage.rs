// Key-value storage backends for site state.
// Mirrors the per-origin local storage a browser gives page scripts:
// string keys, string values, shared by every tab of the profile.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dashmap::DashMap;

use crate::error::StorageError;

pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// In-memory storage. Used for ephemeral profiles and as the test fake.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.entries.clear();
        Ok(())
    }
}

/// Storage persisted as a single JSON object file.
///
/// The whole map is loaded once on open and rewritten on every mutation.
/// Writes go to a `.tmp` sibling first and are renamed into place, so a
/// crash never leaves a half-written file behind.
pub struct FileStorage {
    entries: Mutex<HashMap<String, String>>,
    path: PathBuf,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load(&path);
        log::info!("[Storage] Opened {:?} with {} keys", path, entries.len());

        Self {
            entries: Mutex::new(entries),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> HashMap<String, String> {
        if !path.exists() {
            return HashMap::new();
        }

        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("[Storage] Failed to parse {:?}: {}, starting empty", path, e);
                    HashMap::new()
                }
            },
            Err(e) => {
                log::warn!("[Storage] Failed to read {:?}: {}, starting empty", path, e);
                HashMap::new()
            }
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        let tmp_path = self.path.with_extension("tmp");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&tmp_path, json)?;
        fs::rename(tmp_path, &self.path)?;

        Ok(())
    }

    fn mutate<F>(&self, apply: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        let mut next = entries.clone();
        apply(&mut next);
        // Memory only changes once the file write has succeeded.
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.mutate(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.mutate(|entries| entries.clear())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("cart").unwrap(), None);

        storage.set("cart", "[]").unwrap();
        storage.set("role", "customer").unwrap();
        assert_eq!(storage.get("cart").unwrap().as_deref(), Some("[]"));
        assert_eq!(storage.len(), 2);

        storage.remove("cart").unwrap();
        assert_eq!(storage.get("cart").unwrap(), None);
        assert_eq!(storage.get("role").unwrap().as_deref(), Some("customer"));

        storage.clear().unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profile").join("local_storage.json");

        {
            let storage = FileStorage::open(&path);
            storage.set("cart", r#"[{"name":"Margherita","date":"2024-07-01","time":"18:00"}]"#).unwrap();
            storage.set("role", "admin").unwrap();
            storage.remove("role").unwrap();
        }

        let reopened = FileStorage::open(&path);
        assert!(reopened.get("cart").unwrap().unwrap().contains("Margherita"));
        assert_eq!(reopened.get("role").unwrap(), None);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_file_storage_corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        fs::write(&path, "{ not json").unwrap();

        let storage = FileStorage::open(&path);
        assert_eq!(storage.get("cart").unwrap(), None);

        // First write replaces the corrupt file.
        storage.set("cart", "[]").unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        let parsed: HashMap<String, String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.get("cart").map(String::as_str), Some("[]"));
    }

    #[test]
    fn test_file_storage_clear() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local_storage.json");
        let storage = FileStorage::open(&path);
        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();

        storage.clear().unwrap();

        assert_eq!(storage.get("a").unwrap(), None);
        assert!(FileStorage::open(&path).get("b").unwrap().is_none());
    }
}
