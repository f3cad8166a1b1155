//! Non-durable storage backends.
//!
//! `MemoryStorage` keeps values for the process lifetime and clones share one
//! map. `UnavailableStorage` stands in when no on-device storage exists: it
//! always reads empty and drops writes.

use crate::repo::kv_repo::{SnapshotStorage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage pre-seeded with one entry.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let storage = Self::new();
        if let Ok(mut entries) = storage.entries.lock() {
            entries.insert(key.into(), value.into());
        }
        storage
    }

    pub fn len(&self) -> usize {
        self.lock().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Backend("memory storage lock poisoned".to_string()))
    }
}

impl SnapshotStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Storage for environments without on-device persistence.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStorage;

impl SnapshotStorage for UnavailableStorage {
    fn get_item(&self, _key: &str) -> StorageResult<Option<String>> {
        Ok(None)
    }

    fn set_item(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Ok(())
    }

    fn remove_item(&self, _key: &str) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryStorage, UnavailableStorage};
    use crate::repo::kv_repo::SnapshotStorage;

    #[test]
    fn clones_share_entries() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        storage.set_item("k", "v").unwrap();
        assert_eq!(handle.get_item("k").unwrap().as_deref(), Some("v"));
        assert_eq!(handle.len(), 1);
        handle.remove_item("k").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn unavailable_storage_reads_empty_after_write() {
        let storage = UnavailableStorage;
        storage.set_item("k", "v").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }
}
