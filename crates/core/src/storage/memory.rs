//! In-memory storage backend.
//!
//! Keeps everything in a map with no persistence. The storefront seeds one of
//! these from a visitor's session at the start of a request and writes the
//! snapshot back at the end.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{KeyValueStore, Result, StorageError};

/// In-memory key-value store. Thread-safe via `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    #[must_use]
    pub fn from_map(entries: HashMap<String, String>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Copy out every entry.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Poisoned`] if a writer panicked.
    pub fn snapshot(&self) -> Result<HashMap<String, String>> {
        self.entries
            .read()
            .map(|entries| entries.clone())
            .map_err(|_| StorageError::Poisoned)
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", "v1").unwrap();
        storage.set("k", "v2").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v2"));

        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let storage = MemoryStorage::new();
        storage.set("a", "1").unwrap();

        let restored = MemoryStorage::from_map(storage.snapshot().unwrap());
        assert_eq!(restored.get("a").unwrap().as_deref(), Some("1"));
    }
}
