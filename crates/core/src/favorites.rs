//! Favorited products.

use std::sync::Arc;

use crate::storage::{self, KeyValueStore, keys};
use crate::types::ProductId;

/// Ordered set of favorited product ids, oldest first.
pub struct FavoritesStore {
    storage: Arc<dyn KeyValueStore>,
}

impl FavoritesStore {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Stored favorites with duplicates removed; empty on corrupt data.
    #[must_use]
    pub fn list(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> =
            storage::read_json(&*self.storage, keys::FAVORITES).unwrap_or_default();
        let mut seen = std::collections::HashSet::new();
        ids.retain(|id| seen.insert(id.clone()));
        ids
    }

    #[must_use]
    pub fn is_favorite(&self, id: &ProductId) -> bool {
        self.list().contains(id)
    }

    /// Add or remove `id`; returns whether it is a favorite afterwards.
    pub fn toggle(&self, id: &ProductId) -> bool {
        let mut ids = self.list();
        let now_favorite = if let Some(pos) = ids.iter().position(|f| f == id) {
            ids.remove(pos);
            false
        } else {
            ids.push(id.clone());
            true
        };
        storage::write_json(&*self.storage, keys::FAVORITES, &ids);
        now_favorite
    }

    pub fn remove(&self, id: &ProductId) {
        let mut ids = self.list();
        let before = ids.len();
        ids.retain(|f| f != id);
        if ids.len() != before {
            storage::write_json(&*self.storage, keys::FAVORITES, &ids);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_toggle() {
        let favorites = FavoritesStore::new(Arc::new(MemoryStorage::new()));
        let id = ProductId::new("coleira");

        assert!(favorites.toggle(&id));
        assert!(favorites.is_favorite(&id));
        assert!(!favorites.toggle(&id));
        assert!(favorites.list().is_empty());
    }

    #[test]
    fn test_list_dedupes_and_accepts_numeric_ids() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::FAVORITES, r#"[3,"3","a"]"#).unwrap();

        let favorites = FavoritesStore::new(storage);
        assert_eq!(favorites.list(), vec![ProductId::new("3"), ProductId::new("a")]);

        favorites.remove(&ProductId::new("3"));
        assert_eq!(favorites.list(), vec![ProductId::new("a")]);
    }

    #[test]
    fn test_corrupt_reads_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::FAVORITES, "{").unwrap();
        assert!(FavoritesStore::new(storage).list().is_empty());
    }
}
