//! In-memory favorites store for testing.

use crate::error::StoreResult;
use crate::favorites::LocalFavoritesStore;
use favsync_model::FavoriteRecord;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory favorites store.
///
/// Suitable for unit tests, integration tests and sessions that do not
/// need persistence.
///
/// # Example
///
/// ```rust
/// use favsync_model::FavoriteRecord;
/// use favsync_store::{InMemoryFavoritesStore, LocalFavoritesStore};
///
/// let store = InMemoryFavoritesStore::with_records(vec![
///     FavoriteRecord::new("u1", "p1", "Café"),
/// ]);
/// assert!(store.delete("p1").unwrap());
/// assert!(!store.delete("p1").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryFavoritesStore {
    records: RwLock<BTreeMap<String, FavoriteRecord>>,
}

impl InMemoryFavoritesStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `records`.
    ///
    /// Later records win when two share a `poi_id`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = FavoriteRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|r| (r.poi_id.clone(), r))
            .collect();
        Self {
            records: RwLock::new(map),
        }
    }

    /// Returns a copy of the record for `poi_id`.
    #[must_use]
    pub fn get(&self, poi_id: &str) -> Option<FavoriteRecord> {
        self.records.read().get(poi_id).cloned()
    }
}

impl LocalFavoritesStore for InMemoryFavoritesStore {
    fn list(&self) -> StoreResult<Vec<FavoriteRecord>> {
        Ok(self.records.read().values().cloned().collect())
    }

    fn contains(&self, poi_id: &str) -> StoreResult<bool> {
        Ok(self.records.read().contains_key(poi_id))
    }

    fn upsert(&self, record: FavoriteRecord) -> StoreResult<()> {
        self.records.write().insert(record.poi_id.clone(), record);
        Ok(())
    }

    fn delete(&self, poi_id: &str) -> StoreResult<bool> {
        Ok(self.records.write().remove(poi_id).is_some())
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.records.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_upsert_replaces() {
        let store = InMemoryFavoritesStore::new();
        store.upsert(FavoriteRecord::new("u1", "p1", "Old")).unwrap();
        store.upsert(FavoriteRecord::new("u1", "p1", "New")).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get("p1").unwrap().nombre, "New");
    }

    #[test]
    fn memory_delete_absent_is_noop() {
        let store = InMemoryFavoritesStore::new();
        assert!(!store.delete("missing").unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn memory_list_is_snapshot() {
        let store = InMemoryFavoritesStore::with_records(vec![
            FavoriteRecord::new("u1", "p1", "A"),
            FavoriteRecord::new("u1", "p2", "B"),
        ]);
        let snapshot = store.list().unwrap();
        store.delete("p1").unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
