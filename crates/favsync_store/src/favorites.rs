//! Local favorites store trait definition.

use crate::error::StoreResult;
use favsync_model::FavoriteRecord;
use std::sync::Arc;

/// Durable local CRUD over favorite records.
///
/// Records are keyed by `poi_id`; a store belongs to one installation, so
/// `(user_id, poi_id)` is unique whenever `poi_id` is.
///
/// # Invariants
///
/// - At most one record per `poi_id`
/// - `upsert` replaces the whole record, never merges fields
/// - `delete` of an absent key is a successful no-op
/// - A failed mutation leaves the store as it was before the call
/// - `list` returns a consistent snapshot; order is unspecified
///
/// # Implementors
///
/// - [`super::InMemoryFavoritesStore`] - For testing
/// - [`super::FileFavoritesStore`] - For persistent storage
pub trait LocalFavoritesStore: Send + Sync {
    /// Returns every stored favorite.
    fn list(&self) -> StoreResult<Vec<FavoriteRecord>>;

    /// Returns true if a favorite exists for `poi_id`.
    fn contains(&self, poi_id: &str) -> StoreResult<bool>;

    /// Inserts `record`, replacing any record with the same `poi_id`.
    fn upsert(&self, record: FavoriteRecord) -> StoreResult<()>;

    /// Removes the favorite for `poi_id`.
    ///
    /// Returns true if a record was removed.
    fn delete(&self, poi_id: &str) -> StoreResult<bool>;

    /// Returns the number of stored favorites.
    fn count(&self) -> StoreResult<usize>;
}

impl<T: LocalFavoritesStore + ?Sized> LocalFavoritesStore for Arc<T> {
    fn list(&self) -> StoreResult<Vec<FavoriteRecord>> {
        (**self).list()
    }

    fn contains(&self, poi_id: &str) -> StoreResult<bool> {
        (**self).contains(poi_id)
    }

    fn upsert(&self, record: FavoriteRecord) -> StoreResult<()> {
        (**self).upsert(record)
    }

    fn delete(&self, poi_id: &str) -> StoreResult<bool> {
        (**self).delete(poi_id)
    }

    fn count(&self) -> StoreResult<usize> {
        (**self).count()
    }
}
