//! File-based favorites store for persistent storage.

use crate::error::{StoreError, StoreResult};
use crate::favorites::LocalFavoritesStore;
use favsync_model::FavoriteRecord;
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk format version.
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    favorites: Vec<FavoriteRecord>,
}

/// A file-based favorites store.
///
/// The whole store is one JSON document. Data survives process restarts.
///
/// # Durability
///
/// Every mutation writes the complete new document to a temporary file,
/// syncs it, and renames it over the previous one. The in-memory copy is
/// only replaced after the rename succeeds, so a failed write leaves both
/// disk and memory unchanged.
///
/// # Thread Safety
///
/// Writers hold an exclusive lock on `<path>.lock` for the whole
/// read-modify-write, so stores opened on the same file by other threads
/// or processes never overwrite each other's changes. Each mutation
/// re-reads the file under that lock before applying the change. Readers
/// work on the in-memory copy, as of the last open or mutation, and never
/// observe a half-applied record.
///
/// # Example
///
/// ```no_run
/// use favsync_model::FavoriteRecord;
/// use favsync_store::{FileFavoritesStore, LocalFavoritesStore};
/// use std::path::Path;
///
/// let store = FileFavoritesStore::open(Path::new("favorites.json")).unwrap();
/// store.upsert(FavoriteRecord::new("u1", "p1", "Café")).unwrap();
/// ```
#[derive(Debug)]
pub struct FileFavoritesStore {
    path: PathBuf,
    records: RwLock<BTreeMap<String, FavoriteRecord>>,
    write_lock: Mutex<()>,
}

impl FileFavoritesStore {
    /// Opens the store at `path`, creating an empty one if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupted`] if the file exists but cannot be
    /// decoded, or an I/O error if it cannot be read.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let records = read_records(path)?;

        debug!(path = %path.display(), count = records.len(), "opened favorites store");

        Ok(Self {
            path: path.to_path_buf(),
            records: RwLock::new(records),
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `change` to the current file contents and persists them.
    ///
    /// `change` returns whether it modified the records; nothing is
    /// written otherwise.
    fn mutate(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, FavoriteRecord>) -> bool,
    ) -> StoreResult<bool> {
        let _guard = self.write_lock.lock();
        let _lock = lock_exclusive(&self.path)?;

        let mut next = read_records(&self.path)?;
        let changed = change(&mut next);

        if changed {
            let document = StoreFile {
                version: FORMAT_VERSION,
                favorites: next.values().cloned().collect(),
            };
            let bytes = serde_json::to_vec_pretty(&document)?;
            write_atomic(&self.path, &bytes)?;
        }

        *self.records.write() = next;
        Ok(changed)
    }
}

impl LocalFavoritesStore for FileFavoritesStore {
    fn list(&self) -> StoreResult<Vec<FavoriteRecord>> {
        Ok(self.records.read().values().cloned().collect())
    }

    fn contains(&self, poi_id: &str) -> StoreResult<bool> {
        Ok(self.records.read().contains_key(poi_id))
    }

    fn upsert(&self, record: FavoriteRecord) -> StoreResult<()> {
        self.mutate(|records| {
            records.insert(record.poi_id.clone(), record);
            true
        })?;
        Ok(())
    }

    fn delete(&self, poi_id: &str) -> StoreResult<bool> {
        self.mutate(|records| records.remove(poi_id).is_some())
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.records.read().len())
    }
}

fn read_records(path: &Path) -> StoreResult<BTreeMap<String, FavoriteRecord>> {
    match fs::read(path) {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
        Ok(bytes) => decode(path, &bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e.into()),
    }
}

fn decode(path: &Path, bytes: &[u8]) -> StoreResult<BTreeMap<String, FavoriteRecord>> {
    let document: StoreFile =
        serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupted {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if document.version != FORMAT_VERSION {
        return Err(StoreError::Corrupted {
            path: path.to_path_buf(),
            reason: format!("unsupported format version {}", document.version),
        });
    }

    Ok(document
        .favorites
        .into_iter()
        .map(|r| (r.poi_id.clone(), r))
        .collect())
}

/// Blocks until this process holds the exclusive lock on `<path>.lock`.
///
/// The lock is released when the returned file is dropped.
pub(crate) fn lock_exclusive(path: &Path) -> StoreResult<File> {
    let mut lock_path = path.as_os_str().to_owned();
    lock_path.push(".lock");
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(PathBuf::from(lock_path))?;
    file.lock_exclusive()?;
    Ok(file)
}

/// Replaces the contents of `path` with `bytes` via temp file and rename.
///
/// Callers hold the lock from [`lock_exclusive`], which makes the fixed
/// temp file name private to them.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    {
        let mut file = File::create(&temp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&temp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_create_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");

        let store = FileFavoritesStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn file_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");

        {
            let store = FileFavoritesStore::open(&path).unwrap();
            store
                .upsert(FavoriteRecord::new("u1", "p1", "Café").with_location(40.4, -3.7))
                .unwrap();
            store.upsert(FavoriteRecord::new("u1", "p2", "Museo")).unwrap();
            store.delete("p2").unwrap();
        }

        let store = FileFavoritesStore::open(&path).unwrap();
        let records = store.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].nombre, "Café");
        assert_eq!(records[0].lat, Some(40.4));
    }

    #[test]
    fn file_failed_write_leaves_store_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");

        let store = FileFavoritesStore::open(&path).unwrap();
        store.upsert(FavoriteRecord::new("u1", "p1", "Café")).unwrap();

        // A directory where the temp file should go makes the write fail.
        fs::create_dir(dir.path().join("favorites.json.tmp")).unwrap();

        let result = store.upsert(FavoriteRecord::new("u1", "p2", "Museo"));
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert_eq!(store.count().unwrap(), 1);
        assert!(!store.contains("p2").unwrap());

        let reopened = FileFavoritesStore::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[test]
    fn file_delete_absent_does_not_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");

        let store = FileFavoritesStore::open(&path).unwrap();
        assert!(!store.delete("missing").unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn file_stores_sharing_a_path_keep_each_others_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");

        let first = FileFavoritesStore::open(&path).unwrap();
        let second = FileFavoritesStore::open(&path).unwrap();
        first.upsert(FavoriteRecord::new("u1", "p1", "Café")).unwrap();
        second.upsert(FavoriteRecord::new("u1", "p2", "Museo")).unwrap();

        assert_eq!(second.count().unwrap(), 2);
        let reopened = FileFavoritesStore::open(&path).unwrap();
        let ids: Vec<_> = reopened.list().unwrap().into_iter().map(|r| r.poi_id).collect();
        assert_eq!(ids, vec!["p1", "p2"]);

        // A delete through a store that never saw the record still applies.
        assert!(first.delete("p2").unwrap());
        assert_eq!(FileFavoritesStore::open(&path).unwrap().count().unwrap(), 1);
    }

    #[test]
    fn file_concurrent_writers_lose_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");

        std::thread::scope(|scope| {
            for writer in 0..2 {
                let path = &path;
                scope.spawn(move || {
                    let store = FileFavoritesStore::open(path).unwrap();
                    for n in 0..100 {
                        let poi_id = format!("w{writer}-{n}");
                        store.upsert(FavoriteRecord::new("u1", poi_id, "Place")).unwrap();
                    }
                });
            }
        });

        let store = FileFavoritesStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 200);
    }

    #[test]
    fn file_corrupted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        fs::write(&path, b"{not json").unwrap();

        let result = FileFavoritesStore::open(&path);
        assert!(matches!(result, Err(StoreError::Corrupted { .. })));
    }

    #[test]
    fn file_unknown_version_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        fs::write(&path, br#"{"version": 9, "favorites": []}"#).unwrap();

        let result = FileFavoritesStore::open(&path);
        assert!(matches!(result, Err(StoreError::Corrupted { .. })));
    }
}
