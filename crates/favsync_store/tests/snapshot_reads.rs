//! Readers and a writer sharing one store.

use favsync_model::FavoriteRecord;
use favsync_store::{FileFavoritesStore, InMemoryFavoritesStore, LocalFavoritesStore};
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

fn record(i: usize) -> FavoriteRecord {
    FavoriteRecord::new("u1", format!("p{i}"), format!("Place {i}"))
        .with_category("museum")
        .with_location(i as f64, -(i as f64))
}

fn readers_see_whole_records<S: LocalFavoritesStore + 'static>(store: Arc<S>) {
    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..50 {
                store.upsert(record(i)).unwrap();
                if i % 3 == 0 {
                    store.delete(&format!("p{}", i / 2)).unwrap();
                }
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..50 {
                    for r in store.list().unwrap() {
                        let i: usize = r.poi_id[1..].parse().unwrap();
                        assert_eq!(r, record(i));
                    }
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn memory_store_snapshot_reads() {
    readers_see_whole_records(Arc::new(InMemoryFavoritesStore::new()));
}

#[test]
fn file_store_snapshot_reads() {
    let dir = tempdir().unwrap();
    let store = FileFavoritesStore::open(&dir.path().join("favorites.json")).unwrap();
    readers_see_whole_records(Arc::new(store));
}
