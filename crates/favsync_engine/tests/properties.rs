//! Property tests for merge and convergence.

use favsync_engine::{MockRemote, StaticIdentity, SyncEngine};
use favsync_model::{FavoriteRecord, PullResponse};
use favsync_store::{InMemoryCursorStore, InMemoryFavoritesStore, LocalFavoritesStore};
use favsync_testkit::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

fn apply(device: &TestDevice, actions: &[LocalAction]) {
    let store = device.engine.favorites();
    for action in actions {
        match action {
            LocalAction::Favorite(record) => store.upsert(record.clone()).unwrap(),
            LocalAction::Unfavorite(poi_id) => {
                store.delete(poi_id).unwrap();
            }
        }
    }
}

fn snapshot(store: &InMemoryFavoritesStore) -> Vec<FavoriteRecord> {
    store.list().unwrap()
}

proptest! {
    #[test]
    fn pulling_the_same_batch_twice_is_idempotent(batch in pull_batch_strategy("u1")) {
        let remote = Arc::new(MockRemote::new());
        let response = PullResponse::new(Some("2024-01-01T00:00:00Z".into()), batch);
        remote.queue_pull(Ok(response.clone()));
        remote.queue_pull(Ok(response));

        let engine = SyncEngine::new(
            Arc::clone(&remote),
            InMemoryFavoritesStore::new(),
            InMemoryCursorStore::new(),
            Arc::new(StaticIdentity::signed_in("u1")),
        );

        engine.pull("u1").unwrap();
        let after_first = snapshot(engine.favorites());
        engine.pull("u1").unwrap();
        let after_second = snapshot(engine.favorites());

        prop_assert_eq!(&after_first, &after_second);
        for record in &after_second {
            prop_assert!(!record.nombre.trim().is_empty());
            prop_assert!(record.calificacion.map_or(true, |r| r.is_finite() && r >= 0.0));
        }
    }

    #[test]
    fn push_uploads_exactly_the_local_set(actions in local_actions_strategy("u1")) {
        let backend = Arc::new(FakeBackend::new());
        let phone = TestDevice::new(&backend, "u1");
        apply(&phone, &actions);

        let result = phone.sync().unwrap();
        prop_assert_eq!(result.pushed, phone.poi_ids().len());
        prop_assert_eq!(backend.poi_ids("u1"), phone.poi_ids());
    }

    #[test]
    fn two_devices_converge(
        phone_actions in local_actions_strategy("u1"),
        tablet_actions in local_actions_strategy("u1"),
    ) {
        let backend = Arc::new(FakeBackend::new());
        let phone = TestDevice::new(&backend, "u1");
        let tablet = TestDevice::new(&backend, "u1");
        apply(&phone, &phone_actions);
        apply(&tablet, &tablet_actions);

        phone.sync().unwrap();
        tablet.sync().unwrap();
        phone.sync().unwrap();

        prop_assert_eq!(phone.poi_ids(), tablet.poi_ids());
        prop_assert_eq!(phone.poi_ids(), backend.poi_ids("u1"));
    }
}
