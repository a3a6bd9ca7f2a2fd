//! Integration tests for the sync engine against an in-memory backend.
//!
//! Every request goes through the real `HttpRemote` and the loopback
//! client, so wire encoding and status handling are exercised as well.

use favsync_engine::{
    HttpRemote, LoopbackClient, NetworkType, StaticIdentity, StaticNetwork, SyncEngine, SyncError,
    SyncJob, SyncScheduler, SyncStatus,
};
use favsync_store::{CursorStore, LocalFavoritesStore};
use favsync_testkit::prelude::*;
use std::sync::Arc;

fn backend() -> Arc<FakeBackend> {
    Arc::new(FakeBackend::new())
}

#[test]
fn fresh_device_receives_server_favorites() {
    let backend = backend();
    backend.insert_favorite(sample_record("u1", "p1"));
    backend.insert_favorite(sample_record("u1", "p2"));
    backend.insert_favorite(sample_record("u2", "p9"));

    let phone = TestDevice::new(&backend, "u1");
    let result = phone.sync().unwrap();

    assert_eq!(result.favorites_added, 2);
    assert_eq!(result.favorites_updated, 0);
    assert_eq!(result.favorites_removed, 0);
    assert_eq!(result.pushed, 2);
    assert!(!result.partial);
    assert_eq!(phone.poi_ids(), vec!["p1", "p2"]);
    assert_eq!(
        phone.engine.cursor().get().unwrap(),
        result.server_timestamp
    );
}

#[test]
fn removal_on_server_propagates_to_device() {
    let backend = backend();
    let phone = TestDevice::new(&backend, "u1");
    phone.favorite("p1");
    phone.favorite("p2");
    phone.sync().unwrap();

    // The user unfavorites p1 on another channel.
    backend.remove_favorite("u1", "p1");

    let result = phone.sync().unwrap();
    assert_eq!(result.favorites_removed, 1);
    assert_eq!(result.pushed, 1);
    assert_eq!(phone.poi_ids(), vec!["p2"]);
    assert_eq!(backend.poi_ids("u1"), vec!["p2"]);
}

#[test]
fn failed_pull_still_pushes() {
    let backend = backend();
    let phone = TestDevice::new(&backend, "u1");
    phone.favorite("p1");

    backend.fail_next([503]);
    let result = phone.sync().unwrap();

    assert!(result.partial);
    assert!(result.message.contains("pull failed"));
    assert_eq!(result.pushed, 1);
    assert_eq!(phone.engine.cursor().get().unwrap(), None);
    assert_eq!(backend.poi_ids("u1"), vec!["p1"]);
}

#[test]
fn devices_converge_through_backend() {
    let backend = backend();
    let phone = TestDevice::new(&backend, "u1");
    let tablet = TestDevice::new(&backend, "u1");

    phone.favorite("p1");
    tablet.favorite("p2");

    phone.sync().unwrap();
    tablet.sync().unwrap();
    phone.sync().unwrap();

    assert_eq!(phone.poi_ids(), vec!["p1", "p2"]);
    assert_eq!(tablet.poi_ids(), vec!["p1", "p2"]);
    assert_eq!(backend.poi_ids("u1"), vec!["p1", "p2"]);
}

#[test]
fn repeated_sync_is_stable() {
    let backend = backend();
    backend.insert_favorite(sample_record("u1", "p1"));
    let phone = TestDevice::new(&backend, "u1");

    phone.sync().unwrap();
    let second = phone.sync().unwrap();

    assert_eq!(
        (second.favorites_added, second.favorites_updated, second.favorites_removed),
        (0, 0, 0)
    );
    assert_eq!(phone.poi_ids(), vec!["p1"]);
}

#[test]
fn local_unfavorite_is_not_sent_upstream() {
    let backend = backend();
    let phone = TestDevice::new(&backend, "u1");
    let tablet = TestDevice::new(&backend, "u1");
    phone.favorite("p1");
    phone.sync().unwrap();
    // The second run pulls p1 back and moves the cursor past it.
    phone.sync().unwrap();

    phone.unfavorite("p1");
    let result = phone.sync().unwrap();

    // Push uploads only what exists locally; the backend keeps p1.
    assert_eq!(result.pushed, 0);
    assert!(phone.poi_ids().is_empty());
    assert_eq!(backend.poi_ids("u1"), vec!["p1"]);

    tablet.sync().unwrap();
    assert_eq!(tablet.poi_ids(), vec!["p1"]);
}

#[test]
fn offline_sync_fails_and_recovers() {
    let backend = backend();
    let phone = TestDevice::new(&backend, "u1");
    phone.favorite("p1");

    phone.set_online(false);
    let err = phone.sync().unwrap_err();
    assert!(matches!(err, SyncError::BothPhasesFailed { .. }));
    assert!(err.is_retryable());
    assert_eq!(phone.poi_ids(), vec!["p1"]);
    assert_eq!(backend.push_count(), 0);

    phone.set_online(true);
    phone.sync().unwrap();
    assert_eq!(backend.poi_ids("u1"), vec!["p1"]);
}

#[test]
fn rejected_credentials_are_permanent() {
    let backend = backend();
    let phone = TestDevice::new(&backend, "u1");
    backend.fail_next([401, 403]);

    let err = phone.sync().unwrap_err();
    assert!(err.is_permission_denied());
    assert!(!err.is_retryable());
}

#[test]
fn missing_server_timestamp_uses_device_clock() {
    let backend = backend();
    backend.omit_server_timestamp(true);
    let phone = TestDevice::new(&backend, "u1");

    let result = phone.sync().unwrap();
    assert_eq!(result.server_timestamp.as_deref(), Some("2024-06-01T09:00:00.000Z"));
}

#[test]
fn signed_out_device_only_pushes() {
    let backend = backend();
    let phone = TestDevice::new(&backend, "u1");
    phone.favorite("p1");
    phone.identity.sign_out();

    let result = phone.sync().unwrap();
    assert!(result.partial);
    assert!(result.message.contains("no authenticated user"));
    assert_eq!(backend.pull_count(), 0);
    assert_eq!(backend.poi_ids("u1"), vec!["p1"]);
}

#[test]
fn file_stores_keep_cursor_between_runs() {
    let backend = backend();
    backend.insert_favorite(sample_record("u1", "p1"));
    let data = TempDataDir::new();

    let open_engine = || {
        SyncEngine::new(
            HttpRemote::new(
                "https://favsync.test",
                LoopbackClient::new(Arc::clone(&backend)),
            ),
            data.favorites().unwrap(),
            data.cursor(),
            Arc::new(StaticIdentity::signed_in("u1")),
        )
    };

    let first = open_engine().sync("u1").unwrap();
    assert_eq!(first.favorites_added, 1);

    backend.insert_favorite(sample_record("u1", "p2"));

    let engine = open_engine();
    assert_eq!(engine.cursor().get().unwrap(), first.server_timestamp);
    let second = engine.sync("u1").unwrap();
    assert_eq!(second.favorites_added, 1);
    assert_eq!(engine.favorites().count().unwrap(), 2);
}

#[test]
fn records_of_a_previous_account_stay_local() {
    let backend = backend();
    let phone = TestDevice::new(&backend, "u1");
    phone.favorite("p1");
    phone
        .engine
        .favorites()
        .upsert(sample_record("u0", "p7"))
        .unwrap();

    let result = phone.sync().unwrap();
    assert!(!result.partial, "{}", result.message);
    assert_eq!(result.pushed, 1);
    assert_eq!(backend.poi_ids("u1"), vec!["p1"]);
    assert!(backend.poi_ids("u0").is_empty());
    assert_eq!(phone.poi_ids(), vec!["p1", "p7"]);
}

#[tokio::test(start_paused = true)]
async fn scheduler_runs_engine_on_demand() {
    let backend = backend();
    let device = TestDevice::new(&backend, "u1");
    device.favorite("p1");
    let engine: Arc<dyn SyncJob> = Arc::new(device.engine);

    let network = Arc::new(StaticNetwork::new(NetworkType::Unmetered));
    let scheduler = SyncScheduler::new(engine, network, tokio::runtime::Handle::current());
    let mut status = scheduler.subscribe();

    assert!(scheduler.sync_now());
    let done = status
        .wait_for(|s| matches!(s, SyncStatus::Succeeded { .. } | SyncStatus::Failed { .. }))
        .await
        .unwrap()
        .clone();

    match done {
        SyncStatus::Succeeded { result, .. } => assert_eq!(result.pushed, 1),
        other => panic!("unexpected status: {other:?}"),
    }
    assert_eq!(backend.poi_ids("u1"), vec!["p1"]);
}
