//! Test fixtures.
//!
//! Provides sample records, temporary data directories and simulated
//! devices wired to a [`FakeBackend`].

use crate::backend::FakeBackend;
use chrono::{TimeZone, Utc};
use favsync_engine::{
    FixedClock, HttpRemote, LoopbackClient, StaticIdentity, SyncEngine, SyncOutcome, SyncResult,
};
use favsync_model::{FavoriteRecord, PointOfInterest};
use favsync_store::{DataDir, InMemoryCursorStore, InMemoryFavoritesStore, LocalFavoritesStore};
use std::sync::Arc;
use tempfile::TempDir;

/// Returns a fully populated favorite.
pub fn sample_record(user_id: &str, poi_id: &str) -> FavoriteRecord {
    FavoriteRecord::new(user_id, poi_id, format!("Place {poi_id}"))
        .with_location(40.4168, -3.7038)
        .with_category("museum")
        .with_rating(4.5)
}

/// Returns a point of interest with two images.
pub fn sample_poi(id: &str) -> PointOfInterest {
    PointOfInterest {
        id: id.to_string(),
        name: format!("Place {id}"),
        description: Some("A place worth visiting".into()),
        category: Some("museum".into()),
        address: Some("Calle Mayor 1".into()),
        lat: Some(40.4168),
        lon: Some(-3.7038),
        rating: Some(4.5),
        images: vec![
            format!("https://img.example.com/{id}/1.jpg"),
            format!("https://img.example.com/{id}/2.jpg"),
        ],
    }
}

/// A data directory that is deleted when dropped.
pub struct TempDataDir {
    /// The data directory.
    pub dir: DataDir,
    _temp: TempDir,
}

impl TempDataDir {
    /// Creates a fresh, empty data directory.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let dir = DataDir::open(temp.path()).expect("Failed to open data dir");
        Self { dir, _temp: temp }
    }
}

impl Default for TempDataDir {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TempDataDir {
    type Target = DataDir;

    fn deref(&self) -> &Self::Target {
        &self.dir
    }
}

/// The engine type used by [`TestDevice`].
pub type DeviceEngine = SyncEngine<
    HttpRemote<LoopbackClient<Arc<FakeBackend>>>,
    InMemoryFavoritesStore,
    InMemoryCursorStore,
>;

/// A simulated device: its own stores and clock, sharing a backend.
pub struct TestDevice {
    /// The device's engine.
    pub engine: DeviceEngine,
    /// The device's identity.
    pub identity: Arc<StaticIdentity>,
    /// The device's clock.
    pub clock: Arc<FixedClock>,
    user_id: String,
}

impl TestDevice {
    /// Creates a signed-in device talking to `backend`.
    pub fn new(backend: &Arc<FakeBackend>, user_id: &str) -> Self {
        let identity = Arc::new(StaticIdentity::signed_in(user_id));
        let start = Utc
            .with_ymd_and_hms(2024, 6, 1, 9, 0, 0)
            .single()
            .expect("valid start time");
        let clock = Arc::new(FixedClock::new(start));
        let remote = HttpRemote::new(
            "https://favsync.test",
            LoopbackClient::new(Arc::clone(backend)),
        );
        let engine = SyncEngine::new(
            remote,
            InMemoryFavoritesStore::new(),
            InMemoryCursorStore::new(),
            identity.clone(),
        )
        .with_clock(clock.clone());
        Self {
            engine,
            identity,
            clock,
            user_id: user_id.to_string(),
        }
    }

    /// Favorites `poi_id` locally.
    pub fn favorite(&self, poi_id: &str) {
        self.engine
            .favorites()
            .upsert(sample_record(&self.user_id, poi_id))
            .expect("Failed to upsert favorite");
    }

    /// Unfavorites `poi_id` locally.
    pub fn unfavorite(&self, poi_id: &str) {
        self.engine
            .favorites()
            .delete(poi_id)
            .expect("Failed to delete favorite");
    }

    /// Returns the sorted poi ids held locally.
    pub fn poi_ids(&self) -> Vec<String> {
        self.engine
            .favorites()
            .list()
            .expect("Failed to list favorites")
            .into_iter()
            .map(|r| r.poi_id)
            .collect()
    }

    /// Runs a full sync for this device's user.
    pub fn sync(&self) -> SyncOutcome<SyncResult> {
        self.engine.sync(&self.user_id)
    }

    /// Simulates losing or regaining connectivity.
    pub fn set_online(&self, online: bool) {
        self.engine.remote().client().set_online(online);
    }
}
