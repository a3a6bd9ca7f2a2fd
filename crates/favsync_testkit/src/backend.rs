//! An in-memory favorites backend.
//!
//! [`FakeBackend`] answers the two sync endpoints through
//! [`LoopbackServer`], so tests can run the real [`HttpRemote`] against it
//! with a [`LoopbackClient`].
//!
//! The backend keeps one change log per user. Each accepted change gets a
//! new server time one second after the previous one, and a pull returns
//! every key whose latest change is newer than `since`. Removals are kept
//! as server-side tombstones so other devices learn about them.
//!
//! [`HttpRemote`]: favsync_engine::HttpRemote
//! [`LoopbackClient`]: favsync_engine::LoopbackClient

use chrono::{DateTime, Duration, TimeZone, Utc};
use favsync_engine::{HttpResponse, LoopbackServer, Method, PULL_PATH, PUSH_PATH};
use favsync_model::{
    format_timestamp, parse_timestamp, FavoriteRecord, PullResponse, PushRequest, WireFavorite,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Latest known state of one key.
#[derive(Debug, Clone)]
struct Entry {
    favorite: WireFavorite,
    changed_at: DateTime<Utc>,
}

#[derive(Debug)]
struct BackendState {
    now: DateTime<Utc>,
    users: HashMap<String, BTreeMap<String, Entry>>,
    failures: VecDeque<u16>,
    omit_server_timestamp: bool,
    pushes: usize,
    pulls: usize,
}

impl BackendState {
    /// Records `favorite` unless the key already holds the same content.
    fn apply(&mut self, mut favorite: WireFavorite) {
        let now = self.now + Duration::seconds(1);
        let entries = self.users.entry(favorite.user_id.clone()).or_default();
        if let Some(existing) = entries.get(&favorite.poi_id) {
            if same_content(&existing.favorite, &favorite) {
                return;
            }
        }
        favorite.timestamp = format_timestamp(now);
        entries.insert(
            favorite.poi_id.clone(),
            Entry {
                favorite,
                changed_at: now,
            },
        );
        self.now = now;
    }
}

fn same_content(a: &WireFavorite, b: &WireFavorite) -> bool {
    let mut a = a.clone();
    a.timestamp.clone_from(&b.timestamp);
    a == *b
}

/// A favorites backend held in memory.
///
/// # Example
///
/// ```rust
/// use favsync_testkit::FakeBackend;
/// use favsync_model::FavoriteRecord;
///
/// let backend = FakeBackend::new();
/// backend.insert_favorite(FavoriteRecord::new("u1", "p1", "Café"));
/// assert_eq!(backend.favorites("u1").len(), 1);
/// ```
#[derive(Debug)]
pub struct FakeBackend {
    state: Mutex<BackendState>,
}

impl FakeBackend {
    /// Creates an empty backend whose clock starts at 2024-01-01T00:00:00Z.
    pub fn new() -> Self {
        let epoch = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid epoch");
        Self {
            state: Mutex::new(BackendState {
                now: epoch,
                users: HashMap::new(),
                failures: VecDeque::new(),
                omit_server_timestamp: false,
                pushes: 0,
                pulls: 0,
            }),
        }
    }

    /// Returns the current server time.
    pub fn now(&self) -> String {
        format_timestamp(self.state.lock().now)
    }

    /// Stores a favorite as if another client had pushed it.
    pub fn insert_favorite(&self, record: FavoriteRecord) {
        let wire = record.to_wire("");
        self.state.lock().apply(wire);
    }

    /// Records a removal as if the user had unfavorited on another channel.
    pub fn remove_favorite(&self, user_id: &str, poi_id: &str) {
        self.state
            .lock()
            .apply(WireFavorite::removal(user_id, poi_id, ""));
    }

    /// Returns the favorites the backend currently holds for `user_id`.
    pub fn favorites(&self, user_id: &str) -> Vec<FavoriteRecord> {
        self.state
            .lock()
            .users
            .get(user_id)
            .map(|entries| {
                entries
                    .values()
                    .filter(|e| e.favorite.is_favorite)
                    .map(|e| e.favorite.clone().into_record())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the sorted poi ids the backend holds for `user_id`.
    pub fn poi_ids(&self, user_id: &str) -> Vec<String> {
        self.favorites(user_id)
            .into_iter()
            .map(|r| r.poi_id)
            .collect()
    }

    /// Makes the next requests fail with the given statuses, in order.
    pub fn fail_next(&self, statuses: impl IntoIterator<Item = u16>) {
        self.state.lock().failures.extend(statuses);
    }

    /// Makes pull responses omit the server timestamp.
    pub fn omit_server_timestamp(&self, omit: bool) {
        self.state.lock().omit_server_timestamp = omit;
    }

    /// Number of push requests accepted.
    pub fn push_count(&self) -> usize {
        self.state.lock().pushes
    }

    /// Number of pull requests answered.
    pub fn pull_count(&self) -> usize {
        self.state.lock().pulls
    }

    fn handle_push(&self, body: &[u8]) -> HttpResponse {
        let request = match PushRequest::decode(body) {
            Ok(request) => request,
            Err(e) => return HttpResponse::new(400, e.to_string()),
        };

        if request.favorites.iter().any(|f| f.user_id != request.user_id) {
            return HttpResponse::new(403, "favorite belongs to another user");
        }

        let mut state = self.state.lock();
        for favorite in request.favorites {
            state.apply(favorite);
        }
        state.pushes += 1;
        HttpResponse::new(200, "")
    }

    fn handle_pull(&self, query: &[(String, String)]) -> HttpResponse {
        let param = |name: &str| {
            query
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };
        let Some(user_id) = param("userId").filter(|u| !u.is_empty()) else {
            return HttpResponse::new(400, "missing userId");
        };
        let since = match param("since").filter(|s| !s.is_empty()) {
            Some(raw) => match parse_timestamp(raw) {
                Ok(ts) => Some(ts),
                Err(e) => return HttpResponse::new(400, e.to_string()),
            },
            None => None,
        };

        let mut state = self.state.lock();
        state.pulls += 1;
        let favorites = state
            .users
            .get(user_id)
            .map(|entries| {
                entries
                    .values()
                    .filter(|e| since.map_or(true, |s| e.changed_at > s))
                    .map(|e| e.favorite.clone())
                    .collect()
            })
            .unwrap_or_default();
        let server_timestamp =
            (!state.omit_server_timestamp).then(|| format_timestamp(state.now));

        match PullResponse::new(server_timestamp, favorites).encode() {
            Ok(body) => HttpResponse::new(200, body),
            Err(e) => HttpResponse::new(500, e.to_string()),
        }
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackServer for FakeBackend {
    fn handle(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: &[u8],
    ) -> HttpResponse {
        let injected = self.state.lock().failures.pop_front();
        if let Some(status) = injected {
            return HttpResponse::new(status, format!("injected failure {status}"));
        }
        match (method, path) {
            (Method::Post, PUSH_PATH) => self.handle_push(body),
            (Method::Get, PULL_PATH) => self.handle_pull(query),
            _ => HttpResponse::new(404, format!("no route for {path}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pull(backend: &FakeBackend, user: &str, since: &str) -> PullResponse {
        let query = vec![
            ("userId".to_string(), user.to_string()),
            ("since".to_string(), since.to_string()),
        ];
        let response = backend.handle(Method::Get, PULL_PATH, &query, &[]);
        assert_eq!(response.status, 200);
        PullResponse::decode(&response.body).unwrap()
    }

    #[test]
    fn pull_returns_changes_after_cursor() {
        let backend = FakeBackend::new();
        backend.insert_favorite(FavoriteRecord::new("u1", "p1", "Café"));
        let cursor = backend.now();
        backend.insert_favorite(FavoriteRecord::new("u1", "p2", "Museo"));
        backend.remove_favorite("u1", "p1");

        let all = pull(&backend, "u1", "");
        assert_eq!(all.favorites.len(), 2);

        let recent = pull(&backend, "u1", &cursor);
        assert_eq!(recent.favorites.len(), 2);
        assert!(recent.favorites.iter().any(|f| f.poi_id == "p1" && !f.is_favorite));
        assert_eq!(recent.server_timestamp, Some(backend.now()));

        let none = pull(&backend, "u1", &backend.now());
        assert!(none.favorites.is_empty());
    }

    #[test]
    fn identical_push_does_not_create_changes() {
        let backend = FakeBackend::new();
        let record = FavoriteRecord::new("u1", "p1", "Café");
        backend.insert_favorite(record.clone());
        let cursor = backend.now();

        let body = PushRequest::new("u1", vec![record.to_wire("2030-01-01T00:00:00Z")])
            .encode()
            .unwrap();
        let response = backend.handle(Method::Post, PUSH_PATH, &[], &body);
        assert!(response.is_success());
        assert_eq!(backend.now(), cursor);
        assert_eq!(backend.push_count(), 1);
    }

    #[test]
    fn users_are_isolated() {
        let backend = FakeBackend::new();
        backend.insert_favorite(FavoriteRecord::new("u1", "p1", "Café"));
        assert!(pull(&backend, "u2", "").favorites.is_empty());
        assert!(backend.favorites("u2").is_empty());
    }

    #[test]
    fn bad_requests_are_rejected() {
        let backend = FakeBackend::new();
        assert_eq!(backend.handle(Method::Get, PULL_PATH, &[], &[]).status, 400);
        assert_eq!(backend.handle(Method::Post, PUSH_PATH, &[], b"").status, 400);
        assert_eq!(backend.handle(Method::Get, "/other", &[], &[]).status, 404);

        let foreign = PushRequest::new(
            "u1",
            vec![FavoriteRecord::new("u2", "p1", "Café").to_wire("t")],
        );
        let response = backend.handle(Method::Post, PUSH_PATH, &[], &foreign.encode().unwrap());
        assert_eq!(response.status, 403);
    }

    #[test]
    fn injected_failures_are_consumed_in_order() {
        let backend = FakeBackend::new();
        backend.fail_next([503, 401]);
        assert_eq!(backend.handle(Method::Get, PULL_PATH, &[], &[]).status, 503);
        assert_eq!(backend.handle(Method::Get, PULL_PATH, &[], &[]).status, 401);
        assert_eq!(backend.handle(Method::Get, PULL_PATH, &[], &[]).status, 400);
    }

    #[test]
    fn server_timestamp_can_be_omitted() {
        let backend = FakeBackend::new();
        backend.omit_server_timestamp(true);
        assert_eq!(pull(&backend, "u1", "").server_timestamp, None);
    }
}
