//! The favorites sync engine.
//!
//! One invocation of [`SyncEngine::sync`] runs a pull phase and then a push
//! phase:
//!
//! 1. **Pull** changes since the stored cursor and merge them into the local
//!    store, then advance the cursor
//! 2. **Push** the complete local snapshot
//!
//! The phases are independent failure domains: push is attempted even when
//! pull failed, and a failed push does not undo a successful pull.

use crate::config::{CursorFallback, EngineConfig};
use crate::error::{SyncError, SyncOutcome};
use crate::identity::{Clock, IdentityProvider, SystemClock};
use crate::transport::RemoteSyncClient;
use chrono::{DateTime, Utc};
use favsync_model::{format_timestamp, parse_timestamp, PushRequest};
use favsync_store::{CursorStore, LocalFavoritesStore};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The current state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Engine has not run yet.
    Idle,
    /// Engine is pulling changes from the server.
    Pulling,
    /// Engine is pushing the local snapshot.
    Pushing,
    /// Last invocation succeeded, fully or partially.
    Synced,
    /// Last invocation failed in both phases.
    Error,
}

impl SyncState {
    /// Returns true while a phase is running.
    pub fn is_active(&self) -> bool {
        matches!(self, SyncState::Pulling | SyncState::Pushing)
    }
}

/// Effects of one pull phase on the local store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullSummary {
    /// Records inserted that were not present before.
    pub added: usize,
    /// Records replaced.
    pub updated: usize,
    /// Removal instructions applied, including no-op ones.
    pub removed: usize,
    /// The cursor value stored after the pull, if any.
    pub server_timestamp: Option<String>,
}

/// Outcome of one push phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushSummary {
    /// Records in the uploaded snapshot.
    pub pushed: usize,
}

/// Summary of one sync invocation.
///
/// Counts describe the pull phase only; push uploads a snapshot, not a diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResult {
    /// Cursor resolved by the pull phase, `None` if pull failed.
    pub server_timestamp: Option<String>,
    /// Favorites added by pull.
    pub favorites_added: usize,
    /// Favorites updated by pull.
    pub favorites_updated: usize,
    /// Favorites removed by pull.
    pub favorites_removed: usize,
    /// Records uploaded by push, `0` if push failed.
    pub pushed: usize,
    /// True when one of the two phases failed.
    pub partial: bool,
    /// Human-readable summary.
    pub message: String,
}

/// Statistics about sync invocations.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Invocations that returned success (including partial).
    pub cycles_completed: u64,
    /// Invocations that failed in both phases.
    pub cycles_failed: u64,
    /// Total pull-phase changes applied.
    pub changes_pulled: u64,
    /// Total records uploaded.
    pub records_pushed: u64,
    /// Time of the last successful invocation.
    pub last_success: Option<DateTime<Utc>>,
    /// Last error message (either phase).
    pub last_error: Option<String>,
}

/// A unit of sync work the scheduler can run.
pub trait SyncJob: Send + Sync + 'static {
    /// Runs one sync invocation for the signed-in user.
    fn run(&self) -> SyncOutcome<SyncResult>;
}

/// The sync engine reconciles a local favorites store with a remote.
///
/// All collaborators are injected; the engine never reaches for global
/// state. It is stateless between invocations apart from the persisted
/// cursor and the informational [`SyncState`] / [`SyncStats`].
pub struct SyncEngine<R, S, C>
where
    R: RemoteSyncClient,
    S: LocalFavoritesStore,
    C: CursorStore,
{
    config: EngineConfig,
    remote: R,
    favorites: S,
    cursor: C,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
    // Serializes invocations so the store keeps a single writer.
    run_lock: Mutex<()>,
}

impl<R, S, C> SyncEngine<R, S, C>
where
    R: RemoteSyncClient,
    S: LocalFavoritesStore,
    C: CursorStore,
{
    /// Creates a new sync engine using the system clock.
    pub fn new(remote: R, favorites: S, cursor: C, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            config: EngineConfig::default(),
            remote,
            favorites,
            cursor,
            identity,
            clock: Arc::new(SystemClock),
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
            run_lock: Mutex::new(()),
        }
    }

    /// Replaces the engine configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns the remote client.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Returns the local favorites store.
    pub fn favorites(&self) -> &S {
        &self.favorites
    }

    /// Returns the cursor store.
    pub fn cursor(&self) -> &C {
        &self.cursor
    }

    fn set_state(&self, state: SyncState) {
        *self.state.write() = state;
    }

    /// Runs [`sync`](Self::sync) for the signed-in user.
    pub fn sync_current_user(&self) -> SyncOutcome<SyncResult> {
        let user_id = self.identity.current_user().ok_or(SyncError::Authentication)?;
        self.sync(&user_id)
    }

    /// Performs a full sync invocation: pull, then push.
    ///
    /// Succeeds if at least one phase succeeds. Fails with
    /// [`SyncError::BothPhasesFailed`] otherwise.
    pub fn sync(&self, user_id: &str) -> SyncOutcome<SyncResult> {
        let _guard = self.run_lock.lock();

        self.set_state(SyncState::Pulling);
        let pulled = self.pull(user_id);
        if let Err(e) = &pulled {
            warn!(user_id, error = %e, "pull phase failed");
        }

        self.set_state(SyncState::Pushing);
        let pushed = self.push(user_id);
        if let Err(e) = &pushed {
            warn!(user_id, error = %e, "push phase failed");
        }

        let outcome = combine(pulled, pushed);
        self.record(&outcome);
        outcome
    }

    /// Downloads changes since the stored cursor and merges them locally.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Authentication`] if nobody is signed in
    /// - any transport error from the remote
    /// - [`SyncError::LocalStorage`] if a store operation fails; records
    ///   merged before the failure stay merged and the cursor is not moved
    pub fn pull(&self, user_id: &str) -> SyncOutcome<PullSummary> {
        if self.identity.current_user().is_none() {
            return Err(SyncError::Authentication);
        }

        let since = self.cursor.get()?;
        let response = self.remote.pull(user_id, since.as_deref())?;
        debug!(
            user_id,
            since = since.as_deref().unwrap_or(""),
            records = response.favorites.len(),
            "merging pulled favorites"
        );

        let mut summary = PullSummary::default();
        for wire in response.favorites {
            if wire.is_favorite {
                let present = self.favorites.contains(&wire.poi_id)?;
                let mut record = wire.into_record();
                if record.user_id.is_empty() {
                    record.user_id = user_id.to_string();
                }
                self.favorites.upsert(record)?;
                if present {
                    summary.updated += 1;
                } else {
                    summary.added += 1;
                }
            } else {
                self.favorites.delete(&wire.poi_id)?;
                summary.removed += 1;
            }
        }

        let server_timestamp = response
            .server_timestamp
            .filter(|ts| !ts.trim().is_empty());
        summary.server_timestamp = self.resolve_cursor(server_timestamp, since.as_deref());
        if let Some(cursor) = &summary.server_timestamp {
            self.cursor.set(cursor)?;
        }

        info!(
            added = summary.added,
            updated = summary.updated,
            removed = summary.removed,
            cursor = summary.server_timestamp.as_deref().unwrap_or(""),
            "pull complete"
        );
        Ok(summary)
    }

    /// Uploads the entire local snapshot in one request.
    ///
    /// Every record owned by `user_id` is sent with `is_favorite = true`
    /// and a fresh timestamp. Records left behind by another account are
    /// kept locally but not sent. Local removals are not transmitted.
    pub fn push(&self, user_id: &str) -> SyncOutcome<PushSummary> {
        let snapshot = self.favorites.list()?;
        let timestamp = format_timestamp(self.clock.now());
        let favorites: Vec<_> = snapshot
            .iter()
            .filter(|record| record.user_id == user_id)
            .map(|record| record.to_wire(timestamp.as_str()))
            .collect();
        if favorites.len() < snapshot.len() {
            debug!(
                user_id,
                skipped = snapshot.len() - favorites.len(),
                "skipping favorites owned by another account"
            );
        }
        let request = PushRequest::new(user_id, favorites);

        self.remote.push(&request)?;

        info!(pushed = request.favorites.len(), "push complete");
        Ok(PushSummary {
            pushed: request.favorites.len(),
        })
    }

    /// Picks the cursor to store after a pull.
    fn resolve_cursor(&self, server: Option<String>, previous: Option<&str>) -> Option<String> {
        match server {
            Some(ts) => {
                if let Some(prev) = previous {
                    if let (Ok(new), Ok(old)) = (parse_timestamp(&ts), parse_timestamp(prev)) {
                        if new < old {
                            warn!(previous = prev, server = %ts, "server timestamp moved backwards");
                        }
                    }
                }
                Some(ts)
            }
            None => match self.config.cursor_fallback {
                CursorFallback::DeviceClock => {
                    let now = format_timestamp(self.clock.now());
                    warn!(cursor = %now, "pull response had no server timestamp; using device clock");
                    Some(now)
                }
                CursorFallback::KeepPrevious => {
                    debug!("pull response had no server timestamp; keeping previous cursor");
                    previous.map(str::to_string)
                }
            },
        }
    }

    fn record(&self, outcome: &SyncOutcome<SyncResult>) {
        let mut stats = self.stats.write();
        match outcome {
            Ok(result) => {
                stats.cycles_completed += 1;
                stats.changes_pulled +=
                    (result.favorites_added + result.favorites_updated + result.favorites_removed)
                        as u64;
                stats.records_pushed += result.pushed as u64;
                stats.last_success = Some(self.clock.now());
                if !result.partial {
                    stats.last_error = None;
                } else {
                    stats.last_error = Some(result.message.clone());
                }
                self.set_state(SyncState::Synced);
            }
            Err(e) => {
                stats.cycles_failed += 1;
                stats.last_error = Some(e.to_string());
                self.set_state(SyncState::Error);
            }
        }
    }
}

impl<R, S, C> SyncJob for SyncEngine<R, S, C>
where
    R: RemoteSyncClient + 'static,
    S: LocalFavoritesStore + 'static,
    C: CursorStore + 'static,
{
    fn run(&self) -> SyncOutcome<SyncResult> {
        self.sync_current_user()
    }
}

/// Combines the two phase outcomes into one invocation outcome.
fn combine(
    pulled: SyncOutcome<PullSummary>,
    pushed: SyncOutcome<PushSummary>,
) -> SyncOutcome<SyncResult> {
    match (pulled, pushed) {
        (Ok(pull), Ok(push)) => Ok(SyncResult {
            message: format!(
                "Sync complete: {} added, {} updated, {} removed; pushed {} favorites",
                pull.added, pull.updated, pull.removed, push.pushed
            ),
            server_timestamp: pull.server_timestamp,
            favorites_added: pull.added,
            favorites_updated: pull.updated,
            favorites_removed: pull.removed,
            pushed: push.pushed,
            partial: false,
        }),
        (Err(pull_err), Ok(push)) => Ok(SyncResult {
            server_timestamp: None,
            favorites_added: 0,
            favorites_updated: 0,
            favorites_removed: 0,
            pushed: push.pushed,
            partial: true,
            message: format!(
                "Partial sync: pushed {} favorites; pull failed: {}",
                push.pushed, pull_err
            ),
        }),
        (Ok(pull), Err(push_err)) => Ok(SyncResult {
            message: format!(
                "Partial sync: {} added, {} updated, {} removed; push failed: {}",
                pull.added, pull.updated, pull.removed, push_err
            ),
            server_timestamp: pull.server_timestamp,
            favorites_added: pull.added,
            favorites_updated: pull.updated,
            favorites_removed: pull.removed,
            pushed: 0,
            partial: true,
        }),
        (Err(pull_err), Err(push_err)) => Err(SyncError::BothPhasesFailed {
            pull: Box::new(pull_err),
            push: Box::new(push_err),
        }),
    }
}
