//! # favsync engine
//!
//! Offline-first synchronization of a user's favorites with a backend.
//!
//! This crate provides:
//! - The sync engine (pull, then push)
//! - Cursor management with a configurable fallback
//! - Retry with exponential backoff
//! - A background scheduler with network constraints
//! - Remote client and HTTP transport abstractions
//!
//! ## Architecture
//!
//! The engine implements a **pull-then-push** model:
//! 1. Pull changes since the cursor and merge them into the local store
//! 2. Advance the cursor
//! 3. Push the full local snapshot
//!
//! Pull and push fail independently. An invocation succeeds if either
//! phase succeeds.
//!
//! ## Key Invariants
//!
//! - Pull always happens before push within one invocation
//! - Re-applying the same pull is idempotent
//! - Removals arrive only through pull; push never transmits them
//! - At most one periodic registration exists at any time
//!
//! ## Example
//!
//! ```rust
//! use favsync_engine::{MockRemote, StaticIdentity, SyncEngine};
//! use favsync_model::FavoriteRecord;
//! use favsync_store::{InMemoryCursorStore, InMemoryFavoritesStore, LocalFavoritesStore};
//! use std::sync::Arc;
//!
//! let engine = SyncEngine::new(
//!     MockRemote::new(),
//!     InMemoryFavoritesStore::new(),
//!     InMemoryCursorStore::new(),
//!     Arc::new(StaticIdentity::signed_in("u1")),
//! );
//! engine.favorites().upsert(FavoriteRecord::new("u1", "p1", "Café")).unwrap();
//!
//! let result = engine.sync("u1").unwrap();
//! assert_eq!(result.pushed, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod http;
mod identity;
mod scheduler;
mod transport;

pub use config::{
    CursorFallback, EngineConfig, RetryConfig, SchedulerConfig, MAX_INTERVAL_HOURS,
    MIN_INTERVAL_HOURS,
};
pub use engine::{PullSummary, PushSummary, SyncEngine, SyncJob, SyncResult, SyncState, SyncStats};
pub use error::{SyncError, SyncOutcome};
pub use http::{
    HttpClient, HttpFailure, HttpRemote, HttpResponse, LoopbackClient, LoopbackServer, Method,
    PULL_PATH, PUSH_PATH,
};
pub use identity::{Clock, FixedClock, IdentityProvider, StaticIdentity, SystemClock};
pub use scheduler::{
    NetworkMonitor, NetworkType, StaticNetwork, SyncScheduler, SyncStatus, MANUAL_WORK,
    PERIODIC_WORK,
};
pub use transport::{MockFailure, MockRemote, RemoteSyncClient};
