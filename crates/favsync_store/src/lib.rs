//! # favsync store
//!
//! Local persistence for favsync: the favorites store and the sync cursor.
//!
//! ## Design Principles
//!
//! - Stores are synchronous and take `&self`; implementations use interior
//!   locking and must be `Send + Sync`
//! - A single writer (the sync engine, or the user acting locally) mutates
//!   a store at a time; readers always see whole records
//! - Removal is physical deletion: there are no tombstones
//!
//! ## Available Stores
//!
//! - [`InMemoryFavoritesStore`] / [`InMemoryCursorStore`] - tests and
//!   ephemeral use
//! - [`FileFavoritesStore`] / [`FileCursorStore`] - durable stores that
//!   survive process restarts, laid out by [`DataDir`]
//!
//! ## Example
//!
//! ```rust
//! use favsync_model::FavoriteRecord;
//! use favsync_store::{InMemoryFavoritesStore, LocalFavoritesStore};
//!
//! let store = InMemoryFavoritesStore::new();
//! store.upsert(FavoriteRecord::new("u1", "p1", "Café")).unwrap();
//! assert!(store.contains("p1").unwrap());
//! assert_eq!(store.count().unwrap(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cursor;
mod dir;
mod error;
mod favorites;
mod file;
mod memory;

pub use cursor::{CursorStore, FileCursorStore, InMemoryCursorStore};
pub use dir::{DataDir, SyncLock};
pub use error::{StoreError, StoreResult};
pub use favorites::LocalFavoritesStore;
pub use file::FileFavoritesStore;
pub use memory::InMemoryFavoritesStore;
