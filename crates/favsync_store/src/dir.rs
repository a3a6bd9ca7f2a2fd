//! Data directory management.
//!
//! This module handles the file system layout for one favsync installation:
//!
//! ```text
//! <data_dir>/
//! ├─ favorites.json    # Local favorites
//! ├─ cursor            # Last-synchronized server timestamp
//! ├─ config.json       # Client settings (owned by the CLI)
//! ├─ SYNC.lock         # Held for the length of a sync run
//! └─ <file>.lock       # Held while <file> is rewritten
//! ```

use crate::cursor::FileCursorStore;
use crate::error::StoreResult;
use crate::file::{lock_exclusive, FileFavoritesStore};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// File names within the data directory.
const FAVORITES_FILE: &str = "favorites.json";
const CURSOR_FILE: &str = "cursor";
const CONFIG_FILE: &str = "config.json";
const SYNC_FILE: &str = "SYNC";

/// Exclusive hold on a data directory's sync runs.
///
/// Released on drop.
#[derive(Debug)]
pub struct SyncLock {
    _lock_file: File,
}

/// The on-disk home of one installation.
#[derive(Debug, Clone)]
pub struct DataDir {
    path: PathBuf,
}

impl DataDir {
    /// Opens a data directory, creating it if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(path: &Path) -> StoreResult<Self> {
        fs::create_dir_all(path)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Returns the directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the favorites file.
    #[must_use]
    pub fn favorites_path(&self) -> PathBuf {
        self.path.join(FAVORITES_FILE)
    }

    /// Path of the cursor file.
    #[must_use]
    pub fn cursor_path(&self) -> PathBuf {
        self.path.join(CURSOR_FILE)
    }

    /// Path of the client settings file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.path.join(CONFIG_FILE)
    }

    /// Opens the favorites store in this directory.
    pub fn favorites(&self) -> StoreResult<FileFavoritesStore> {
        FileFavoritesStore::open(&self.favorites_path())
    }

    /// Opens the cursor store in this directory.
    #[must_use]
    pub fn cursor(&self) -> FileCursorStore {
        FileCursorStore::new(&self.cursor_path())
    }

    /// Blocks until no other sync run holds this directory, then holds it
    /// until the returned guard is dropped.
    ///
    /// Works across threads and processes.
    pub fn lock_sync(&self) -> StoreResult<SyncLock> {
        Ok(SyncLock {
            _lock_file: lock_exclusive(&self.path.join(SYNC_FILE))?,
        })
    }
}
