//! Sync cursor persistence.

use crate::error::StoreResult;
use crate::file::{lock_exclusive, write_atomic};
use parking_lot::RwLock;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Durable storage for the last-synchronized server timestamp.
///
/// A single scalar, last write wins, no history. `None` means the
/// installation has never completed a pull.
pub trait CursorStore: Send + Sync {
    /// Reads the cursor.
    fn get(&self) -> StoreResult<Option<String>>;

    /// Replaces the cursor.
    fn set(&self, value: &str) -> StoreResult<()>;

    /// Forgets the cursor so the next pull starts from scratch.
    fn clear(&self) -> StoreResult<()>;
}

impl<T: CursorStore + ?Sized> CursorStore for Arc<T> {
    fn get(&self) -> StoreResult<Option<String>> {
        (**self).get()
    }

    fn set(&self, value: &str) -> StoreResult<()> {
        (**self).set(value)
    }

    fn clear(&self) -> StoreResult<()> {
        (**self).clear()
    }
}

/// An in-memory cursor store.
#[derive(Debug, Default)]
pub struct InMemoryCursorStore {
    value: RwLock<Option<String>>,
}

impl InMemoryCursorStore {
    /// Creates a store with no cursor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `value`.
    #[must_use]
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: RwLock::new(Some(value.into())),
        }
    }
}

impl CursorStore for InMemoryCursorStore {
    fn get(&self) -> StoreResult<Option<String>> {
        Ok(self.value.read().clone())
    }

    fn set(&self, value: &str) -> StoreResult<()> {
        *self.value.write() = Some(value.to_string());
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        *self.value.write() = None;
        Ok(())
    }
}

/// A cursor stored as the sole contents of a text file.
///
/// A missing or blank file reads as `None`. Writes go through a temporary
/// file and a rename, so a crash leaves either the old or the new value.
#[derive(Debug)]
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    /// Creates a cursor store backed by `path`. The file need not exist.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CursorStore for FileCursorStore {
    fn get(&self) -> StoreResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let value = contents.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, value: &str) -> StoreResult<()> {
        let _lock = lock_exclusive(&self.path)?;
        write_atomic(&self.path, value.as_bytes())
    }

    fn clear(&self) -> StoreResult<()> {
        let _lock = lock_exclusive(&self.path)?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
