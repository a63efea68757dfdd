//! Keyed storage for small JSON records.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use dashmap::DashMap;
use tracing::debug;

use super::errors::IdentityResult;

/// Boxed future type for record store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Stores one serialized document per key.
pub trait RecordStore: Send + Sync {
    /// Read the document stored under `key`.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn load<'a>(&'a self, key: &'a str) -> StoreFuture<'a, IdentityResult<Option<String>>>;

    /// Replace the document stored under `key`.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn save<'a>(&'a self, key: &'a str, document: String) -> StoreFuture<'a, IdentityResult<()>>;

    /// Remove the document stored under `key`; missing keys are not an error.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, IdentityResult<()>>;
}

/// One `{key}.json` file per key inside a directory.
#[derive(Clone, Debug)]
pub struct FileRecordStore {
    dir: PathBuf,
}

impl FileRecordStore {
    /// Store records under `dir`; the directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the records.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl RecordStore for FileRecordStore {
    fn load<'a>(&'a self, key: &'a str) -> StoreFuture<'a, IdentityResult<Option<String>>> {
        Box::pin(async move {
            match tokio::fs::read_to_string(self.path(key)).await {
                Ok(document) => Ok(Some(document)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn save<'a>(&'a self, key: &'a str, document: String) -> StoreFuture<'a, IdentityResult<()>> {
        Box::pin(async move {
            tokio::fs::create_dir_all(&self.dir).await?;
            let path = self.path(key);
            tokio::fs::write(&path, document).await?;
            debug!(path = %path.display(), "Record saved");
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, IdentityResult<()>> {
        Box::pin(async move {
            match tokio::fs::remove_file(self.path(key)).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }
}

/// Volatile store for tests and diskless runs.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: DashMap<String, String>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryRecordStore {
    fn load<'a>(&'a self, key: &'a str) -> StoreFuture<'a, IdentityResult<Option<String>>> {
        Box::pin(async move { Ok(self.records.get(key).map(|r| r.value().clone())) })
    }

    fn save<'a>(&'a self, key: &'a str, document: String) -> StoreFuture<'a, IdentityResult<()>> {
        Box::pin(async move {
            self.records.insert(key.to_string(), document);
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, IdentityResult<()>> {
        Box::pin(async move {
            self.records.remove(key);
            Ok(())
        })
    }
}
