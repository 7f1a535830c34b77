//! Persistent catalog cache.
//!
//! Backups are immutable once captured, so a catalog built for a given
//! snapshot identity never goes stale. One JSON file per identity under the
//! cache root; writes go to a temp file and rename into place so a concurrent
//! reader never sees a half-written entry. Corrupt entries are misses, never
//! errors, and concurrent rebuilds of the same identity just overwrite each
//! other with identical content.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::builder::{BuildError, Builder};
use super::{Catalog, SkippedPath};
use crate::backups::Backup;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache directory unusable: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache entry serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persisted form of one cache entry: the catalog plus the identity it was
/// built from, so a reader can verify the key matches before trusting the
/// payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry {
    pub identity: String,
    pub root: PathBuf,
    pub timestamp: i64,
    pub catalog: Catalog,
}

/// Store abstraction over the persisted cache, injectable so tests can use an
/// in-memory fake and the binary can degrade to no caching.
pub trait CatalogStore {
    /// A structurally valid catalog for this identity, or `None`. Missing,
    /// unreadable, corrupt, and mismatched entries are all plain misses.
    fn load(&self, identity: &str) -> Option<Catalog>;

    fn save(&self, entry: &CacheEntry) -> Result<(), CacheError>;
}

/// Filesystem store: `catalog-<identity>.json` files under one directory.
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    pub fn open(dir: &Path) -> Result<Self, CacheError> {
        fs::create_dir_all(dir)?;
        Ok(FsStore { dir: dir.to_path_buf() })
    }

    fn entry_path(&self, identity: &str) -> PathBuf {
        self.dir.join(format!("catalog-{identity}.json"))
    }
}

impl CatalogStore for FsStore {
    fn load(&self, identity: &str) -> Option<Catalog> {
        let bytes = fs::read(self.entry_path(identity)).ok()?;
        let entry: CacheEntry = serde_json::from_slice(&bytes).ok()?;
        if entry.identity != identity {
            return None;
        }
        Some(entry.catalog)
    }

    fn save(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        use std::io::Write;

        let final_path = self.entry_path(&entry.identity);
        let bytes = serde_json::to_vec(entry)?;

        // each writer gets its own temp file in the cache dir, then renames
        // into place: a concurrent reader sees the old entry or the new one,
        // never a half-written file, and identical content from concurrent
        // runs makes last-writer-wins safe without locking
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&final_path).map_err(|e| CacheError::Io(e.error))?;
        Ok(())
    }
}

/// Store that never hits and never persists, used when the cache directory is
/// unwritable: the analysis still runs, just without caching.
pub struct NullStore;

impl CatalogStore for NullStore {
    fn load(&self, _identity: &str) -> Option<Catalog> {
        None
    }

    fn save(&self, _entry: &CacheEntry) -> Result<(), CacheError> {
        Ok(())
    }
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<std::collections::HashMap<String, Catalog>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for MemoryStore {
    fn load(&self, identity: &str) -> Option<Catalog> {
        self.entries.lock().unwrap().get(identity).cloned()
    }

    fn save(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap()
            .insert(entry.identity.clone(), entry.catalog.clone());
        Ok(())
    }
}

/// Result of a cache-aware catalog fetch.
pub struct Fetched {
    pub catalog: Catalog,
    /// Subtrees skipped during a fresh build; empty on cache hits.
    pub skipped: Vec<SkippedPath>,
    pub from_cache: bool,
    /// A failed persist is a warning, not a failure of the analysis.
    pub save_error: Option<CacheError>,
}

/// Ties a store and a builder together behind `get_or_build`.
pub struct CacheManager<'a> {
    store: &'a dyn CatalogStore,
    builder: &'a dyn Builder,
}

impl<'a> CacheManager<'a> {
    pub fn new(store: &'a dyn CatalogStore, builder: &'a dyn Builder) -> Self {
        CacheManager { store, builder }
    }

    /// Return the cached catalog for this backup, or build and persist one.
    ///
    /// Partial builds (unreadable subtrees) are returned to the caller but
    /// never persisted, so a later run with the tree fully readable still
    /// gets the complete answer. A canceled build persists nothing and
    /// returns the error.
    pub fn get_or_build(
        &self,
        backup: &Backup,
        cancel: &AtomicBool,
    ) -> Result<Fetched, BuildError> {
        let identity = backup.identity();

        if let Some(catalog) = self.store.load(&identity) {
            return Ok(Fetched {
                catalog,
                skipped: Vec::new(),
                from_cache: true,
                save_error: None,
            });
        }

        let report = self.builder.build(&backup.root, cancel)?;

        let save_error = if report.is_complete() {
            let entry = CacheEntry {
                identity,
                root: backup.root.clone(),
                timestamp: backup.timestamp,
                catalog: report.catalog.clone(),
            };
            self.store.save(&entry).err()
        } else {
            None
        };

        Ok(Fetched {
            catalog: report.catalog,
            skipped: report.skipped,
            from_cache: false,
            save_error,
        })
    }
}
