//! Per-snapshot size catalogs.
//!
//! A catalog maps every directory in one snapshot (by relative path, root is
//! `"."`) to the aggregate size in bytes of all regular files anywhere in its
//! subtree. Catalogs are built once per snapshot and never change afterwards,
//! which is what makes caching them safe.

pub mod builder;
pub mod cache;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Relative directory path -> aggregate subtree size in bytes.
///
/// Keys are UTF-8 strings so catalogs serialize as plain JSON maps; directory
/// names that are not valid UTF-8 are keyed lossily (invalid bytes become
/// U+FFFD), so sibling directories differing only in invalid bytes share one
/// entry. Their sizes merge into it and totals stay correct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub sizes: BTreeMap<String, u64>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog { sizes: BTreeMap::new() }
    }

    pub fn get(&self, path: &str) -> Option<u64> {
        self.sizes.get(path).copied()
    }

    /// Full-tree total: the aggregate size recorded at the root entry.
    pub fn total_bytes(&self) -> u64 {
        self.get(ROOT_KEY).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

/// Catalog key for the snapshot root itself.
pub const ROOT_KEY: &str = ".";

/// A subtree that could not be read during a walk. The walk continues past
/// these; callers decide how to surface them.
#[derive(Debug, Clone)]
pub struct SkippedPath {
    pub path: PathBuf,
    pub reason: String,
}

/// Best-effort build result: the catalog covering everything readable, plus
/// the subtrees that were not.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub catalog: Catalog,
    pub skipped: Vec<SkippedPath>,
}

impl BuildReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}
