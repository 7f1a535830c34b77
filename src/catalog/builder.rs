//! Catalog builder: walks one snapshot root and aggregates directory sizes.
//!
//! The walk is read-only and never follows symlinks, so hard-link cycles and
//! cross-tree links cannot loop it. Each hard link is counted at its own
//! logical path; aggregate sizes answer "how big would this subtree be if
//! extracted standalone", not physical disk usage.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use jwalk::WalkDir;
use thiserror::Error;

use super::{BuildReport, Catalog, SkippedPath, ROOT_KEY};

#[derive(Debug, Error)]
pub enum BuildError {
    /// The cancel flag was raised mid-walk. Nothing built so far may be
    /// persisted; the caller gets no catalog at all.
    #[error("catalog build canceled")]
    Canceled,
}

/// Seam between the cache and the filesystem walk, so tests can substitute an
/// instrumented builder and count invocations.
pub trait Builder {
    fn build(&self, root: &Path, cancel: &AtomicBool) -> Result<BuildReport, BuildError>;
}

/// The real builder: a parallel jwalk traversal of the snapshot tree.
pub struct WalkBuilder;

impl Builder for WalkBuilder {
    fn build(&self, root: &Path, cancel: &AtomicBool) -> Result<BuildReport, BuildError> {
        build_catalog(root, cancel)
    }
}

/// Walk `root` and produce a catalog of aggregate directory sizes.
///
/// Unreadable subtrees do not abort the walk; they are recorded and the
/// catalog covers everything that was readable. The root entry is always
/// present, even for an empty or entirely unreadable tree.
pub fn build_catalog(root: &Path, cancel: &AtomicBool) -> Result<BuildReport, BuildError> {
    let mut catalog = Catalog::new();
    catalog.sizes.insert(ROOT_KEY.to_string(), 0);
    let mut skipped = Vec::new();

    // jwalk parallelizes directory reads across its rayon pool; this loop
    // only merges results, so the catalog needs no synchronization.
    let walker = WalkDir::new(root).follow_links(false).skip_hidden(false);

    for entry_result in walker {
        if cancel.load(Ordering::Relaxed) {
            return Err(BuildError::Canceled);
        }

        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                skipped.push(SkippedPath { path, reason: err.to_string() });
                continue;
            }
        };

        let file_type = entry.file_type();
        let path = entry.path();

        if file_type.is_dir() {
            // or_insert: a file deeper in the tree may already have created
            // this key via ancestor accumulation.
            catalog
                .sizes
                .entry(relative_key(root, &path))
                .or_insert(0);
        } else if file_type.is_file() {
            let len = match entry.metadata() {
                Ok(m) => m.len(),
                Err(err) => {
                    skipped.push(SkippedPath { path, reason: err.to_string() });
                    continue;
                }
            };
            add_to_ancestors(&mut catalog, root, &path, len);
        }
        // symlinks and special files contribute no size and are not traversed
    }

    Ok(BuildReport { catalog, skipped })
}

/// Catalog key for `path` relative to `root`; the root itself maps to ".".
/// Non-UTF-8 names are keyed lossily, see `Catalog`.
fn relative_key(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    if rel.as_os_str().is_empty() {
        ROOT_KEY.to_string()
    } else {
        rel.to_string_lossy().to_string()
    }
}

/// Credit a file's size to every directory on its path up to the root.
fn add_to_ancestors(catalog: &mut Catalog, root: &Path, file: &Path, len: u64) {
    let rel: &Path = file.strip_prefix(root).unwrap_or(file);
    let mut dir = rel.parent();

    loop {
        let at_root = dir.map(|d| d.as_os_str().is_empty()).unwrap_or(true);
        let key = if at_root {
            ROOT_KEY.to_string()
        } else {
            dir.unwrap().to_string_lossy().to_string()
        };

        let slot = catalog.sizes.entry(key).or_insert(0);
        *slot = slot.saturating_add(len);

        if at_root {
            break;
        }
        dir = dir.unwrap().parent();
    }
}

/// Convenience for callers that do not cancel.
pub fn never_cancel() -> AtomicBool {
    AtomicBool::new(false)
}
