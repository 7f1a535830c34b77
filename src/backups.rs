//! Backup model and snapshot pair resolution.
//!
//! A backup is an immutable point-in-time capture of a directory tree. The
//! enumerator supplying the ordered list is a platform concern (see
//! `platform`); everything here is pure bookkeeping over that list.

use std::path::PathBuf;

use thiserror::Error;

/// One known backup: where its tree is rooted and when it was captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    pub root: PathBuf,
    /// Capture time, unix seconds. Backups are totally ordered by this.
    pub timestamp: i64,
}

impl Backup {
    /// Stable identity for cache keying: two backups with the same root and
    /// capture time are assumed byte-identical in content.
    pub fn identity(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.root.to_string_lossy().as_bytes());
        hasher.update(b"\n");
        hasher.update(self.timestamp.to_string().as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// Source of the ordered backup list (oldest to newest).
///
/// Discovery is platform integration, not engine logic, so it sits behind a
/// trait the binary wires up and tests can fake.
pub trait Enumerator {
    fn backups(&self) -> Result<Vec<Backup>, EnumerateError>;
}

#[derive(Debug, Error)]
pub enum EnumerateError {
    #[error("failed to list backups: {0}")]
    Io(#[from] std::io::Error),

    #[error("backup listing command failed: {0}")]
    Command(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("backup index {idx} out of range, valid range is -{count}..{count} (negative counts from the newest)")]
    OutOfRange { idx: i64, count: usize },

    #[error("backup index {idx} selects the oldest backup, which has no predecessor to diff against")]
    NoPredecessor { idx: i64 },
}

/// Resolve an operator-supplied index into a (current, predecessor) pair.
///
/// Negative indices count from the newest backup (-1 is the newest), so for
/// `k` backups the valid range is `-k..k-1`. Normalization happens here once;
/// no other component sees negative indices.
pub fn resolve_pair(backups: &[Backup], idx: i64) -> Result<(&Backup, &Backup), ResolveError> {
    let count = backups.len();
    let resolved = if idx < 0 { idx + count as i64 } else { idx };

    if resolved < 0 || resolved >= count as i64 {
        return Err(ResolveError::OutOfRange { idx, count });
    }
    if resolved == 0 {
        return Err(ResolveError::NoPredecessor { idx });
    }

    let current = &backups[resolved as usize];
    let predecessor = &backups[resolved as usize - 1];
    Ok((current, predecessor))
}
