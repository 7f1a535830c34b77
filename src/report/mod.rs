//! Report pipeline: ordering and truncation of delta records.

pub mod json;
pub mod table;

use clap::ValueEnum;

use crate::diff::DeltaRecord;

/// Sort key for the rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum OrderKey {
    /// Lexicographic ascending on relative path.
    Path,
    /// Descending by absolute size difference, largest change first.
    Size,
}

/// Order the records by `order_key` and truncate to `limit`.
///
/// A non-positive or absent limit means no truncation. SIZE ordering breaks
/// ties by path ascending so repeated runs render identically. Pure function;
/// re-rendering the same inputs reproduces the same sequence.
pub fn render(
    mut records: Vec<DeltaRecord>,
    order_key: OrderKey,
    limit: Option<i64>,
) -> Vec<DeltaRecord> {
    match order_key {
        OrderKey::Path => records.sort_by(|a, b| a.path.cmp(&b.path)),
        OrderKey::Size => records.sort_by(|a, b| {
            b.delta
                .unsigned_abs()
                .cmp(&a.delta.unsigned_abs())
                .then_with(|| a.path.cmp(&b.path))
        }),
    }

    if let Some(limit) = limit {
        if limit > 0 {
            records.truncate(limit as usize);
        }
    }

    records
}
