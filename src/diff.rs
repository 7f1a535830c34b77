//! Catalog comparison engine.
//!
//! Compares two per-snapshot size catalogs and reports every directory whose
//! aggregate size differs. Absence counts as zero, equal sizes produce no
//! record, and the root entry participates like any other path (its record
//! summarizes total tree growth).

use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::Catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeKind {
    /// Present only in the newer catalog.
    Added,
    /// Present only in the older catalog.
    Removed,
    /// Present in both with differing size.
    Changed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "ADDED",
            ChangeKind::Removed => "REMOVED",
            ChangeKind::Changed => "CHANGED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeltaRecord {
    pub path: String,
    pub old_size: u64,
    pub new_size: u64,
    /// newer minus older, saturating at the i64 range.
    pub delta: i64,
    pub kind: ChangeKind,
}

/// Diff two catalogs: one pass over the union of their paths.
///
/// No ordering is imposed here beyond the incidental key order; sorting and
/// truncation belong to the report pipeline.
pub fn diff(newer: &Catalog, older: &Catalog) -> Vec<DeltaRecord> {
    let paths: BTreeSet<&String> = newer.sizes.keys().chain(older.sizes.keys()).collect();

    let mut records = Vec::new();
    for path in paths {
        let old_size = older.get(path).unwrap_or(0);
        let new_size = newer.get(path).unwrap_or(0);
        if old_size == new_size {
            continue;
        }

        let kind = match (older.sizes.contains_key(path), newer.sizes.contains_key(path)) {
            (false, true) => ChangeKind::Added,
            (true, false) => ChangeKind::Removed,
            _ => ChangeKind::Changed,
        };

        let new_signed = i64::try_from(new_size).unwrap_or(i64::MAX);
        let old_signed = i64::try_from(old_size).unwrap_or(i64::MAX);

        records.push(DeltaRecord {
            path: path.clone(),
            old_size,
            new_size,
            delta: new_signed.saturating_sub(old_signed),
            kind,
        });
    }

    records
}

/// Net size change across the whole record set (sum of all deltas).
pub fn net_change(records: &[DeltaRecord]) -> i64 {
    records.iter().fold(0i64, |acc, r| acc.saturating_add(r.delta))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(pairs: &[(&str, u64)]) -> Catalog {
        let mut c = Catalog::new();
        for (path, size) in pairs {
            c.sizes.insert((*path).to_string(), *size);
        }
        c
    }

    fn find<'a>(records: &'a [DeltaRecord], path: &str) -> &'a DeltaRecord {
        records
            .iter()
            .find(|r| r.path == path)
            .unwrap_or_else(|| panic!("no record for {path}"))
    }

    #[test]
    fn added_path_detected() {
        let records = diff(&catalog(&[("d", 5)]), &catalog(&[]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::Added);
        assert_eq!(records[0].old_size, 0);
        assert_eq!(records[0].new_size, 5);
        assert_eq!(records[0].delta, 5);
    }

    #[test]
    fn removed_path_detected() {
        let records = diff(&catalog(&[]), &catalog(&[("c", 10)]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::Removed);
        assert_eq!(records[0].old_size, 10);
        assert_eq!(records[0].new_size, 0);
        assert_eq!(records[0].delta, -10);
    }

    #[test]
    fn changed_path_detected() {
        let records = diff(&catalog(&[("a", 150)]), &catalog(&[("a", 100)]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ChangeKind::Changed);
        assert_eq!(records[0].delta, 50);
    }

    #[test]
    fn unchanged_path_produces_no_record() {
        let records = diff(&catalog(&[("a/b", 40)]), &catalog(&[("a/b", 40)]));
        assert!(records.is_empty());
    }

    #[test]
    fn same_catalog_diffs_to_nothing() {
        let c = catalog(&[(".", 110), ("a", 100), ("a/b", 40)]);
        assert!(diff(&c, &c).is_empty());
    }

    #[test]
    fn swapping_sides_negates_and_swaps_kinds() {
        let older = catalog(&[("a", 100), ("c", 10)]);
        let newer = catalog(&[("a", 150), ("d", 5)]);

        let forward = diff(&newer, &older);
        let backward = diff(&older, &newer);
        assert_eq!(forward.len(), backward.len());

        for record in &forward {
            let mirror = find(&backward, &record.path);
            assert_eq!(mirror.delta, -record.delta);
            let expected_kind = match record.kind {
                ChangeKind::Added => ChangeKind::Removed,
                ChangeKind::Removed => ChangeKind::Added,
                ChangeKind::Changed => ChangeKind::Changed,
            };
            assert_eq!(mirror.kind, expected_kind);
        }
    }

    #[test]
    fn mixed_scenario_produces_expected_records() {
        // older: /a 100, /a/b 40, /c 10 — newer: /a 150, /a/b 40, /d 5
        let older = catalog(&[("a", 100), ("a/b", 40), ("c", 10)]);
        let newer = catalog(&[("a", 150), ("a/b", 40), ("d", 5)]);

        let records = diff(&newer, &older);
        assert_eq!(records.len(), 3);

        let a = find(&records, "a");
        assert_eq!((a.kind, a.old_size, a.new_size, a.delta), (ChangeKind::Changed, 100, 150, 50));

        let c = find(&records, "c");
        assert_eq!((c.kind, c.delta), (ChangeKind::Removed, -10));

        let d = find(&records, "d");
        assert_eq!((d.kind, d.delta), (ChangeKind::Added, 5));

        assert!(records.iter().all(|r| r.path != "a/b"));
        assert_eq!(net_change(&records), 45);
    }

    #[test]
    fn root_entry_is_not_special_cased() {
        let older = catalog(&[(".", 100)]);
        let newer = catalog(&[(".", 160)]);

        let records = diff(&newer, &older);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, ".");
        assert_eq!(records[0].kind, ChangeKind::Changed);
        assert_eq!(records[0].delta, 60);
    }
}
