use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use snapdiff::backups::{resolve_pair, Backup, Enumerator};
use snapdiff::catalog::builder::{build_catalog, WalkBuilder};
use snapdiff::catalog::cache::{CacheManager, FsStore};
use snapdiff::diff::{diff, net_change, ChangeKind};
use snapdiff::platform::DirEnumerator;
use snapdiff::report::{render, OrderKey};

fn write_file(path: &Path, len: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![0u8; len]).unwrap();
}

fn no_cancel() -> AtomicBool {
    AtomicBool::new(false)
}

/// Two snapshot trees, a diff, and a rendered report, end to end.
#[test]
fn diff_between_two_snapshot_trees() {
    let backups = tempfile::tempdir().unwrap();
    let older_root = backups.path().join("2024-05-01-090000");
    let newer_root = backups.path().join("2024-05-02-090000");

    // older: a/ 100 (b/ 40 inside), c/ 10
    write_file(&older_root.join("a/top.bin"), 60);
    write_file(&older_root.join("a/b/inner.bin"), 40);
    write_file(&older_root.join("c/file.bin"), 10);

    // newer: a/ grew to 150, b unchanged, c gone, d appeared with 5
    write_file(&newer_root.join("a/top.bin"), 110);
    write_file(&newer_root.join("a/b/inner.bin"), 40);
    write_file(&newer_root.join("d/file.bin"), 5);

    let older = build_catalog(&older_root, &no_cancel()).unwrap().catalog;
    let newer = build_catalog(&newer_root, &no_cancel()).unwrap().catalog;

    assert_eq!(older.total_bytes(), 110);
    assert_eq!(newer.total_bytes(), 155);

    let records = diff(&newer, &older);

    let a = records.iter().find(|r| r.path == "a").unwrap();
    assert_eq!((a.kind, a.old_size, a.new_size, a.delta), (ChangeKind::Changed, 100, 150, 50));

    let c = records.iter().find(|r| r.path == "c").unwrap();
    assert_eq!((c.kind, c.delta), (ChangeKind::Removed, -10));

    let d = records.iter().find(|r| r.path == "d").unwrap();
    assert_eq!((d.kind, d.delta), (ChangeKind::Added, 5));

    assert!(records.iter().all(|r| r.path != "a/b"));

    // root record summarizes total growth
    let root = records.iter().find(|r| r.path == ".").unwrap();
    assert_eq!(root.delta, 45);

    // SIZE order, limit 2: a (+50) first, then the root record (+45);
    // c (-10) and d (+5) fall past the limit
    let rendered = render(records.clone(), OrderKey::Size, Some(2));
    assert_eq!(rendered.len(), 2);
    assert_eq!(rendered[0].path, "a");
    assert_eq!(rendered[1].path, ".");

    assert_eq!(net_change(&records), 90);
}

/// The cache makes the second analysis of the same backup walk-free.
#[test]
fn cached_catalog_round_trips_through_the_filesystem_store() {
    let tree = tempfile::tempdir().unwrap();
    write_file(&tree.path().join("a/file.bin"), 128);

    let cache_dir = tempfile::tempdir().unwrap();
    let store = FsStore::open(cache_dir.path()).unwrap();
    let builder = WalkBuilder;
    let manager = CacheManager::new(&store, &builder);

    let backup = Backup { root: tree.path().to_path_buf(), timestamp: 1_700_000_000 };

    let first = manager.get_or_build(&backup, &no_cancel()).unwrap();
    assert!(!first.from_cache);
    assert!(first.save_error.is_none());

    // mutate the tree after the build: the cache must keep serving the
    // catalog as built (backups are immutable; this stands in for "no
    // re-walk happens")
    write_file(&tree.path().join("a/extra.bin"), 4096);

    let second = manager.get_or_build(&backup, &no_cancel()).unwrap();
    assert!(second.from_cache);
    assert_eq!(first.catalog, second.catalog);
    assert_eq!(second.catalog.get("a"), Some(128));
}

/// Enumerate a backups root, resolve -1, and diff the resulting pair.
#[test]
fn enumerate_resolve_and_diff_newest_pair() {
    let backups_root = tempfile::tempdir().unwrap();
    let old = backups_root.path().join("2024-05-01-090000");
    let new = backups_root.path().join("2024-05-02-090000");
    write_file(&old.join("docs/report.txt"), 10);
    write_file(&new.join("docs/report.txt"), 25);

    let backups = DirEnumerator::new(backups_root.path().to_path_buf())
        .backups()
        .unwrap();
    assert_eq!(backups.len(), 2);

    let (current, predecessor) = resolve_pair(&backups, -1).unwrap();
    assert_eq!(current.root, new);
    assert_eq!(predecessor.root, old);

    let newer = build_catalog(&current.root, &no_cancel()).unwrap().catalog;
    let older = build_catalog(&predecessor.root, &no_cancel()).unwrap().catalog;

    let records = diff(&newer, &older);
    let docs = records.iter().find(|r| r.path == "docs").unwrap();
    assert_eq!(docs.delta, 15);
}
