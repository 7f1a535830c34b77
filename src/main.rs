use clap::Parser;
use snapdiff::backups::{self, Backup, Enumerator};
use snapdiff::catalog::builder::WalkBuilder;
use snapdiff::catalog::cache::{CacheManager, CatalogStore, FsStore, NullStore};
use snapdiff::catalog::Catalog;
use snapdiff::cli::Cli;
use snapdiff::config::Config;
use snapdiff::diff;
use snapdiff::platform::{DirEnumerator, TmutilEnumerator};
use snapdiff::report;
use std::sync::atomic::AtomicBool;

fn main() {
    let cli = Cli::parse();
    let config = Config::from_args(&cli);

    let enumerator: Box<dyn Enumerator> = match &config.backups_root {
        Some(root) => Box::new(DirEnumerator::new(root.clone())),
        None => Box::new(TmutilEnumerator),
    };

    let backups = match enumerator.backups() {
        Ok(backups) => backups,
        Err(e) => {
            eprintln!("Error listing backups: {e}");
            std::process::exit(1);
        }
    };

    if backups.is_empty() {
        eprintln!("No backups found.");
        std::process::exit(1);
    }

    println!("Backups (oldest first):");
    for (i, backup) in backups.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(backup.timestamp, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("{i:>3} {date}  {}", backup.root.display());
    }

    let Some(idx) = config.backup_idx else {
        println!(
            "\nSelect a backup index to diff with its predecessor, \
             e.g. '--backup-idx -1' for the last backup."
        );
        return;
    };

    let (current, predecessor) = match backups::resolve_pair(&backups, idx) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    println!(
        "\nAnalysing differences between\n  {}\nand\n  {}",
        predecessor.root.display(),
        current.root.display()
    );

    // caching is best-effort: an unusable cache directory downgrades to a
    // warning and the analysis runs uncached
    let store: Box<dyn CatalogStore> = match &config.cache_dir {
        Some(dir) => match FsStore::open(dir) {
            Ok(store) => Box::new(store),
            Err(e) => {
                eprintln!("warning: cache disabled ({}): {e}", dir.display());
                Box::new(NullStore)
            }
        },
        None => {
            eprintln!("warning: no cache directory available, caching disabled");
            Box::new(NullStore)
        }
    };

    let builder = WalkBuilder;
    let manager = CacheManager::new(store.as_ref(), &builder);
    let cancel = AtomicBool::new(false);

    let older = fetch_catalog(&manager, predecessor, &cancel, config.verbose);
    let newer = fetch_catalog(&manager, current, &cancel, config.verbose);

    let records = diff::diff(&newer, &older);
    let total = diff::net_change(&records);
    let rendered = report::render(records, config.order, config.limit);

    if config.json_output {
        println!("{}", report::json::render(&rendered, total));
    } else {
        print!("{}", report::table::render(&rendered, total, config.limit));
    }
}

fn fetch_catalog(
    manager: &CacheManager<'_>,
    backup: &Backup,
    cancel: &AtomicBool,
    verbose: bool,
) -> Catalog {
    match manager.get_or_build(backup, cancel) {
        Ok(fetched) => {
            if verbose {
                let origin = if fetched.from_cache { "cache" } else { "walk" };
                eprintln!(
                    "{}: {} directories via {origin}",
                    backup.root.display(),
                    fetched.catalog.len()
                );
            }
            if let Some(e) = fetched.save_error {
                eprintln!(
                    "warning: failed to cache catalog for {}: {e}",
                    backup.root.display()
                );
            }
            for skipped in &fetched.skipped {
                eprintln!(
                    "warning: unreadable: {} ({})",
                    skipped.path.display(),
                    skipped.reason
                );
            }
            fetched.catalog
        }
        Err(e) => {
            eprintln!("Error building catalog for {}: {e}", backup.root.display());
            std::process::exit(1);
        }
    }
}
