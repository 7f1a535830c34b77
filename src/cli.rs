use clap::Parser;
use std::path::PathBuf;

use crate::report::OrderKey;

#[derive(Parser)]
#[command(name = "snapdiff")]
#[command(about = "Analyse aggregate directory size differences between consecutive backups")]
#[command(version)]
pub struct Cli {
    /// Diff the backup at IDX with its predecessor; negative indices count
    /// from the newest (-1 is the last backup). Absent lists available
    /// backups without diffing.
    #[arg(long, value_name = "IDX", allow_negative_numbers = true)]
    pub backup_idx: Option<i64>,

    /// Order output of changes by the selected criteria
    #[arg(long, value_enum, default_value = "PATH")]
    pub order: OrderKey,

    /// Only output up to the given number of changes (non-positive: no limit)
    #[arg(long, value_name = "N")]
    pub limit: Option<i64>,

    /// Directory for cached per-backup catalogs
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Treat each subdirectory of this root as one backup instead of asking
    /// tmutil (ordered by modification time)
    #[arg(long, value_name = "PATH")]
    pub backups_root: Option<PathBuf>,

    /// Output the report as JSON instead of a table
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Show detailed diagnostics (cache hits, skipped paths)
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,
}
