use std::path::PathBuf;

use crate::cli::Cli;
use crate::report::OrderKey;

pub struct Config {
    pub backup_idx: Option<i64>,
    pub order: OrderKey,
    pub limit: Option<i64>,
    /// None when no cache directory could be determined at all; the run then
    /// proceeds without caching.
    pub cache_dir: Option<PathBuf>,
    pub backups_root: Option<PathBuf>,
    pub json_output: bool,
    pub verbose: bool,
}

impl Config {
    pub fn from_args(args: &Cli) -> Self {
        Config {
            backup_idx: args.backup_idx,
            order: args.order,
            limit: args.limit,
            cache_dir: args.cache.clone().or_else(default_cache_dir),
            backups_root: args.backups_root.clone(),
            json_output: args.json,
            verbose: args.verbose,
        }
    }
}

/// Default user-scoped cache root (~/.cache/snapdiff on Linux, platform
/// equivalent elsewhere).
pub fn default_cache_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "snapdiff").map(|dirs| dirs.cache_dir().to_path_buf())
}
