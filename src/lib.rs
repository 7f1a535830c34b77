pub mod backups;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod diff;
pub mod platform;
pub mod report;
pub mod util;
