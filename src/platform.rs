//! Backup discovery.
//!
//! Two enumerators: `TmutilEnumerator` asks Time Machine on macOS, and
//! `DirEnumerator` treats each subdirectory of a given root as one backup,
//! which works anywhere and is what the tests use. Making a backup's files
//! actually readable (mounts, Full Disk Access) is the operator's problem;
//! by the time the walk starts that precondition must already hold.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chrono::NaiveDateTime;

use crate::backups::{Backup, EnumerateError, Enumerator};

/// Enumerates Time Machine backups via `tmutil listbackups` and narrows each
/// to the current user's home subtree (`<backup>/Data/Users/<user>`).
pub struct TmutilEnumerator;

impl Enumerator for TmutilEnumerator {
    fn backups(&self) -> Result<Vec<Backup>, EnumerateError> {
        let output = run_with_timeout("tmutil", &["listbackups"])?;
        let user = std::env::var("USER").unwrap_or_default();

        let mut backups = Vec::new();
        for line in output.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let base = PathBuf::from(line);
            let timestamp = parse_backup_timestamp(&base)
                .or_else(|| mtime_unix(&base))
                .unwrap_or(0);
            backups.push(Backup {
                root: base.join("Data").join("Users").join(&user),
                timestamp,
            });
        }

        backups.sort_by_key(|b| b.timestamp);
        Ok(backups)
    }
}

/// Enumerates each immediate subdirectory of `root` as one backup, ordered
/// oldest to newest by modification time.
pub struct DirEnumerator {
    root: PathBuf,
}

impl DirEnumerator {
    pub fn new(root: PathBuf) -> Self {
        DirEnumerator { root }
    }
}

impl Enumerator for DirEnumerator {
    fn backups(&self) -> Result<Vec<Backup>, EnumerateError> {
        let mut backups = Vec::new();

        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let path = entry.path();
            let timestamp = parse_backup_timestamp(&path)
                .or_else(|| mtime_unix(&path))
                .unwrap_or(0);
            backups.push(Backup { root: path, timestamp });
        }

        // mtime ties broken by path so the ordering stays deterministic
        backups.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.root.cmp(&b.root)));
        Ok(backups)
    }
}

/// Time Machine names backup directories `YYYY-MM-DD-HHMMSS[.backup]`; parse
/// the capture time out of the final path component when it matches.
fn parse_backup_timestamp(path: &Path) -> Option<i64> {
    let name = path.file_name()?.to_string_lossy();
    let stem = name.strip_suffix(".backup").unwrap_or(&name);
    NaiveDateTime::parse_from_str(stem, "%Y-%m-%d-%H%M%S")
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

fn mtime_unix(path: &Path) -> Option<i64> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let secs = modified.duration_since(std::time::UNIX_EPOCH).ok()?.as_secs();
    i64::try_from(secs).ok()
}

/// Run a listing command with a hard timeout so a hung tmutil cannot wedge
/// the whole run.
///
/// Stdout is drained on its own thread while we poll for exit: the listing
/// grows with the number of backups, and a child that fills the OS pipe
/// buffer would otherwise block on write and never exit.
fn run_with_timeout(program: &str, args: &[&str]) -> Result<String, EnumerateError> {
    use std::io::Read;
    use std::time::{Duration, Instant};

    let mut child = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let mut stdout = child.stdout.take().ok_or_else(|| {
        EnumerateError::Command(format!("failed to capture {program} stdout"))
    })?;
    let reader = std::thread::spawn(move || {
        let mut output = String::new();
        stdout.read_to_string(&mut output).map(|_| output)
    });

    let timeout = Duration::from_secs(10);
    let start = Instant::now();

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    let mut stderr = String::new();
                    if let Some(mut pipe) = child.stderr.take() {
                        let _ = pipe.read_to_string(&mut stderr);
                    }
                    return Err(EnumerateError::Command(format!(
                        "{program} exited with status {}: {}",
                        status.code().unwrap_or(-1),
                        stderr.trim()
                    )));
                }

                let output = reader.join().map_err(|_| {
                    EnumerateError::Command(format!("{program} output reader panicked"))
                })??;
                return Ok(output);
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    // killing the child closes the pipe and unblocks the
                    // reader thread
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(EnumerateError::Command(format!(
                        "{program} timed out after 10 seconds"
                    )));
                }
                std::thread::sleep(Duration::from_millis(100));
            }
            Err(e) => return Err(EnumerateError::Io(e)),
        }
    }
}
