// src/backup/retention.rs

//! Backup rotation: keep the newest `max` entries of a backup folder.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::engine::report::Reporter;
use crate::errors::{Result, WatchBackupError};

/// What one trim did to a backup folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrimOutcome {
    /// Entries removed, oldest first.
    pub removed: Vec<PathBuf>,
    /// Entries that should have been removed but could not be.
    pub failed: Vec<PathBuf>,
    /// Entries whose age could not be read. They count toward the cap as
    /// the newest entries and are never removed.
    pub unreadable: Vec<PathBuf>,
    /// Entries left in the folder.
    pub remaining: usize,
}

#[derive(Debug)]
struct BackupEntry {
    path: PathBuf,
    modified: SystemTime,
    is_dir: bool,
}

#[derive(Debug, Default)]
struct Listing {
    /// Oldest last-write time first, ties broken by path.
    dated: Vec<BackupEntry>,
    unreadable: Vec<PathBuf>,
}

/// Immediate files and directories of `folder`.
fn list_backups(folder: &Path, reporter: &Reporter) -> Result<Listing> {
    let mut listing = Listing::default();

    for entry in fs::read_dir(folder).map_err(|e| WatchBackupError::at(folder, e))? {
        let entry = entry.map_err(|e| WatchBackupError::at(folder, e))?;
        let path = entry.path();

        let dated = fs::metadata(&path).and_then(|meta| {
            let modified = meta.modified()?;
            Ok((meta, modified))
        });

        match dated {
            Ok((meta, modified)) if meta.is_file() || meta.is_dir() => {
                listing.dated.push(BackupEntry {
                    path,
                    modified,
                    is_dir: meta.is_dir(),
                });
            }
            Ok(_) => {}
            Err(err) => {
                reporter.warn(format!(
                    "[cleanup] cannot read age of backup entry {}: {err}",
                    path.display()
                ));
                listing.unreadable.push(path);
            }
        }
    }

    listing
        .dated
        .sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
    listing.unreadable.sort();
    Ok(listing)
}

/// Delete the oldest entries of `folder` until at most `max` remain.
///
/// A failed deletion is logged and counted as handled; cleanup moves on to
/// the next oldest entry. Only failing to list the folder is an error.
pub fn trim_backups(folder: &Path, max: usize, reporter: &Reporter) -> Result<TrimOutcome> {
    let max = max.max(1);
    let Listing { dated, unreadable } = list_backups(folder, reporter)?;

    let total = dated.len() + unreadable.len();
    let excess = total.saturating_sub(max);
    debug!(?folder, total, max, excess, "retention check");

    let mut outcome = TrimOutcome {
        remaining: total,
        unreadable,
        ..TrimOutcome::default()
    };

    for entry in dated.into_iter().take(excess) {
        let res = if entry.is_dir {
            fs::remove_dir_all(&entry.path)
        } else {
            fs::remove_file(&entry.path)
        };

        match res {
            Ok(()) => {
                reporter.info(format!("[cleanup] removed old backup: {}", entry.path.display()));
                outcome.remaining -= 1;
                outcome.removed.push(entry.path);
            }
            Err(err) => {
                reporter.warn(format!(
                    "[cleanup] failed to remove old backup {}: {err}",
                    entry.path.display()
                ));
                outcome.failed.push(entry.path);
            }
        }
    }

    Ok(outcome)
}
