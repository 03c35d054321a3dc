// src/watch/polling.rs

//! Change detection by periodic stat.
//!
//! - File source: compare the file's last-write time with the previous cycle.
//! - Directory source: compare a full [`FolderSnapshot`] with the previous
//!   cycle; any difference is one change for the whole cycle.
//!
//! The baseline starts empty, so the first cycle of a session reports a
//! change whenever there is something to back up. A failed cycle leaves the
//! baseline untouched; the next readable state is compared against it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::debug;

use crate::engine::report::Reporter;
use crate::errors::{Result, WatchBackupError};
use crate::watch::cancel::CancelToken;
use crate::watch::detector::ChangeDetector;
use crate::watch::snapshot::FolderSnapshot;

#[derive(Debug)]
pub struct PollingDetector {
    source: PathBuf,
    interval: Duration,
    reporter: Reporter,
    snapshot: FolderSnapshot,
    last_write: Option<SystemTime>,
}

impl PollingDetector {
    pub fn new(source: impl AsRef<Path>, interval: Duration, reporter: Reporter) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            interval,
            reporter,
            snapshot: FolderSnapshot::default(),
            last_write: None,
        }
    }

    /// Snapshot from the last directory-mode cycle.
    pub fn snapshot(&self) -> &FolderSnapshot {
        &self.snapshot
    }

    /// Run a single poll cycle. Returns `true` if the source changed.
    pub fn poll_once(&mut self) -> Result<bool> {
        let meta = fs::metadata(&self.source)
            .map_err(|_| WatchBackupError::SourceMissing(self.source.clone()))?;

        if meta.is_dir() {
            self.last_write = None;
            let fresh = FolderSnapshot::capture(&self.source)?;
            let diff = fresh.diff(&self.snapshot);
            if !diff.is_empty() {
                debug!(
                    added = diff.added.len(),
                    removed = diff.removed.len(),
                    modified = diff.modified.len(),
                    "directory snapshot changed"
                );
            }
            self.snapshot = fresh;
            Ok(!diff.is_empty())
        } else {
            self.snapshot = FolderSnapshot::default();
            let modified = meta
                .modified()
                .map_err(|e| WatchBackupError::at(&self.source, e))?;
            if self.last_write == Some(modified) {
                return Ok(false);
            }
            self.last_write = Some(modified);
            Ok(true)
        }
    }
}

impl ChangeDetector for PollingDetector {
    fn name(&self) -> &'static str {
        "polling"
    }

    fn run(&mut self, cancel: &CancelToken, on_change: &mut dyn FnMut()) -> Result<()> {
        self.reporter.info(format!(
            "[poll] watching {} every {} ms",
            self.source.display(),
            self.interval.as_millis()
        ));

        while !cancel.is_cancelled() {
            match self.poll_once() {
                Ok(true) => {
                    self.reporter.info(format!(
                        "[poll] change detected in {}, starting backup",
                        self.source.display()
                    ));
                    on_change();
                }
                Ok(false) => {}
                Err(err) => {
                    self.reporter
                        .warn(format!("[poll] error while checking source: {err}"));
                }
            }

            if cancel.wait_timeout(self.interval) {
                break;
            }
        }

        debug!(source = ?self.source, "polling loop finished");
        Ok(())
    }
}
