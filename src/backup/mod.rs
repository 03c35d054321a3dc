// src/backup/mod.rs

//! Backup passes.
//!
//! A pass copies the source once into every configured target and then
//! trims each target's backup folder:
//!
//! ```text
//! <target>/<baseName> Backup/<stem>_<YYYYMMDD_HHMMSS><ext>   (file source)
//! <target>/<baseName> Backup/<baseName>_<YYYYMMDD_HHMMSS>/   (directory source)
//! ```
//!
//! - [`copy`] writes a single tagged backup instance.
//! - [`retention`] deletes the oldest instances beyond the cap.
//! - [`stamp`] formats the tag.
//!
//! Targets are independent: a failure in one is logged and the pass moves
//! on to the next.

pub mod copy;
pub mod retention;
pub mod stamp;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::engine::report::Reporter;
use crate::types::WatchConfig;

pub use copy::{backup_folder_name, backup_instance_name, copy_dir_recursive, copy_source};
pub use retention::{trim_backups, TrimOutcome};
pub use stamp::BackupStamp;

/// Result of one pass for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub target: PathBuf,
    /// The `<baseName> Backup` folder inside `target`.
    pub backup_folder: PathBuf,
    /// Backup instance written, if the copy succeeded.
    pub written: Option<PathBuf>,
    /// Copy failure message, if it failed.
    pub error: Option<String>,
    /// Retention result, if the folder could be listed.
    pub trim: Option<TrimOutcome>,
}

impl TargetReport {
    pub fn succeeded(&self) -> bool {
        self.written.is_some()
    }
}

/// Result of one backup pass over every target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub stamp: BackupStamp,
    /// `true` when the source was missing and no target was touched.
    pub source_missing: bool,
    pub targets: Vec<TargetReport>,
}

impl PassReport {
    pub fn succeeded(&self) -> usize {
        self.targets.iter().filter(|t| t.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.targets.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        !self.source_missing && self.targets.iter().all(TargetReport::succeeded)
    }
}

/// Runs backup passes for one configuration.
#[derive(Debug, Clone)]
pub struct BackupEngine {
    config: Arc<WatchConfig>,
    reporter: Reporter,
}

impl BackupEngine {
    pub fn new(config: Arc<WatchConfig>, reporter: Reporter) -> Self {
        Self { config, reporter }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Run one pass tagged with the current local time.
    pub fn run_pass(&self) -> PassReport {
        self.run_pass_at(&BackupStamp::now())
    }

    /// Run one pass with an explicit tag.
    pub fn run_pass_at(&self, stamp: &BackupStamp) -> PassReport {
        let source = &self.config.source;
        let mut report = PassReport {
            stamp: stamp.clone(),
            source_missing: false,
            targets: Vec::with_capacity(self.config.targets.len()),
        };

        let base = match (fs::metadata(source), self.config.source_base_name()) {
            (Ok(_), Some(base)) => base,
            _ => {
                self.reporter.error(format!(
                    "[error] source path is invalid or does not exist: {}",
                    source.display()
                ));
                report.source_missing = true;
                return report;
            }
        };

        let folder_name = backup_folder_name(&base);
        let max = self.config.effective_max_backup_count();

        for target in &self.config.targets {
            let backup_folder = target.join(&folder_name);
            let mut target_report = TargetReport {
                target: target.clone(),
                backup_folder: backup_folder.clone(),
                written: None,
                error: None,
                trim: None,
            };

            match copy_source(source, &backup_folder, stamp) {
                Ok(dest) => {
                    self.reporter.info(format!(
                        "[backup ok] {} -> {}",
                        source.display(),
                        dest.display()
                    ));
                    target_report.written = Some(dest);
                }
                Err(err) => {
                    self.reporter.error(format!(
                        "[error] backup to {} failed: {err}",
                        target.display()
                    ));
                    target_report.error = Some(err.to_string());
                }
            }

            if backup_folder.is_dir() {
                match trim_backups(&backup_folder, max, &self.reporter) {
                    Ok(outcome) => target_report.trim = Some(outcome),
                    Err(err) => self.reporter.warn(format!(
                        "[cleanup] cannot list {}: {err}",
                        backup_folder.display()
                    )),
                }
            }

            report.targets.push(target_report);
        }

        debug!(
            stamp = %report.stamp,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "backup pass finished"
        );
        report
    }
}
