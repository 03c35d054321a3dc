// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{WatchConfig, DEFAULT_MAX_BACKUP_COUNT, DEFAULT_POLLING_INTERVAL_MS};

/// Configuration file exactly as deserialized from TOML.
///
/// ```toml
/// [backup]
/// source = "/home/me/report.docx"
/// targets = ["/mnt/usb", "/srv/mirror"]
/// max_backup_count = 10
///
/// [watch]
/// polling = true
/// polling_interval_ms = 3000
///
/// [log]
/// file = "backup.log"
/// ```
///
/// Only `[backup]` is required. Use [`ConfigFile::try_from`] to validate.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub backup: BackupSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub log: LogSection,
}

/// `[backup]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BackupSection {
    /// File or directory to back up.
    pub source: PathBuf,

    /// Destination roots; each receives its own `<name> Backup` folder.
    #[serde(default)]
    pub targets: Vec<PathBuf>,

    /// Backups kept per target.
    #[serde(default = "default_max_backup_count")]
    pub max_backup_count: usize,

    /// Reserved; accepted and carried through but has no effect.
    #[serde(default)]
    pub incremental: bool,
}

fn default_max_backup_count() -> usize {
    DEFAULT_MAX_BACKUP_COUNT
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Poll modification times instead of using OS notifications.
    #[serde(default)]
    pub polling: bool,

    /// Clamped to at least 100 ms when used.
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,
}

fn default_polling_interval_ms() -> u64 {
    DEFAULT_POLLING_INTERVAL_MS
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            polling: false,
            polling_interval_ms: default_polling_interval_ms(),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogSection {
    /// Append every engine log line to this file as well.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    backup: BackupSection,
    watch: WatchSection,
    log: LogSection,
}

impl ConfigFile {
    /// Build without validation; callers go through `TryFrom<RawConfigFile>`.
    pub(crate) fn new_unchecked(backup: BackupSection, watch: WatchSection, log: LogSection) -> Self {
        Self { backup, watch, log }
    }

    pub fn backup(&self) -> &BackupSection {
        &self.backup
    }

    pub fn watch(&self) -> &WatchSection {
        &self.watch
    }

    pub fn log(&self) -> &LogSection {
        &self.log
    }

    /// The engine-facing configuration.
    pub fn to_watch_config(&self) -> WatchConfig {
        WatchConfig {
            source: self.backup.source.clone(),
            targets: self.backup.targets.clone(),
            polling_enabled: self.watch.polling,
            polling_interval_ms: self.watch.polling_interval_ms,
            max_backup_count: self.backup.max_backup_count,
            incremental_enabled: self.backup.incremental,
        }
    }
}
