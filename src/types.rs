use std::path::{Path, PathBuf};
use std::time::Duration;

/// Lower bound for the polling interval; anything shorter busy-loops.
pub const MIN_POLLING_INTERVAL_MS: u64 = 100;

/// Upper bound for the polling interval.
pub const MAX_POLLING_INTERVAL_MS: u64 = 1_000_000_000;

pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 3000;

pub const DEFAULT_MAX_BACKUP_COUNT: usize = 10;

/// Which change detector a watch session runs.
///
/// - `Event`: OS-level change notifications on the source's parent directory.
/// - `Polling`: periodic modification-time snapshots, for filesystems that do
///   not deliver native notifications (removable drives, network shares).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMode {
    Event,
    Polling,
}

/// Configuration for one watch session.
///
/// The controller copies this at `start` and never mutates it while the
/// session runs; changing anything requires `stop` + `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// File or directory to back up.
    pub source: PathBuf,
    /// Destination roots, backed up in order.
    pub targets: Vec<PathBuf>,
    pub polling_enabled: bool,
    pub polling_interval_ms: u64,
    /// Historical backups retained per target.
    pub max_backup_count: usize,
    /// Reserved. Every pass is a full copy regardless of this flag.
    pub incremental_enabled: bool,
}

impl WatchConfig {
    pub fn new(source: impl Into<PathBuf>, targets: Vec<PathBuf>) -> Self {
        Self {
            source: source.into(),
            targets,
            polling_enabled: false,
            polling_interval_ms: DEFAULT_POLLING_INTERVAL_MS,
            max_backup_count: DEFAULT_MAX_BACKUP_COUNT,
            incremental_enabled: false,
        }
    }

    pub fn detection_mode(&self) -> DetectionMode {
        if self.polling_enabled {
            DetectionMode::Polling
        } else {
            DetectionMode::Event
        }
    }

    /// Polling interval clamped into `[MIN_POLLING_INTERVAL_MS, MAX_POLLING_INTERVAL_MS]`.
    pub fn polling_interval(&self) -> Duration {
        let ms = self
            .polling_interval_ms
            .clamp(MIN_POLLING_INTERVAL_MS, MAX_POLLING_INTERVAL_MS);
        Duration::from_millis(ms)
    }

    /// Retention cap, never below 1.
    pub fn effective_max_backup_count(&self) -> usize {
        self.max_backup_count.max(1)
    }

    /// Final path component of the source (`report.docx`, `projects`).
    pub fn source_base_name(&self) -> Option<String> {
        base_name(&self.source)
    }
}

pub(crate) fn base_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
