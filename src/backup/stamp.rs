// src/backup/stamp.rs

use std::fmt;

use chrono::{DateTime, Local, TimeZone};

/// `strftime` pattern for backup name tags.
pub const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Timestamp tag appended to every backup instance (`YYYYMMDD_HHMMSS`).
///
/// One stamp is taken per backup pass and shared by all targets, so the
/// same pass produces identically named backups everywhere.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BackupStamp(String);

impl BackupStamp {
    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        BackupStamp(dt.format(STAMP_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackupStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
