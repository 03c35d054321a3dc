// src/config/validate.rs

use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WatchBackupError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::WatchBackupError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.backup, raw.watch, raw.log))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_source(cfg)?;
    validate_targets(cfg)?;
    validate_retention(cfg)?;
    Ok(())
}

fn validate_source(cfg: &RawConfigFile) -> Result<()> {
    if cfg.backup.source.as_os_str().is_empty() {
        return Err(WatchBackupError::ConfigError(
            "[backup].source must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_targets(cfg: &RawConfigFile) -> Result<()> {
    if cfg.backup.targets.is_empty() {
        return Err(WatchBackupError::ConfigError(
            "[backup].targets must contain at least one directory".to_string(),
        ));
    }

    let source = normalize(&cfg.backup.source);
    for target in cfg.backup.targets.iter() {
        if target.as_os_str().is_empty() {
            return Err(WatchBackupError::ConfigError(
                "[backup].targets contains an empty path".to_string(),
            ));
        }
        // Backing up into the watched tree makes every backup a new change.
        if normalize(target).starts_with(&source) {
            return Err(WatchBackupError::ConfigError(format!(
                "target {:?} is inside the source {:?}",
                target, cfg.backup.source
            )));
        }
    }
    Ok(())
}

fn validate_retention(cfg: &RawConfigFile) -> Result<()> {
    if cfg.backup.max_backup_count == 0 {
        return Err(WatchBackupError::ConfigError(
            "[backup].max_backup_count must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

/// Canonical form when the path exists, otherwise the path as written.
fn normalize(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
