// src/backup/copy.rs

//! Copy engine: writes one tagged backup instance of the source.
//!
//! - A directory source becomes `<baseName>_<stamp>/` holding the whole tree.
//! - A file source becomes `<stem>_<stamp><extension>`, overwriting any
//!   same-named file.
//!
//! Nothing here knows about targets or retention; the caller picks the
//! destination directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use tracing::debug;
use walkdir::WalkDir;

use crate::backup::stamp::BackupStamp;
use crate::errors::{Result, WatchBackupError};
use crate::types::base_name;

/// Name of the per-source folder created inside each target root.
pub fn backup_folder_name(source_base_name: &str) -> String {
    format!("{source_base_name} Backup")
}

/// Name of a single backup instance of `source`.
///
/// `is_dir` decides between the directory form (`name_stamp`) and the file
/// form (`stem_stamp.ext`).
pub fn backup_instance_name(source: &Path, is_dir: bool, stamp: &BackupStamp) -> Option<String> {
    if is_dir {
        let base = base_name(source)?;
        return Some(format!("{base}_{stamp}"));
    }

    let stem = source.file_stem()?.to_string_lossy();
    match source.extension() {
        Some(ext) => Some(format!("{stem}_{stamp}.{}", ext.to_string_lossy())),
        None => Some(format!("{stem}_{stamp}")),
    }
}

/// Copy `source` into `dest_dir`, creating `dest_dir` if needed.
///
/// Returns the path of the backup instance written.
pub fn copy_source(source: &Path, dest_dir: &Path, stamp: &BackupStamp) -> Result<PathBuf> {
    let meta = fs::metadata(source).map_err(|_| WatchBackupError::SourceMissing(source.to_path_buf()))?;
    let is_dir = meta.is_dir();

    let name = backup_instance_name(source, is_dir, stamp)
        .ok_or_else(|| WatchBackupError::SourceMissing(source.to_path_buf()))?;

    fs::create_dir_all(dest_dir).map_err(|source| WatchBackupError::CreateDir {
        path: dest_dir.to_path_buf(),
        source,
    })?;

    let dest = dest_dir.join(name);

    if is_dir {
        let fresh = !dest.exists();
        if let Err(err) = copy_dir_recursive(source, &dest) {
            // Only remove what this call created; an existing folder belongs
            // to an earlier pass that shared the same stamp.
            if fresh {
                if let Err(cleanup) = fs::remove_dir_all(&dest) {
                    debug!(path = ?dest, error = %cleanup, "could not remove partial directory copy");
                }
            }
            return Err(err);
        }
    } else {
        copy_file(source, &dest)?;
    }

    Ok(dest)
}

/// Recursively copy the tree at `src` to `dst`.
///
/// The first directory that cannot be created or file that cannot be copied
/// aborts the whole copy.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    create_dir(dst)?;

    for entry in WalkDir::new(src).min_depth(1).follow_links(true) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src).map_err(|e| {
            anyhow!("walked path {:?} escaped copy root {:?}: {e}", entry.path(), src)
        })?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            create_dir(&target)?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }

    Ok(())
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| WatchBackupError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to).map_err(|source| WatchBackupError::CopyFile {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })?;
    debug!(?from, ?to, "copied file");
    Ok(())
}
