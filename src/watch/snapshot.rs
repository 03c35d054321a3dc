// src/watch/snapshot.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::errors::{Result, WatchBackupError};

/// Last-write times of every regular file under a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSnapshot {
    entries: HashMap<PathBuf, SystemTime>,
}

/// Per-path differences between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

impl FolderSnapshot {
    /// Walk `root` recursively and record every regular file.
    ///
    /// Symlinks are followed, matching what a backup copies. Any entry that
    /// cannot be listed or stat'ed fails the whole capture.
    pub fn capture(root: &Path) -> Result<Self> {
        let mut entries = HashMap::new();

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let modified = entry
                .metadata()?
                .modified()
                .map_err(|e| WatchBackupError::at(entry.path(), e))?;
            entries.insert(entry.into_path(), modified);
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `true` if any path was added, removed, or has a different timestamp.
    pub fn differs_from(&self, previous: &FolderSnapshot) -> bool {
        self.entries != previous.entries
    }

    pub fn diff(&self, previous: &FolderSnapshot) -> SnapshotDiff {
        let mut diff = SnapshotDiff::default();

        for (path, time) in &self.entries {
            match previous.entries.get(path) {
                None => diff.added.push(path.clone()),
                Some(old) if old != time => diff.modified.push(path.clone()),
                Some(_) => {}
            }
        }
        for path in previous.entries.keys() {
            if !self.entries.contains_key(path) {
                diff.removed.push(path.clone());
            }
        }

        diff.added.sort();
        diff.removed.sort();
        diff.modified.sort();
        diff
    }
}
