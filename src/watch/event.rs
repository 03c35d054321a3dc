// src/watch/event.rs

//! Change detection through OS notifications (`notify`).
//!
//! The detector watches the source's *parent* directory non-recursively and
//! only reacts to events whose file name matches the source's base name,
//! ignoring case. Edits inside a watched directory's subtree are therefore
//! invisible here; use polling for whole-tree watching.
//!
//! Some backends (inotify) report a rename twice: once per side, then again
//! as a single two-path event with the same tracker. [`EventDecoder`] drops
//! the repeat so one rename triggers one backup.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::anyhow;
use crossbeam_channel::select;
use notify::event::{MetadataKind, ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::debug;

use crate::engine::report::Reporter;
use crate::errors::{Result, WatchBackupError};
use crate::types::base_name;
use crate::watch::cancel::CancelToken;
use crate::watch::detector::ChangeDetector;

/// Upper bound on a single wait, so cancellation is seen even without events.
pub const EVENT_WAIT: Duration = Duration::from_millis(500);

/// What happened to a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Added,
    Removed,
    Modified,
    RenamedFrom,
    RenamedTo,
    Other,
}

impl ChangeAction {
    /// Only content writes, creations and renames onto the name count.
    pub fn triggers_backup(self) -> bool {
        matches!(
            self,
            ChangeAction::Added | ChangeAction::Modified | ChangeAction::RenamedTo
        )
    }
}

/// One decoded (name, action) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub name: String,
    pub action: ChangeAction,
}

fn action_for(kind: &EventKind) -> ChangeAction {
    match kind {
        EventKind::Create(_) => ChangeAction::Added,
        EventKind::Remove(_) => ChangeAction::Removed,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => ChangeAction::RenamedFrom,
        // Some backends cannot tell the two halves of a rename apart.
        EventKind::Modify(ModifyKind::Name(_)) => ChangeAction::RenamedTo,
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime | MetadataKind::Any)) => {
            ChangeAction::Modified
        }
        EventKind::Modify(ModifyKind::Metadata(_)) => ChangeAction::Other,
        EventKind::Modify(_) => ChangeAction::Modified,
        _ => ChangeAction::Other,
    }
}

/// Decode a `notify` event into (name, action) pairs.
///
/// A two-path rename becomes `RenamedFrom` for the old name and `RenamedTo`
/// for the new one.
pub fn decode_event(event: &Event) -> Vec<Notification> {
    let names = event.paths.iter().filter_map(|p| base_name(p));

    if let EventKind::Modify(ModifyKind::Name(RenameMode::Both)) = event.kind {
        return names
            .enumerate()
            .map(|(i, name)| Notification {
                name,
                action: if i == 0 {
                    ChangeAction::RenamedFrom
                } else {
                    ChangeAction::RenamedTo
                },
            })
            .collect();
    }

    let action = action_for(&event.kind);
    names.map(|name| Notification { name, action }).collect()
}

/// Whether `notification` should trigger a backup of the file named
/// `watched_name`.
pub fn is_watched_change(watched_name: &str, notification: &Notification) -> bool {
    notification.action.triggers_backup()
        && notification.name.to_lowercase() == watched_name.to_lowercase()
}

/// Trackers of one-sided renames kept while waiting for their two-path repeat.
const TRACKER_MEMORY: usize = 64;

/// Stateful [`decode_event`] that drops a two-path rename whose destination
/// side was already reported on its own.
#[derive(Debug, Default)]
pub struct EventDecoder {
    seen: VecDeque<usize>,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, event: &Event) -> Vec<Notification> {
        match (&event.kind, event.tracker()) {
            (EventKind::Modify(ModifyKind::Name(RenameMode::Both)), Some(tracker)) => {
                if let Some(pos) = self.seen.iter().position(|t| *t == tracker) {
                    self.seen.remove(pos);
                    return Vec::new();
                }
            }
            (EventKind::Modify(ModifyKind::Name(RenameMode::To)), Some(tracker)) => {
                if !self.seen.contains(&tracker) {
                    if self.seen.len() == TRACKER_MEMORY {
                        self.seen.pop_front();
                    }
                    self.seen.push_back(tracker);
                }
            }
            _ => {}
        }
        decode_event(event)
    }
}

#[derive(Debug)]
pub struct EventDetector {
    source: PathBuf,
    reporter: Reporter,
    wait: Duration,
}

impl EventDetector {
    pub fn new(source: impl AsRef<Path>, reporter: Reporter) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            reporter,
            wait: EVENT_WAIT,
        }
    }

    fn watch_target(&self) -> Result<(PathBuf, String)> {
        let name = base_name(&self.source)
            .ok_or_else(|| WatchBackupError::SourceMissing(self.source.clone()))?;
        let dir = match self.source.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => std::env::current_dir()?,
        };
        Ok((dir, name))
    }
}

impl ChangeDetector for EventDetector {
    fn name(&self) -> &'static str {
        "event"
    }

    fn run(&mut self, cancel: &CancelToken, on_change: &mut dyn FnMut()) -> Result<()> {
        let (watch_dir, watched_name) = self.watch_target()?;

        let (tx, rx) = crossbeam_channel::unbounded::<notify::Result<Event>>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                // Receiver gone means the loop already exited.
                let _ = tx.send(res);
            },
            Config::default(),
        )
        .map_err(|e| {
            WatchBackupError::Other(anyhow!(
                "cannot open watch handle on {}: {e}",
                watch_dir.display()
            ))
        })?;

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                WatchBackupError::Other(anyhow!(
                    "cannot open watch handle on {}: {e}",
                    watch_dir.display()
                ))
            })?;

        self.reporter.info(format!(
            "[event] watching {} for changes to {}",
            watch_dir.display(),
            watched_name
        ));

        let mut decoder = EventDecoder::new();

        loop {
            let event = select! {
                recv(cancel.receiver()) -> _ => break,
                recv(rx) -> msg => match msg {
                    Ok(Ok(event)) => event,
                    Ok(Err(err)) => {
                        if cancel.is_cancelled() {
                            break;
                        }
                        return Err(err.into());
                    }
                    Err(_) => {
                        if cancel.is_cancelled() {
                            break;
                        }
                        return Err(WatchBackupError::Other(anyhow!(
                            "change notification channel closed"
                        )));
                    }
                },
                default(self.wait) => continue,
            };

            for notification in decoder.decode(&event) {
                debug!(name = %notification.name, action = ?notification.action, "directory change");

                if is_watched_change(&watched_name, &notification) {
                    self.reporter.info(format!(
                        "[event] {} changed ({:?}), starting backup",
                        notification.name, notification.action
                    ));
                    on_change();
                }
            }
        }

        // Dropping the watcher releases the OS handle.
        drop(watcher);
        debug!(dir = ?watch_dir, "event loop finished");
        Ok(())
    }
}
