// src/watch/mod.rs

//! Change detection.
//!
//! This module is responsible for:
//! - The [`ChangeDetector`] seam and strategy selection ([`detector`]).
//! - OS-notification based detection via `notify` ([`event`]).
//! - Periodic modification-time polling ([`polling`], [`snapshot`]).
//! - Cancellable waits so a session can be stopped promptly ([`cancel`]).
//!
//! It does **not** know how backups are written; a detector only calls the
//! `on_change` callback it is given.

pub mod cancel;
pub mod detector;
pub mod event;
pub mod polling;
pub mod snapshot;

pub use cancel::{cancellation, CancelHandle, CancelToken};
pub use detector::{detector_for, ChangeDetector};
pub use event::{decode_event, is_watched_change, ChangeAction, EventDecoder, EventDetector, Notification};
pub use polling::PollingDetector;
pub use snapshot::{FolderSnapshot, SnapshotDiff};
