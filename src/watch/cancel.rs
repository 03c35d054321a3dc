// src/watch/cancel.rs

//! Cancellation shared between the controller and its worker thread.
//!
//! The signal is a `crossbeam-channel` done-channel on which nothing is ever
//! sent. [`CancelHandle::cancel`] drops the only sender, which disconnects
//! every [`CancelToken`] at once. Detectors wait on the token directly
//! (polling) or `select!` on it next to their event channel (events), so
//! `stop()` never waits out a poll interval or a receive timeout.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Create a connected handle/token pair.
pub fn cancellation() -> (CancelHandle, CancelToken) {
    let (tx, rx) = crossbeam_channel::bounded(0);
    (CancelHandle { tx: Some(tx) }, CancelToken { rx })
}

/// Owner side; cancelling (or dropping) it wakes every token.
#[derive(Debug)]
pub struct CancelHandle {
    tx: Option<Sender<()>>,
}

impl CancelHandle {
    /// Request cancellation. Idempotent.
    pub fn cancel(&mut self) {
        self.tx.take();
    }
}

/// Waiter side, cloned into whatever needs to observe cancellation.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Receiver<()>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Sleep for up to `timeout`, returning early on cancellation.
    ///
    /// Returns `true` if the token is cancelled. A timeout too large to
    /// form a deadline waits until cancellation.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => !matches!(
                self.rx.recv_deadline(deadline),
                Err(RecvTimeoutError::Timeout)
            ),
            None => {
                // Nothing is ever sent; this only returns on disconnection.
                let _ = self.rx.recv();
                true
            }
        }
    }

    /// Channel to `select!` on; it only ever reports disconnection.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}
