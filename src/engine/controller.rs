// src/engine/controller.rs

//! Watch session lifecycle.
//!
//! The controller owns at most one worker thread. `start` spawns it with the
//! detector chosen by the configuration; `stop` cancels whatever the worker
//! is blocked on and joins it before returning.
//!
//! `backup_now` runs on the caller's thread and is **not** serialized with
//! the worker's own passes. Both may write into the same backup folder at
//! once; callers that need strict ordering must stop the session first or
//! synchronize externally.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::backup::{BackupEngine, PassReport};
use crate::engine::report::{LogSink, Reporter};
use crate::errors::{Result, WatchBackupError};
use crate::types::WatchConfig;
use crate::watch::cancel::{cancellation, CancelHandle, CancelToken};
use crate::watch::detector::detector_for;

struct Session {
    cancel: CancelHandle,
    handle: JoinHandle<()>,
}

/// Starts, stops and reports on a watch session.
pub struct WatchController {
    reporter: Reporter,
    config: Option<Arc<WatchConfig>>,
    watching: Arc<AtomicBool>,
    passes: Arc<AtomicU64>,
    session: Option<Session>,
}

impl std::fmt::Debug for WatchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchController")
            .field("config", &self.config)
            .field("watching", &self.is_watching())
            .field("has_worker", &self.session.is_some())
            .finish()
    }
}

impl WatchController {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self::with_reporter(Reporter::new(sink))
    }

    pub fn with_reporter(reporter: Reporter) -> Self {
        Self {
            reporter,
            config: None,
            watching: Arc::new(AtomicBool::new(false)),
            passes: Arc::new(AtomicU64::new(0)),
            session: None,
        }
    }

    /// Configuration used by the current (or last) session and by `backup_now`.
    pub fn config(&self) -> Option<&WatchConfig> {
        self.config.as_deref()
    }

    /// Set the configuration without starting a session.
    ///
    /// Rejected while watching; the running session keeps its own copy.
    pub fn configure(&mut self, config: WatchConfig) -> Result<()> {
        if self.is_watching() {
            return Err(WatchBackupError::ConfigError(
                "cannot change configuration while watching; stop first".to_string(),
            ));
        }
        self.config = Some(Arc::new(config));
        Ok(())
    }

    /// Start a watch session. Returns `false` without side effects if a
    /// session is already active or the configuration is unusable.
    pub fn start(&mut self, config: WatchConfig) -> bool {
        if self.is_watching() {
            self.reporter
                .warn("[watch] start ignored: a watch session is already active");
            return false;
        }
        if config.source.as_os_str().is_empty() {
            self.reporter.warn("[watch] cannot start: no source path configured");
            return false;
        }
        if config.targets.is_empty() {
            self.reporter.warn("[watch] cannot start: no backup targets configured");
            return false;
        }
        if !config.source.exists() {
            self.reporter.warn(format!(
                "[watch] cannot start: source path does not exist: {}",
                config.source.display()
            ));
            return false;
        }

        // A worker that ended on its own still has to be joined.
        self.reap_session();

        let config = Arc::new(config);
        let (cancel, token) = cancellation();
        let worker = Worker {
            config: Arc::clone(&config),
            cancel: token,
            watching: Arc::clone(&self.watching),
            passes: Arc::clone(&self.passes),
            reporter: self.reporter.clone(),
        };

        self.watching.store(true, Ordering::SeqCst);
        let spawned = thread::Builder::new()
            .name("watchbackup-worker".to_string())
            .spawn(move || worker.run());

        match spawned {
            Ok(handle) => {
                self.reporter.info(format!(
                    "[watch] started on {} ({:?} mode, {} target(s))",
                    config.source.display(),
                    config.detection_mode(),
                    config.targets.len()
                ));
                self.session = Some(Session { cancel, handle });
                self.config = Some(config);
                true
            }
            Err(err) => {
                self.watching.store(false, Ordering::SeqCst);
                self.reporter
                    .error(format!("[error] cannot spawn watch thread: {err}"));
                false
            }
        }
    }

    /// Stop the active session, if any, and wait for the worker to exit.
    pub fn stop(&mut self) {
        let was_watching = self.watching.swap(false, Ordering::SeqCst);
        if self.reap_session() && was_watching {
            self.reporter.info("[watch] stopped");
        }
    }

    /// Cancel and join the worker. Returns `true` if there was one.
    fn reap_session(&mut self) -> bool {
        let Some(mut session) = self.session.take() else {
            return false;
        };

        session.cancel.cancel();
        if session.handle.join().is_err() {
            self.reporter.error("[error] watch thread panicked");
        }
        debug!("watch worker joined");
        true
    }

    pub fn is_watching(&self) -> bool {
        self.watching.load(Ordering::SeqCst)
    }

    /// Backup passes completed by watch sessions of this controller.
    pub fn completed_passes(&self) -> u64 {
        self.passes.load(Ordering::SeqCst)
    }

    /// Run one backup pass now on the caller's thread.
    ///
    /// Returns `None` if nothing has been configured yet.
    pub fn backup_now(&self) -> Option<PassReport> {
        let Some(config) = &self.config else {
            self.reporter
                .warn("[backup] manual backup skipped: nothing configured");
            return None;
        };

        let report = BackupEngine::new(Arc::clone(config), self.reporter.clone()).run_pass();
        self.reporter.info("[backup] manual backup finished");
        Some(report)
    }
}

impl Drop for WatchController {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything the worker thread owns.
struct Worker {
    config: Arc<WatchConfig>,
    cancel: CancelToken,
    watching: Arc<AtomicBool>,
    passes: Arc<AtomicU64>,
    reporter: Reporter,
}

impl Worker {
    fn run(self) {
        let engine = BackupEngine::new(Arc::clone(&self.config), self.reporter.clone());
        let mut detector = detector_for(&self.config, self.reporter.clone());
        let passes = Arc::clone(&self.passes);

        let res = detector.run(&self.cancel, &mut || {
            engine.run_pass();
            passes.fetch_add(1, Ordering::SeqCst);
        });

        if let Err(err) = res {
            if !self.cancel.is_cancelled() {
                self.reporter.error(format!(
                    "[error] {} detector stopped, watch session ended: {err}",
                    detector.name()
                ));
            }
        }

        self.watching.store(false, Ordering::SeqCst);
        debug!("watch worker exiting");
    }
}
