// src/watch/detector.rs

//! The change-source seam.
//!
//! A watch session runs exactly one [`ChangeDetector`] on its worker thread.
//! Which one is decided by [`DetectionMode`], not by branches in the
//! controller.

use crate::engine::report::Reporter;
use crate::errors::Result;
use crate::types::{DetectionMode, WatchConfig};
use crate::watch::cancel::CancelToken;
use crate::watch::event::EventDetector;
use crate::watch::polling::PollingDetector;

/// Something that observes the source and reports "it changed".
pub trait ChangeDetector: Send {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Block until `cancel` fires, calling `on_change` once per detected change.
    ///
    /// `on_change` runs synchronously; no new wait starts until it returns.
    /// An `Err` means the detector could not continue and the session is over.
    fn run(&mut self, cancel: &CancelToken, on_change: &mut dyn FnMut()) -> Result<()>;
}

/// Build the detector selected by `config`.
pub fn detector_for(config: &WatchConfig, reporter: Reporter) -> Box<dyn ChangeDetector> {
    match config.detection_mode() {
        DetectionMode::Event => Box::new(EventDetector::new(&config.source, reporter)),
        DetectionMode::Polling => Box::new(PollingDetector::new(
            &config.source,
            config.polling_interval(),
            reporter,
        )),
    }
}
