// src/engine/report.rs

//! Boundary between the engine and whatever displays or stores its log.
//!
//! Every detector, copy and retention event becomes one human-readable line
//! handed to a [`LogSink`]. The [`Reporter`] also mirrors each line into
//! `tracing`, so a sink is only needed when the caller wants the lines
//! somewhere other than the subscriber (a file, a UI list, a test buffer).

use std::fmt::Debug;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, info, warn};

/// Receiver of human-readable engine log lines.
pub trait LogSink: Send + Sync + Debug {
    fn log(&self, line: &str);
}

/// Sink that drops lines; the `tracing` mirror in [`Reporter`] is the only output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, _line: &str) {}
}

/// Appends `[YYYY-MM-DD HH:MM:SS] <line>` to a log file.
///
/// The file is opened in append mode for each line so external rotation or
/// deletion of the file is picked up without restarting.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn log(&self, line: &str) {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let res = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| writeln!(f, "[{stamp}] {line}"));

        if let Err(err) = res {
            // Can't report through ourselves; the subscriber still has the line.
            warn!(path = ?self.path, error = %err, "failed to append to log file");
        }
    }
}

/// Collects lines in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of logged lines containing `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|l| l.contains(needle))
            .count()
    }
}

impl LogSink for MemorySink {
    fn log(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

/// Forwards every line to each inner sink, in order.
#[derive(Debug, Clone, Default)]
pub struct MultiSink {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl MultiSink {
    pub fn new(sinks: Vec<Arc<dyn LogSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn LogSink>) {
        self.sinks.push(sink);
    }
}

impl LogSink for MultiSink {
    fn log(&self, line: &str) {
        for sink in &self.sinks {
            sink.log(line);
        }
    }
}

/// Handle the engine components log through.
///
/// Cheap to clone; the worker thread and the caller's thread each hold one.
#[derive(Debug, Clone)]
pub struct Reporter {
    sink: Arc<dyn LogSink>,
}

impl Reporter {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    pub fn info(&self, line: impl AsRef<str>) {
        let line = line.as_ref();
        info!(target: "watchbackup", "{line}");
        self.sink.log(line);
    }

    pub fn warn(&self, line: impl AsRef<str>) {
        let line = line.as_ref();
        warn!(target: "watchbackup", "{line}");
        self.sink.log(line);
    }

    pub fn error(&self, line: impl AsRef<str>) {
        let line = line.as_ref();
        error!(target: "watchbackup", "{line}");
        self.sink.log(line);
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}
