// src/engine/mod.rs

//! Watch engine.
//!
//! This module ties together:
//! - the session lifecycle ([`controller`]): one worker thread per active
//!   watch, race-free start/stop
//! - the logging boundary ([`report`]) every component writes through
//!
//! Detection lives in [`crate::watch`], copying and rotation in
//! [`crate::backup`].

pub mod controller;
pub mod report;

pub use controller::WatchController;
pub use report::{FileSink, LogSink, MemorySink, MultiSink, Reporter, TracingSink};
