// src/config/mod.rs

//! Configuration file handling for the `watchbackup` binary.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).
//!
//! The engine itself only sees [`crate::types::WatchConfig`]; this module is
//! one way of producing it.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{BackupSection, ConfigFile, LogSection, RawConfigFile, WatchSection};
