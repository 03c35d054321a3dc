#![allow(dead_code)]

use std::path::{Path, PathBuf};

use watchbackup::WatchConfig;

/// Builder for `WatchConfig` to simplify test setup.
pub struct WatchConfigBuilder {
    config: WatchConfig,
}

impl WatchConfigBuilder {
    pub fn new(source: impl AsRef<Path>) -> Self {
        Self {
            config: WatchConfig::new(source.as_ref(), Vec::new()),
        }
    }

    pub fn target(mut self, target: impl AsRef<Path>) -> Self {
        self.config.targets.push(target.as_ref().to_path_buf());
        self
    }

    pub fn polling(mut self, interval_ms: u64) -> Self {
        self.config.polling_enabled = true;
        self.config.polling_interval_ms = interval_ms;
        self
    }

    pub fn max_backups(mut self, count: usize) -> Self {
        self.config.max_backup_count = count;
        self
    }

    pub fn incremental(mut self, val: bool) -> Self {
        self.config.incremental_enabled = val;
        self
    }

    pub fn build(self) -> WatchConfig {
        self.config
    }
}

/// Builder for the TOML text of a config file.
pub struct ConfigTomlBuilder {
    source: PathBuf,
    targets: Vec<PathBuf>,
    max_backup_count: Option<usize>,
    polling: Option<bool>,
    polling_interval_ms: Option<u64>,
    log_file: Option<PathBuf>,
}

impl ConfigTomlBuilder {
    pub fn new(source: impl AsRef<Path>) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            targets: Vec::new(),
            max_backup_count: None,
            polling: None,
            polling_interval_ms: None,
            log_file: None,
        }
    }

    pub fn target(mut self, target: impl AsRef<Path>) -> Self {
        self.targets.push(target.as_ref().to_path_buf());
        self
    }

    pub fn max_backups(mut self, count: usize) -> Self {
        self.max_backup_count = Some(count);
        self
    }

    pub fn polling(mut self, interval_ms: u64) -> Self {
        self.polling = Some(true);
        self.polling_interval_ms = Some(interval_ms);
        self
    }

    pub fn log_file(mut self, path: impl AsRef<Path>) -> Self {
        self.log_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> String {
        let mut out = String::from("[backup]\n");
        out.push_str(&format!("source = {}\n", toml_path(&self.source)));
        let targets: Vec<String> = self.targets.iter().map(|t| toml_path(t)).collect();
        out.push_str(&format!("targets = [{}]\n", targets.join(", ")));
        if let Some(n) = self.max_backup_count {
            out.push_str(&format!("max_backup_count = {n}\n"));
        }

        if self.polling.is_some() || self.polling_interval_ms.is_some() {
            out.push_str("\n[watch]\n");
            if let Some(p) = self.polling {
                out.push_str(&format!("polling = {p}\n"));
            }
            if let Some(ms) = self.polling_interval_ms {
                out.push_str(&format!("polling_interval_ms = {ms}\n"));
            }
        }

        if let Some(ref file) = self.log_file {
            out.push_str("\n[log]\n");
            out.push_str(&format!("file = {}\n", toml_path(file)));
        }

        out
    }
}

/// TOML literal string for a path (no escape processing needed).
fn toml_path(path: &Path) -> String {
    format!("'{}'", path.display())
}
