// src/lib.rs

pub mod backup;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{FileSink, LogSink, TracingSink, WatchController};

pub use crate::backup::{BackupEngine, BackupStamp, PassReport};
pub use crate::engine::report::Reporter;
pub use crate::types::{DetectionMode, WatchConfig};

/// How often the binary checks whether the session ended on its own.
const SESSION_CHECK_INTERVAL: Duration = Duration::from_millis(500);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the log sink(s)
/// - the watch controller
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let watch_config = cfg.to_watch_config();
    let mut controller = WatchController::new(build_sink(&cfg));

    if args.once {
        controller.configure(watch_config)?;
        let report = tokio::task::spawn_blocking(move || controller.backup_now()).await?;
        return match report {
            Some(r) if r.all_succeeded() => Ok(()),
            Some(r) if r.source_missing => bail!("source path does not exist"),
            Some(r) => bail!(
                "backup failed for {} of {} target(s)",
                r.failed(),
                r.targets.len()
            ),
            None => bail!("nothing to back up"),
        };
    }

    let source = watch_config.source.clone();
    if !controller.start(watch_config) {
        bail!("could not start watching {:?}", source);
    }

    let ended_on_its_own = wait_for_shutdown(&controller).await;

    // Joining the worker may wait out an in-flight backup pass.
    tokio::task::spawn_blocking(move || controller.stop()).await?;

    if ended_on_its_own {
        bail!("watch session on {:?} ended unexpectedly", source);
    }
    Ok(())
}

/// Wait for Ctrl-C or for the session to end by itself.
///
/// Returns `true` in the latter case.
async fn wait_for_shutdown(controller: &WatchController) -> bool {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(SESSION_CHECK_INTERVAL);

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    eprintln!("failed to listen for Ctrl+C: {e}");
                }
                info!("shutdown requested; stopping watch");
                return false;
            }
            _ = ticker.tick() => {
                if !controller.is_watching() {
                    warn!("watch session ended");
                    return true;
                }
            }
        }
    }
}

/// Engine lines always reach `tracing`; `[log] file` adds a file copy.
fn build_sink(cfg: &ConfigFile) -> Arc<dyn LogSink> {
    match cfg.log().file {
        Some(ref path) => {
            info!(?path, "appending backup log to file");
            Arc::new(FileSink::new(path.clone()))
        }
        None => Arc::new(TracingSink),
    }
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(cfg: &ConfigFile) {
    let wc = cfg.to_watch_config();

    println!("watchbackup dry-run");
    println!("  source = {}", wc.source.display());
    println!("  mode = {:?}", wc.detection_mode());
    if wc.polling_enabled {
        println!("  polling_interval = {} ms", wc.polling_interval().as_millis());
    }
    println!("  max_backup_count = {}", wc.effective_max_backup_count());
    if wc.incremental_enabled {
        println!("  incremental = true (reserved, full copies are made)");
    }
    if let Some(ref file) = cfg.log().file {
        println!("  log file = {}", file.display());
    }
    println!();

    let folder = wc
        .source_base_name()
        .map(|b| backup::backup_folder_name(&b))
        .unwrap_or_default();

    println!("targets ({}):", wc.targets.len());
    for target in wc.targets.iter() {
        println!("  - {}", target.join(&folder).display());
    }

    debug!("dry-run complete (nothing copied)");
}
