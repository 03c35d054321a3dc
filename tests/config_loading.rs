use std::error::Error;
use std::fs;
use std::io::Write;
use std::time::Duration;

use tempfile::{tempdir, NamedTempFile};

use watchbackup::config::{load_and_validate, load_from_path};
use watchbackup::errors::WatchBackupError;
use watchbackup::DetectionMode;
use watchbackup_test_utils::builders::ConfigTomlBuilder;

type TestResult = Result<(), Box<dyn Error>>;

fn config_file(contents: &str) -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    Ok(file)
}

#[test]
fn minimal_config_fills_defaults() -> TestResult {
    let dir = tempdir()?;
    let toml = ConfigTomlBuilder::new(dir.path().join("doc.txt"))
        .target(dir.path().join("t1"))
        .target(dir.path().join("t2"))
        .build();
    let file = config_file(&toml)?;

    let cfg = load_and_validate(file.path())?;
    let wc = cfg.to_watch_config();

    assert_eq!(wc.source, dir.path().join("doc.txt"));
    assert_eq!(wc.targets, vec![dir.path().join("t1"), dir.path().join("t2")]);
    assert_eq!(wc.max_backup_count, 10);
    assert_eq!(wc.detection_mode(), DetectionMode::Event);
    assert_eq!(wc.polling_interval(), Duration::from_millis(3000));
    assert!(!wc.incremental_enabled);
    assert!(cfg.log().file.is_none());
    Ok(())
}

#[test]
fn polling_and_log_sections_are_read() -> TestResult {
    let dir = tempdir()?;
    let toml = ConfigTomlBuilder::new(dir.path().join("doc.txt"))
        .target(dir.path().join("t"))
        .max_backups(3)
        .polling(750)
        .log_file(dir.path().join("backup.log"))
        .build();
    let file = config_file(&toml)?;

    let cfg = load_and_validate(file.path())?;
    let wc = cfg.to_watch_config();

    assert_eq!(wc.detection_mode(), DetectionMode::Polling);
    assert_eq!(wc.polling_interval(), Duration::from_millis(750));
    assert_eq!(wc.effective_max_backup_count(), 3);
    assert_eq!(cfg.log().file.as_deref(), Some(dir.path().join("backup.log").as_path()));
    Ok(())
}

#[test]
fn tiny_polling_interval_is_clamped() -> TestResult {
    let dir = tempdir()?;
    let toml = ConfigTomlBuilder::new(dir.path().join("doc.txt"))
        .target(dir.path().join("t"))
        .polling(10)
        .build();
    let file = config_file(&toml)?;

    let wc = load_and_validate(file.path())?.to_watch_config();
    assert_eq!(wc.polling_interval_ms, 10);
    assert_eq!(wc.polling_interval(), Duration::from_millis(100));
    Ok(())
}

#[test]
fn incremental_flag_is_accepted() -> TestResult {
    let file = config_file(
        r#"
[backup]
source = "/data/doc.txt"
targets = ["/mnt/usb"]
incremental = true
"#,
    )?;

    let wc = load_and_validate(file.path())?.to_watch_config();
    assert!(wc.incremental_enabled);
    Ok(())
}

#[test]
fn empty_targets_are_rejected() -> TestResult {
    let file = config_file(
        r#"
[backup]
source = "/data/doc.txt"
targets = []
"#,
    )?;

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, WatchBackupError::ConfigError(_)), "got {err:?}");

    // Parsing alone does not validate.
    assert!(load_from_path(file.path())?.backup.targets.is_empty());
    Ok(())
}

#[test]
fn zero_retention_is_rejected() -> TestResult {
    let dir = tempdir()?;
    let toml = ConfigTomlBuilder::new(dir.path().join("doc.txt"))
        .target(dir.path().join("t"))
        .max_backups(0)
        .build();
    let file = config_file(&toml)?;

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, WatchBackupError::ConfigError(ref m) if m.contains("max_backup_count")));
    Ok(())
}

#[test]
fn target_inside_source_is_rejected() -> TestResult {
    let dir = tempdir()?;
    let source = dir.path().join("project");
    fs::create_dir_all(source.join("backups"))?;
    let toml = ConfigTomlBuilder::new(&source)
        .target(dir.path().join("elsewhere"))
        .target(source.join("backups"))
        .build();
    let file = config_file(&toml)?;

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, WatchBackupError::ConfigError(ref m) if m.contains("inside the source")));
    Ok(())
}

#[test]
fn missing_backup_section_is_a_toml_error() -> TestResult {
    let file = config_file("[watch]\npolling = true\n")?;

    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, WatchBackupError::TomlError(_)), "got {err:?}");
    Ok(())
}

#[test]
fn unreadable_path_reports_the_path() {
    let err = load_and_validate("/definitely/not/here/WatchBackup.toml").unwrap_err();
    assert!(matches!(err, WatchBackupError::PathIo { .. }));
    assert!(err.to_string().contains("WatchBackup.toml"));
}
