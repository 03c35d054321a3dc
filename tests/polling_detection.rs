use std::error::Error;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use filetime::{set_file_mtime, FileTime};
use tempfile::tempdir;

use watchbackup::engine::{MemorySink, Reporter, WatchController};
use watchbackup::errors::WatchBackupError;
use watchbackup::watch::{FolderSnapshot, PollingDetector};
use watchbackup_test_utils::builders::WatchConfigBuilder;
use watchbackup_test_utils::{entry_count, init_tracing, wait_until};

type TestResult = Result<(), Box<dyn Error>>;

const INTERVAL: Duration = Duration::from_millis(100);

#[test]
fn directory_poll_reports_each_kind_of_change_once() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let root = dir.path().join("project");
    fs::create_dir_all(root.join("nested/deeper"))?;
    let deep = root.join("nested/deeper/file.txt");
    fs::write(&deep, "x")?;
    set_file_mtime(&deep, FileTime::from_unix_time(1_000, 0))?;

    let mut detector = PollingDetector::new(&root, INTERVAL, Reporter::default());

    // Empty baseline: the first look is a change.
    assert!(detector.poll_once()?);
    assert_eq!(detector.snapshot().len(), 1);
    assert!(!detector.poll_once()?);

    set_file_mtime(&deep, FileTime::from_unix_time(2_000, 0))?;
    assert!(detector.poll_once()?);
    assert!(!detector.poll_once()?);

    fs::write(root.join("added.txt"), "new")?;
    assert!(detector.poll_once()?);
    assert!(!detector.poll_once()?);

    fs::remove_file(root.join("added.txt"))?;
    assert!(detector.poll_once()?);
    assert!(!detector.poll_once()?);
    Ok(())
}

#[test]
fn empty_directories_are_not_tracked() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path().join("project");
    fs::create_dir_all(&root)?;

    let mut detector = PollingDetector::new(&root, INTERVAL, Reporter::default());
    assert!(!detector.poll_once()?);

    fs::create_dir_all(root.join("empty_sub"))?;
    assert!(!detector.poll_once()?);
    Ok(())
}

#[test]
fn file_poll_compares_last_write_time() -> TestResult {
    let dir = tempdir()?;
    let source = dir.path().join("report.docx");
    fs::write(&source, "v1")?;
    set_file_mtime(&source, FileTime::from_unix_time(1_000, 0))?;

    let mut detector = PollingDetector::new(&source, INTERVAL, Reporter::default());
    assert!(detector.poll_once()?);
    assert!(!detector.poll_once()?);

    set_file_mtime(&source, FileTime::from_unix_time(1_500, 0))?;
    assert!(detector.poll_once()?);
    assert!(!detector.poll_once()?);
    Ok(())
}

#[test]
fn missing_source_keeps_the_baseline() -> TestResult {
    let dir = tempdir()?;
    let source = dir.path().join("report.docx");
    fs::write(&source, "v1")?;
    set_file_mtime(&source, FileTime::from_unix_time(1_000, 0))?;

    let mut detector = PollingDetector::new(&source, INTERVAL, Reporter::default());
    assert!(detector.poll_once()?);

    fs::remove_file(&source)?;
    let err = detector.poll_once().unwrap_err();
    assert!(matches!(err, WatchBackupError::SourceMissing(_)));

    // Back with the same last-write time: nothing new to back up.
    fs::write(&source, "v1")?;
    set_file_mtime(&source, FileTime::from_unix_time(1_000, 0))?;
    assert!(!detector.poll_once()?);

    set_file_mtime(&source, FileTime::from_unix_time(2_000, 0))?;
    assert!(detector.poll_once()?);
    Ok(())
}

#[cfg(unix)]
#[test]
fn failed_walk_keeps_the_directory_baseline() -> TestResult {
    use std::os::unix::fs::symlink;

    let dir = tempdir()?;
    let root = dir.path().join("project");
    fs::create_dir_all(&root)?;
    fs::write(root.join("a.txt"), "a")?;

    let mut detector = PollingDetector::new(&root, INTERVAL, Reporter::default());
    assert!(detector.poll_once()?);

    // A link back to the root makes the walk fail with a loop error.
    let cycle = root.join("cycle");
    symlink(&root, &cycle)?;
    assert!(detector.poll_once().is_err());
    assert_eq!(detector.snapshot().len(), 1);

    fs::remove_file(&cycle)?;
    assert!(!detector.poll_once()?);
    Ok(())
}

#[cfg(unix)]
#[test]
fn edits_behind_a_symlinked_directory_are_seen() -> TestResult {
    use std::os::unix::fs::symlink;

    let dir = tempdir()?;
    let outside = dir.path().join("shared");
    fs::create_dir_all(&outside)?;
    let linked_file = outside.join("config.ini");
    fs::write(&linked_file, "x")?;
    set_file_mtime(&linked_file, FileTime::from_unix_time(1_000, 0))?;

    let root = dir.path().join("project");
    fs::create_dir_all(&root)?;
    symlink(&outside, root.join("shared"))?;

    let mut detector = PollingDetector::new(&root, INTERVAL, Reporter::default());
    assert!(detector.poll_once()?);
    assert_eq!(detector.snapshot().len(), 1);

    set_file_mtime(&linked_file, FileTime::from_unix_time(2_000, 0))?;
    assert!(detector.poll_once()?);
    Ok(())
}

#[test]
fn snapshot_diff_lists_paths() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path();
    fs::write(root.join("keep.txt"), "k")?;
    fs::write(root.join("gone.txt"), "g")?;
    fs::write(root.join("edit.txt"), "e")?;
    set_file_mtime(root.join("edit.txt"), FileTime::from_unix_time(1_000, 0))?;
    let before = FolderSnapshot::capture(root)?;

    fs::remove_file(root.join("gone.txt"))?;
    fs::write(root.join("new.txt"), "n")?;
    set_file_mtime(root.join("edit.txt"), FileTime::from_unix_time(2_000, 0))?;
    let after = FolderSnapshot::capture(root)?;

    let diff = after.diff(&before);
    assert_eq!(diff.added, vec![root.join("new.txt")]);
    assert_eq!(diff.removed, vec![root.join("gone.txt")]);
    assert_eq!(diff.modified, vec![root.join("edit.txt")]);
    assert_eq!(diff.len(), 3);
    assert!(after.differs_from(&before));
    assert!(!after.differs_from(&after.clone()));
    Ok(())
}

#[test]
fn polling_session_backs_up_nested_edits() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let source = dir.path().join("project");
    fs::create_dir_all(source.join("src"))?;
    let file = source.join("src/lib.rs");
    fs::write(&file, "one")?;
    set_file_mtime(&file, FileTime::from_unix_time(1_000, 0))?;
    let target = dir.path().join("target");

    let sink = MemorySink::new();
    let mut ctl = WatchController::new(Arc::new(sink.clone()));
    assert!(ctl.start(
        WatchConfigBuilder::new(&source)
            .target(&target)
            .polling(200)
            .build()
    ));

    assert!(wait_until(Duration::from_secs(5), || ctl.completed_passes() == 1));

    fs::write(&file, "two")?;
    set_file_mtime(&file, FileTime::from_unix_time(2_000, 0))?;
    assert!(wait_until(Duration::from_secs(5), || ctl.completed_passes() >= 2));
    ctl.stop();

    let folder = target.join("project Backup");
    assert!(entry_count(&folder) >= 1);
    assert!(sink.count_containing("[poll] change detected") >= 2);
    Ok(())
}

#[test]
fn polling_session_survives_a_vanished_source() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let source = dir.path().join("report.docx");
    fs::write(&source, "v1")?;
    set_file_mtime(&source, FileTime::from_unix_time(1_000, 0))?;
    let target = dir.path().join("target");

    let sink = MemorySink::new();
    let mut ctl = WatchController::new(Arc::new(sink.clone()));
    assert!(ctl.start(
        WatchConfigBuilder::new(&source)
            .target(&target)
            .polling(100)
            .build()
    ));
    assert!(wait_until(Duration::from_secs(5), || ctl.completed_passes() == 1));

    fs::remove_file(&source)?;
    assert!(wait_until(Duration::from_secs(5), || {
        sink.count_containing("[poll] error while checking source") >= 1
    }));
    assert!(ctl.is_watching());

    fs::write(&source, "v2")?;
    set_file_mtime(&source, FileTime::from_unix_time(2_000, 0))?;
    assert!(wait_until(Duration::from_secs(5), || ctl.completed_passes() >= 2));
    assert!(ctl.is_watching());

    ctl.stop();
    assert!(sink.count_containing("[backup ok]") >= 2);
    Ok(())
}
