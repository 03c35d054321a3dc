use std::error::Error;
use std::fs;
use std::sync::Arc;

use tempfile::tempdir;

use watchbackup::engine::{FileSink, LogSink, MemorySink, MultiSink, Reporter};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn file_sink_appends_timestamped_lines() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("backup.log");
    let sink = FileSink::new(&path);

    sink.log("[backup ok] a -> b");
    sink.log("[cleanup] removed old backup: c");

    let contents = fs::read_to_string(&path)?;
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in &lines {
        // "[YYYY-MM-DD HH:MM:SS] "
        assert_eq!(line.as_bytes()[0], b'[');
        assert_eq!(&line[20..22], "] ");
    }
    assert!(lines[0].ends_with("[backup ok] a -> b"));
    assert!(lines[1].ends_with("[cleanup] removed old backup: c"));
    Ok(())
}

#[test]
fn file_sink_survives_an_unwritable_path() -> TestResult {
    let dir = tempdir()?;
    let sink = FileSink::new(dir.path().join("missing/dir/backup.log"));
    sink.log("dropped");
    assert!(!dir.path().join("missing").exists());
    Ok(())
}

#[test]
fn multi_sink_fans_out_in_order() {
    let first = MemorySink::new();
    let second = MemorySink::new();
    let mut multi = MultiSink::new(vec![Arc::new(first.clone())]);
    multi.push(Arc::new(second.clone()));

    let reporter = Reporter::new(Arc::new(multi));
    reporter.info("one");
    reporter.warn("two");
    reporter.error("three");

    let expected = vec!["one".to_string(), "two".to_string(), "three".to_string()];
    assert_eq!(first.lines(), expected);
    assert_eq!(second.lines(), expected);
}

#[test]
fn memory_sink_counts_matching_lines() {
    let sink = MemorySink::new();
    let reporter = Reporter::new(Arc::new(sink.clone()));
    reporter.info("[backup ok] x");
    reporter.info("[backup ok] y");
    reporter.error("[error] z");

    assert_eq!(sink.count_containing("[backup ok]"), 2);
    assert_eq!(sink.count_containing("[error]"), 1);
    assert_eq!(sink.count_containing("missing"), 0);
}
