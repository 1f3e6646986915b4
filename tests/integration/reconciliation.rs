//! Timestamp restoration for content-identical paths

use crate::integration::test_utils::{
    run_once, CountingHasher, FakeVcs, RecordingRunner, RecordingWriter, Workspace,
};
use fastbuild::config::FastbuildConfig;
use fastbuild::error::StampError;
use fastbuild::reconcile::{DirectStamp, ShellRunner, StampStyle, TimestampWriter};
use fastbuild::store::IndexStore;
use fastbuild::types::{epoch_seconds, system_time, EpochSeconds};
use fastbuild::Pipeline;
use std::fs::{self, File};
use std::path::Path;

const ORIGINAL: EpochSeconds = 1_600_000_000;
const TOUCHED: EpochSeconds = 1_700_000_000;

fn set_mtime(path: &Path, seconds: EpochSeconds) {
    File::open(path)
        .unwrap()
        .set_modified(system_time(seconds))
        .unwrap();
}

fn mtime(path: &Path) -> EpochSeconds {
    epoch_seconds(fs::metadata(path).unwrap().modified().unwrap())
}

/// Writer that is always denied, forcing the shell fallback.
struct DenyingWriter;

impl TimestampWriter for DenyingWriter {
    fn set_times(
        &self,
        path: &Path,
        _created: EpochSeconds,
        _modified: EpochSeconds,
    ) -> Result<(), StampError> {
        Err(StampError::Direct {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        })
    }
}

#[test]
fn test_touched_but_unchanged_file_gets_prior_mtime_back() {
    let ws = Workspace::new();
    ws.write("a.txt", "stable");
    let file = ws.root.join("a.txt");
    set_mtime(&file, ORIGINAL);
    let vcs = FakeVcs::tracking(&["a.txt"]);
    run_once(&ws, &vcs, &CountingHasher::default());

    set_mtime(&file, TOUCHED);
    let config = FastbuildConfig::default();
    let hasher = CountingHasher::default();
    let runner = ShellRunner::default();
    let report = Pipeline::new(&config, &hasher, &DirectStamp, &runner)
        .with_vcs(&vcs)
        .run(&ws.root, &ws.cache)
        .unwrap();

    assert_eq!(report.reconciled, 1);
    assert_eq!(report.fallback_commands, 0);
    assert_eq!(mtime(&file), ORIGINAL);
    let snapshot = IndexStore::in_cache_dir(&ws.cache).try_load().unwrap();
    assert_eq!(snapshot.get("a.txt").unwrap().modified, ORIGINAL);
}

#[test]
fn test_recreated_file_settles_after_one_restore() {
    let ws = Workspace::new();
    ws.write("a.txt", "same bytes");
    let file = ws.root.join("a.txt");
    set_mtime(&file, ORIGINAL);
    let vcs = FakeVcs::tracking(&["a.txt"]);
    run_once(&ws, &vcs, &CountingHasher::default());

    // A checkout replaces the file: new inode, new creation time, same content.
    fs::remove_file(&file).unwrap();
    ws.write("a.txt", "same bytes");

    let config = FastbuildConfig::default();
    let hasher = CountingHasher::default();
    let runner = ShellRunner::default();
    let reconciled: Vec<usize> = (0..3)
        .map(|_| {
            Pipeline::new(&config, &hasher, &DirectStamp, &runner)
                .with_vcs(&vcs)
                .run(&ws.root, &ws.cache)
                .unwrap()
                .reconciled
        })
        .collect();

    assert_eq!(reconciled, vec![1, 0, 0]);
    assert_eq!(mtime(&file), ORIGINAL);
}

#[test]
fn test_changed_content_keeps_new_timestamps() {
    let ws = Workspace::new();
    ws.write("a.txt", "before");
    let file = ws.root.join("a.txt");
    set_mtime(&file, ORIGINAL);
    run_once(&ws, &FakeVcs::default(), &CountingHasher::default());

    ws.write("a.txt", "after");
    set_mtime(&file, TOUCHED);
    let writer = RecordingWriter::default();
    let runner = RecordingRunner::default();
    let config = FastbuildConfig::default();
    let report = Pipeline::new(&config, &CountingHasher::default(), &writer, &runner)
        .run(&ws.root, &ws.cache)
        .unwrap();

    assert_eq!(report.reconciled, 0);
    assert!(writer.calls().is_empty());
    let snapshot = IndexStore::in_cache_dir(&ws.cache).try_load().unwrap();
    assert_eq!(snapshot.get("a.txt").unwrap().modified, TOUCHED);
}

#[test]
fn test_directory_with_unchanged_aggregate_is_reconciled() {
    let ws = Workspace::new();
    ws.write("dir/kept.txt", "kept");
    let dir = ws.root.join("dir");
    set_mtime(&dir, ORIGINAL);
    let vcs = FakeVcs::tracking(&["dir/kept.txt"]);
    run_once(&ws, &vcs, &CountingHasher::default());

    // Add and remove a sibling: the directory mtime moves, its content does not.
    ws.write("dir/temp.txt", "temp");
    fs::remove_file(dir.join("temp.txt")).unwrap();
    set_mtime(&dir, TOUCHED);

    let writer = RecordingWriter::default();
    let runner = RecordingRunner::default();
    let config = FastbuildConfig::default();
    let report = Pipeline::new(&config, &CountingHasher::default(), &writer, &runner)
        .with_vcs(&vcs)
        .run(&ws.root, &ws.cache)
        .unwrap();

    assert_eq!(report.reconciled, 1);
    let calls = writer.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, dir);
    assert_eq!(calls[0].2, ORIGINAL);
}

#[test]
fn test_denied_restoration_falls_back_to_batched_commands() {
    let ws = Workspace::new();
    for name in ["a.txt", "b.txt", "c.txt"] {
        ws.write(name, name);
        set_mtime(&ws.root.join(name), ORIGINAL);
    }
    let vcs = FakeVcs::tracking(&["a.txt", "b.txt", "c.txt"]);
    run_once(&ws, &vcs, &CountingHasher::default());
    for name in ["a.txt", "b.txt", "c.txt"] {
        set_mtime(&ws.root.join(name), TOUCHED);
    }

    let mut config = FastbuildConfig::default();
    config.reconcile.fallback_batch = 2;
    let runner = RecordingRunner::default();
    let report = Pipeline::new(&config, &CountingHasher::default(), &DenyingWriter, &runner)
        .with_vcs(&vcs)
        .with_stamp_style(StampStyle::Touch)
        .run(&ws.root, &ws.cache)
        .unwrap();

    assert_eq!(report.reconciled, 3);
    assert_eq!(report.fallback_commands, 3);
    let chunks = runner.chunks.lock().unwrap().clone();
    assert_eq!(chunks.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 1]);
    let first = ws.root.join("a.txt");
    assert_eq!(
        chunks[0][0],
        format!("touch -m -d @{} '{}'", ORIGINAL, first.display())
    );

    // The index already records the restored timestamps.
    let snapshot = IndexStore::in_cache_dir(&ws.cache).try_load().unwrap();
    assert!(snapshot.iter().all(|e| e.modified == ORIGINAL));
}
