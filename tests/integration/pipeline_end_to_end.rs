//! End-to-end runs over real scratch trees

use crate::integration::test_utils::{
    run_once, BrokenVcs, CountingHasher, FakeVcs, RecordingRunner, RecordingWriter, Workspace,
};
use fastbuild::config::FastbuildConfig;
use fastbuild::error::ApiError;
use fastbuild::hashing::LocalHasher;
use fastbuild::store::IndexStore;
use fastbuild::tree::aggregate::combine;
use fastbuild::tree::fingerprint::path_salted;
use fastbuild::Pipeline;
use std::fs;

#[test]
fn test_first_run_hashes_files_and_aggregates_directories() {
    let ws = Workspace::new();
    ws.write("d/A", "alpha");
    ws.write("d/B", "beta");
    let hasher = CountingHasher::default();

    let report = run_once(&ws, &FakeVcs::default(), &hasher);

    assert_eq!(report.entries, 3);
    assert_eq!(report.hashed, 2);
    assert_eq!(report.inherited, 0);
    assert_eq!(report.directory_hashes, 1);
    assert!(report.persisted);
    assert_eq!(hasher.files(), 2);

    let snapshot = IndexStore::in_cache_dir(&ws.cache).try_load().unwrap();
    let h1 = LocalHasher::hash_file(&ws.root.join("d").join("A")).unwrap();
    let h2 = LocalHasher::hash_file(&ws.root.join("d").join("B")).unwrap();
    assert_eq!(snapshot.get("d/A").unwrap().content_hash.as_deref(), Some(h1.as_str()));

    let expected = combine(path_salted(&h1, "d/A"), path_salted(&h2, "d/B"));
    assert_eq!(
        snapshot.get("d").unwrap().content_hash,
        Some(expected.to_string())
    );
}

#[test]
fn test_hidden_and_excluded_entries_never_reach_the_index() {
    let ws = Workspace::new();
    ws.write("main.c", "int main;");
    ws.write(".hidden/secret", "x");
    ws.write("App.xcodeproj/project.pbxproj", "y");

    run_once(&ws, &FakeVcs::default(), &CountingHasher::default());

    let snapshot = IndexStore::in_cache_dir(&ws.cache).try_load().unwrap();
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.contains("main.c"));
}

#[cfg(unix)]
#[test]
fn test_unusual_file_names_are_hashed_under_their_own_names() {
    let ws = Workspace::new();
    let decomposed = "cafe\u{0301}.txt";
    ws.write(decomposed, "accent");
    ws.write("a\\b.txt", "backslash");
    ws.write("a/b.txt", "nested");
    let hasher = CountingHasher::default();

    let report = run_once(&ws, &FakeVcs::default(), &hasher);

    assert_eq!(report.entries, 4);
    assert_eq!(report.hashed, 3);
    assert_eq!(report.unhashed, 0);
    let snapshot = IndexStore::in_cache_dir(&ws.cache).try_load().unwrap();
    assert_eq!(
        snapshot.get(decomposed).unwrap().content_hash,
        Some(LocalHasher::hash_file(&ws.root.join(decomposed)).unwrap())
    );
    assert_eq!(
        snapshot.get("a\\b.txt").unwrap().content_hash,
        Some(LocalHasher::hash_file(&ws.root.join("a\\b.txt")).unwrap())
    );
    assert_ne!(
        snapshot.get("a\\b.txt").unwrap().content_hash,
        snapshot.get("a/b.txt").unwrap().content_hash
    );
    assert!(snapshot.get("a").unwrap().is_directory);
}

#[test]
fn test_dirty_file_is_rehashed_while_clean_files_inherit() {
    let ws = Workspace::new();
    ws.write("a.txt", "one");
    ws.write("b.txt", "two");
    let vcs = FakeVcs::tracking(&["a.txt", "b.txt"]);
    run_once(&ws, &vcs, &CountingHasher::default());

    ws.write("b.txt", "two, edited");
    let hasher = CountingHasher::default();
    let vcs = FakeVcs::tracking(&["a.txt", "b.txt"]).with_dirty("b.txt");
    let report = run_once(&ws, &vcs, &hasher);

    assert_eq!(report.inherited, 1);
    assert_eq!(report.hashed, 1);
    assert_eq!(hasher.files(), 1);

    let snapshot = IndexStore::in_cache_dir(&ws.cache).try_load().unwrap();
    let fresh = LocalHasher::hash_file(&ws.root.join("b.txt")).unwrap();
    assert_eq!(snapshot.get("b.txt").unwrap().content_hash, Some(fresh));
    assert!(snapshot.get("b.txt").unwrap().vcs_hash.is_none());
}

#[test]
fn test_unavailable_vcs_hashes_everything_again() {
    let ws = Workspace::new();
    ws.write("a.txt", "one");
    ws.write("sub/b.txt", "two");
    run_once(&ws, &BrokenVcs, &CountingHasher::default());

    let hasher = CountingHasher::default();
    let report = run_once(&ws, &BrokenVcs, &hasher);

    assert_eq!(report.trusted, 0);
    assert_eq!(report.inherited, 0);
    assert_eq!(hasher.files(), 2);
}

#[test]
fn test_disabled_vcs_is_never_queried() {
    let ws = Workspace::new();
    ws.write("a.txt", "one");
    let mut config = FastbuildConfig::default();
    config.vcs.enabled = false;
    let writer = RecordingWriter::default();
    let runner = RecordingRunner::default();
    let vcs = FakeVcs::tracking(&["a.txt"]);

    let report = Pipeline::new(&config, &LocalHasher, &writer, &runner)
        .with_vcs(&vcs)
        .run(&ws.root, &ws.cache)
        .unwrap();

    assert_eq!(report.trusted, 0);
    assert_eq!(report.hashed, 1);
}

#[test]
fn test_small_batch_limit_splits_work() {
    let ws = Workspace::new();
    for i in 0..7 {
        ws.write(&format!("f{}.txt", i), &format!("content {}", i));
    }
    let mut config = FastbuildConfig::default();
    config.hashing.batch_limit = 2;
    config.hashing.workers = Some(2);
    let hasher = CountingHasher::default();
    let writer = RecordingWriter::default();
    let runner = RecordingRunner::default();

    let report = Pipeline::new(&config, &hasher, &writer, &runner)
        .run(&ws.root, &ws.cache)
        .unwrap();

    assert_eq!(report.hashed, 7);
    assert_eq!(hasher.batches(), 4);
}

#[test]
fn test_persistence_failure_is_not_fatal() {
    let ws = Workspace::new();
    ws.write("a.txt", "one");
    // A regular file where the cache directory should be.
    fs::write(&ws.cache, "not a directory").unwrap();

    let report = run_once(&ws, &FakeVcs::default(), &CountingHasher::default());

    assert!(!report.persisted);
    assert_eq!(report.hashed, 1);
}

#[test]
fn test_missing_root_is_rejected_before_any_work() {
    let ws = Workspace::new();
    let config = FastbuildConfig::default();
    let hasher = CountingHasher::default();
    let writer = RecordingWriter::default();
    let runner = RecordingRunner::default();

    let result = Pipeline::new(&config, &hasher, &writer, &runner)
        .run(&ws.root.join("missing"), &ws.cache);

    assert!(matches!(result, Err(ApiError::InvalidRoot(_))));
    assert_eq!(hasher.files(), 0);
    assert!(!ws.index_path().exists());
}
