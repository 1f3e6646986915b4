//! Shared test utilities for integration tests
//!
//! Recording collaborators for the pipeline seams plus environment isolation
//! for configuration tests.

use fastbuild::config::FastbuildConfig;
use fastbuild::error::{HashError, StampError, VcsError};
use fastbuild::hashing::{BatchHasher, LocalHasher};
use fastbuild::reconcile::{FallbackRunner, TimestampWriter};
use fastbuild::types::{EntryPath, EpochSeconds};
use fastbuild::vcs::VcsQuery;
use fastbuild::{Pipeline, RunReport};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Version control double with a fixed answer.
#[derive(Default)]
pub struct FakeVcs {
    pub tracked: HashMap<String, String>,
    pub dirty: HashSet<String>,
}

impl FakeVcs {
    /// Trust every listed path with a fixed object hash derived from its name.
    pub fn tracking(paths: &[&str]) -> Self {
        Self {
            tracked: paths
                .iter()
                .map(|p| (p.to_string(), format!("obj-{}", p)))
                .collect(),
            dirty: HashSet::new(),
        }
    }

    pub fn with_dirty(mut self, path: &str) -> Self {
        self.dirty.insert(path.to_string());
        self
    }
}

impl VcsQuery for FakeVcs {
    fn dirty_paths(&self, _root: &Path) -> Result<HashSet<String>, VcsError> {
        Ok(self.dirty.clone())
    }

    fn tracked_objects(&self, _root: &Path) -> Result<HashMap<String, String>, VcsError> {
        Ok(self.tracked.clone())
    }
}

/// Version control double that is never available.
pub struct BrokenVcs;

impl VcsQuery for BrokenVcs {
    fn dirty_paths(&self, _root: &Path) -> Result<HashSet<String>, VcsError> {
        Err(VcsError::Parse("not a repository".to_string()))
    }

    fn tracked_objects(&self, _root: &Path) -> Result<HashMap<String, String>, VcsError> {
        Err(VcsError::Parse("not a repository".to_string()))
    }
}

/// BLAKE3 hasher that counts how much work it was given.
#[derive(Default)]
pub struct CountingHasher {
    pub batches: AtomicUsize,
    pub files: AtomicUsize,
}

impl CountingHasher {
    pub fn files(&self) -> usize {
        self.files.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

impl BatchHasher for CountingHasher {
    fn hash_batch(
        &self,
        root: &Path,
        batch: &[EntryPath],
    ) -> Result<Vec<(EntryPath, String)>, HashError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.files.fetch_add(batch.len(), Ordering::SeqCst);
        LocalHasher.hash_batch(root, batch)
    }
}

/// Timestamp writer that records requests and never touches the disk.
#[derive(Default)]
pub struct RecordingWriter {
    pub calls: Mutex<Vec<(PathBuf, EpochSeconds, EpochSeconds)>>,
}

impl RecordingWriter {
    pub fn calls(&self) -> Vec<(PathBuf, EpochSeconds, EpochSeconds)> {
        self.calls.lock().unwrap().clone()
    }
}

impl TimestampWriter for RecordingWriter {
    fn set_times(
        &self,
        path: &Path,
        created: EpochSeconds,
        modified: EpochSeconds,
    ) -> Result<(), StampError> {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_path_buf(), created, modified));
        Ok(())
    }
}

/// Fallback runner that records chunks and never spawns a shell.
#[derive(Default)]
pub struct RecordingRunner {
    pub chunks: Mutex<Vec<Vec<String>>>,
}

impl FallbackRunner for RecordingRunner {
    fn run(&self, commands: &[String]) -> Result<(), StampError> {
        self.chunks.lock().unwrap().push(commands.to_vec());
        Ok(())
    }
}

/// Scratch target root and cache directory, kept apart.
pub struct Workspace {
    _temp: TempDir,
    pub root: PathBuf,
    pub cache: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let base = dunce::canonicalize(temp.path()).unwrap();
        let root = base.join("src");
        let cache = base.join("cache");
        fs::create_dir_all(&root).unwrap();
        Self {
            _temp: temp,
            root,
            cache,
        }
    }

    /// Write `content` at root-relative `key`, creating parents.
    pub fn write(&self, key: &str, content: &str) {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn index_path(&self) -> PathBuf {
        self.cache.join("fastbuild-index.json")
    }
}

/// Run the pipeline once with recording timestamp collaborators.
pub fn run_once(ws: &Workspace, vcs: &dyn VcsQuery, hasher: &dyn BatchHasher) -> RunReport {
    let config = FastbuildConfig::default();
    let writer = RecordingWriter::default();
    let runner = RecordingRunner::default();
    Pipeline::new(&config, hasher, &writer, &runner)
        .with_vcs(vcs)
        .run(&ws.root, &ws.cache)
        .unwrap()
}

/// Run `f` with `XDG_CONFIG_HOME`/`HOME` pointed into `test_dir` and the
/// given extra variables set, restoring everything afterwards.
pub fn with_env<F, R>(test_dir: &TempDir, vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

    let mut keys: Vec<&str> = vec!["HOME", "XDG_CONFIG_HOME"];
    keys.extend(vars.iter().map(|(k, _)| *k));
    let saved: Vec<(&str, Option<String>)> =
        keys.iter().map(|k| (*k, std::env::var(k).ok())).collect();

    let test_home = test_dir.path().join("home");
    let test_config_home = test_dir.path().join("config");
    fs::create_dir_all(&test_home).unwrap();
    fs::create_dir_all(&test_config_home).unwrap();
    std::env::set_var("HOME", &test_home);
    std::env::set_var("XDG_CONFIG_HOME", &test_config_home);
    for (key, value) in vars {
        std::env::set_var(key, value);
    }

    let result = f();

    for (key, value) in saved {
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }

    result
}
