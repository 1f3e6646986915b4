//! Single-threaded run coordinator
//!
//! Drives one fingerprinting run: load the prior index, build the trust
//! oracle, enumerate the tree, inherit reusable hashes, hash the rest,
//! aggregate directories, reconcile timestamps and persist. Only the initial
//! root check is fatal; every later phase degrades and the run continues.

use crate::config::FastbuildConfig;
use crate::error::ApiError;
use crate::hashing::{BatchHasher, ContentHasher};
use crate::reconcile::{FallbackRunner, StampStyle, TimestampReconciler, TimestampWriter};
use crate::resolve::IncrementalResolver;
use crate::store::IndexStore;
use crate::tree::{path, DirectoryHashAggregator, Walker};
use crate::vcs::{TreeHashOracle, VcsQuery};
use std::fmt;
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Counts gathered over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub entries: usize,
    pub trusted: usize,
    pub inherited: usize,
    pub hashed: usize,
    pub unhashed: usize,
    pub directory_hashes: usize,
    pub reconciled: usize,
    pub fallback_commands: usize,
    pub persisted: bool,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries: {} inherited, {} hashed, {} unhashed, {} directory hashes, \
             {} reconciled ({} via fallback), index {}",
            self.entries,
            self.inherited,
            self.hashed,
            self.unhashed,
            self.directory_hashes,
            self.reconciled,
            self.fallback_commands,
            if self.persisted { "saved" } else { "NOT saved" }
        )
    }
}

/// Fingerprinting pipeline with injected collaborators
pub struct Pipeline<'a> {
    config: &'a FastbuildConfig,
    vcs: Option<&'a dyn VcsQuery>,
    hasher: &'a dyn BatchHasher,
    writer: &'a dyn TimestampWriter,
    runner: &'a dyn FallbackRunner,
    style: StampStyle,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a FastbuildConfig,
        hasher: &'a dyn BatchHasher,
        writer: &'a dyn TimestampWriter,
        runner: &'a dyn FallbackRunner,
    ) -> Self {
        Self {
            config,
            vcs: None,
            hasher,
            writer,
            runner,
            style: StampStyle::native(),
        }
    }

    /// Query `vcs` for the trust oracle (ignored when `vcs.enabled` is false).
    pub fn with_vcs(mut self, vcs: &'a dyn VcsQuery) -> Self {
        self.vcs = Some(vcs);
        self
    }

    pub fn with_stamp_style(mut self, style: StampStyle) -> Self {
        self.style = style;
        self
    }

    /// Run every phase for `root`, persisting into `cache_dir`
    #[instrument(skip_all, fields(root = %root.display(), cache_dir = %cache_dir.display()))]
    pub fn run(&self, root: &Path, cache_dir: &Path) -> Result<RunReport, ApiError> {
        let start = Instant::now();
        let root = match path::canonicalize_root(root) {
            Ok(root) if root.is_dir() => root,
            _ => return Err(ApiError::InvalidRoot(root.to_path_buf())),
        };
        info!("Fingerprinting run started");

        let store = IndexStore::new(cache_dir, &self.config.index.file_name);
        let prior = store.load();

        let oracle = match self.vcs {
            Some(query) if self.config.vcs.enabled => TreeHashOracle::build(query, &root),
            _ => TreeHashOracle::empty(),
        };

        let mut current = Walker::with_config(root.clone(), self.config.walker.clone()).walk();

        let resolution = IncrementalResolver::new(&oracle, &prior).resolve(&mut current);

        let mut hasher = ContentHasher::new(self.hasher)
            .with_batch_limit(self.config.hashing.batch_limit);
        if let Some(workers) = self.config.hashing.workers {
            hasher = hasher.with_workers(workers);
        }
        let (hashed, unhashed) =
            match hasher.hash_pending(&root, &mut current, &resolution.pending) {
                Ok(report) => (report.hashed, report.unhashed),
                Err(e) => {
                    warn!("Content hashing unavailable: {}", e);
                    (0, resolution.pending.len())
                }
            };

        let directory_hashes = DirectoryHashAggregator::new().aggregate(&mut current);

        let reconcile = TimestampReconciler::new(self.writer, self.runner)
            .with_style(self.style)
            .with_fallback_batch(self.config.reconcile.fallback_batch)
            .reconcile(&root, &prior, &mut current);

        let persisted = match store.save(&current) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to persist index: {}", e);
                false
            }
        };

        let report = RunReport {
            entries: current.len(),
            trusted: oracle.len(),
            inherited: resolution.inherited,
            hashed,
            unhashed,
            directory_hashes,
            reconciled: reconcile.reconciled,
            fallback_commands: reconcile.queued,
            persisted,
        };
        info!(
            entries = report.entries,
            inherited = report.inherited,
            hashed = report.hashed,
            persisted = report.persisted,
            duration_ms = start.elapsed().as_millis(),
            "Fingerprinting run finished"
        );
        Ok(report)
    }
}
