//! Concurrent content hashing
//!
//! Pending files are split into batches and handed to a fixed-size worker
//! pool with one worker per hardware thread. Each batch returns its own
//! `(path, hash)` pairs, so workers never share a writable map; results are
//! merged into the snapshot only after the pool has drained.

pub mod batch;
pub mod command;
pub mod local;

pub use batch::{available_workers, batch_size, plan_batches, DEFAULT_BATCH_LIMIT};
pub use command::CommandHasher;
pub use local::LocalHasher;

use crate::error::HashError;
use crate::types::{EntryPath, Snapshot};
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Computes one checksum per file for a batch of snapshot keys
///
/// Implementations must use the same algorithm on every run; switching it
/// invalidates every inherited hash. Files that cannot be read are simply
/// omitted from the result.
pub trait BatchHasher: Send + Sync {
    fn hash_batch(
        &self,
        root: &Path,
        batch: &[EntryPath],
    ) -> Result<Vec<(EntryPath, String)>, HashError>;
}

/// Statistics for one hashing phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashReport {
    pub batches: usize,
    pub failed_batches: usize,
    pub hashed: usize,
    pub unhashed: usize,
}

/// Batched, parallel content hasher
pub struct ContentHasher<'a> {
    hasher: &'a dyn BatchHasher,
    workers: usize,
    batch_limit: usize,
}

impl<'a> ContentHasher<'a> {
    pub fn new(hasher: &'a dyn BatchHasher) -> Self {
        Self {
            hasher,
            workers: available_workers(),
            batch_limit: DEFAULT_BATCH_LIMIT,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit.max(1);
        self
    }

    /// Hash every pending file and write the results into `snapshot`
    ///
    /// Blocks until every batch has finished. A failed batch leaves its files
    /// unhashed and does not affect other batches; nothing is retried.
    #[instrument(skip_all, fields(pending = pending.len(), workers = self.workers))]
    pub fn hash_pending(
        &self,
        root: &Path,
        snapshot: &mut Snapshot,
        pending: &[EntryPath],
    ) -> Result<HashReport, HashError> {
        let start = Instant::now();
        let batches = plan_batches(pending, self.workers, self.batch_limit);
        let mut report = HashReport {
            batches: batches.len(),
            ..HashReport::default()
        };
        if batches.is_empty() {
            return Ok(report);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("fastbuild-hash-{}", i))
            .build()
            .map_err(|e| HashError::Pool(e.to_string()))?;

        let results: Vec<Result<Vec<(EntryPath, String)>, HashError>> = pool.install(|| {
            batches
                .par_iter()
                .map(|batch| {
                    debug!(size = batch.len(), "Hashing batch");
                    self.hasher.hash_batch(root, batch)
                })
                .collect()
        });

        for result in results {
            match result {
                Ok(hashes) => {
                    for (key, hash) in hashes {
                        if let Some(entry) = snapshot.get_mut(&key) {
                            if !entry.is_directory && entry.content_hash.is_none() {
                                entry.content_hash = Some(hash);
                                report.hashed += 1;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("Hash batch failed, leaving its files unhashed: {}", e);
                    report.failed_batches += 1;
                }
            }
        }
        report.unhashed = pending.len().saturating_sub(report.hashed);

        info!(
            batches = report.batches,
            hashed = report.hashed,
            unhashed = report.unhashed,
            failed_batches = report.failed_batches,
            duration_ms = start.elapsed().as_millis(),
            "Content hashing completed"
        );
        Ok(report)
    }
}
