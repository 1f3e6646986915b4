//! Timestamp reconciliation
//!
//! When a path's content hash is unchanged since the prior run but its
//! timestamps moved (checkout, merge, rebase), the prior timestamps are
//! written back so mtime-gated build caches keep treating it as clean.
//! Direct mutation is tried first; denied paths are queued as shell
//! commands and flushed in chunks once every entry has been evaluated.

pub mod stamp;

pub use stamp::{
    DirectStamp, FallbackRunner, PendingStamp, ShellRunner, StampStyle, TimestampWriter,
};

use crate::tree::path;
use crate::types::Snapshot;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Default number of fallback commands per shell invocation.
pub const DEFAULT_FALLBACK_BATCH: usize = 1000;

/// Statistics for one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Entries whose recorded timestamps were restored to the prior values.
    pub reconciled: usize,
    /// Restorations applied through direct metadata mutation.
    pub direct: usize,
    /// Restorations that fell back to queued shell commands.
    pub queued: usize,
    /// Fallback command chunks that failed.
    pub failed_batches: usize,
}

/// Restores timestamps for content-identical paths
pub struct TimestampReconciler<'a> {
    writer: &'a dyn TimestampWriter,
    runner: &'a dyn FallbackRunner,
    style: StampStyle,
    fallback_batch: usize,
}

impl<'a> TimestampReconciler<'a> {
    pub fn new(writer: &'a dyn TimestampWriter, runner: &'a dyn FallbackRunner) -> Self {
        Self {
            writer,
            runner,
            style: StampStyle::native(),
            fallback_batch: DEFAULT_FALLBACK_BATCH,
        }
    }

    pub fn with_style(mut self, style: StampStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_fallback_batch(mut self, size: usize) -> Self {
        self.fallback_batch = size.max(1);
        self
    }

    /// Compare `prior` with `current` and restore drifted timestamps
    ///
    /// `current` is updated to the prior modification time for every
    /// reconciled entry, even when the on-disk restoration later fails, so
    /// the persisted index records the timestamps the build cache expects.
    /// The prior creation time is recorded only where it can be written
    /// back; elsewhere the on-disk creation time is kept.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn reconcile(
        &self,
        root: &Path,
        prior: &Snapshot,
        current: &mut Snapshot,
    ) -> ReconcileReport {
        let start = Instant::now();
        let mut report = ReconcileReport::default();
        let mut queued: Vec<PendingStamp> = Vec::new();

        // Creation time only takes part when the primary writer can restore it;
        // otherwise a rewritten file would drift again on every run.
        let compare_created = self.writer.restores_created();

        for old in prior {
            let Some(new) = current.get_mut(&old.path) else {
                continue;
            };
            let same_content = match (&old.content_hash, &new.content_hash) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };
            let drifted =
                old.modified != new.modified || (compare_created && old.created != new.created);
            if !same_content || !drifted {
                continue;
            }

            let target = path::absolute(root, &old.path);
            let restore = self.writer.set_times(&target, old.created, old.modified);
            let created_restored = match restore {
                Ok(()) => {
                    debug!(path = %old.path, modified = old.modified, "Restored timestamps");
                    report.direct += 1;
                    compare_created
                }
                Err(e) => {
                    debug!(path = %old.path, "Direct restore failed, queueing fallback: {}", e);
                    queued.push(PendingStamp {
                        path: target,
                        created: old.created,
                        modified: old.modified,
                    });
                    self.style.restores_created()
                }
            };
            if created_restored {
                new.created = old.created;
            }
            new.modified = old.modified;
            report.reconciled += 1;
        }

        report.queued = queued.len();
        report.failed_batches = self.flush(&queued);

        info!(
            reconciled = report.reconciled,
            direct = report.direct,
            queued = report.queued,
            failed_batches = report.failed_batches,
            duration_ms = start.elapsed().as_millis(),
            "Timestamp reconciliation completed"
        );
        report
    }

    /// Run queued fallbacks in chunks; returns the number of failed chunks.
    fn flush(&self, queued: &[PendingStamp]) -> usize {
        let commands: Vec<String> = queued
            .iter()
            .flat_map(|stamp| self.style.commands(stamp))
            .collect();

        let mut failed = 0;
        for chunk in commands.chunks(self.fallback_batch) {
            if let Err(e) = self.runner.run(chunk) {
                warn!(commands = chunk.len(), "Fallback timestamp batch failed: {}", e);
                failed += 1;
            }
        }
        failed
    }
}
