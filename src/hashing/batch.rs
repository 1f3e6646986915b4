//! Batch planning for the hashing worker pool

use crate::types::EntryPath;

/// Default ceiling on files per batch.
pub const DEFAULT_BATCH_LIMIT: usize = 2000;

/// Number of hardware threads, never less than one.
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(1)
}

/// `min(ceil(total / workers), limit)`, never less than one.
pub fn batch_size(total: usize, workers: usize, limit: usize) -> usize {
    let workers = workers.max(1);
    total.div_ceil(workers).min(limit.max(1)).max(1)
}

/// Split `pending` into batches sized by [`batch_size`].
pub fn plan_batches(pending: &[EntryPath], workers: usize, limit: usize) -> Vec<Vec<EntryPath>> {
    if pending.is_empty() {
        return Vec::new();
    }
    let size = batch_size(pending.len(), workers, limit);
    pending.chunks(size).map(|c| c.to_vec()).collect()
}
