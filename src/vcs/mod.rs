//! Version-control trust oracle
//!
//! Maps snapshot keys to version-control object hashes for paths that are
//! tracked and not locally dirty. An unchanged object hash for such a path is
//! the proxy that lets a prior content hash be reused without rehashing.

pub mod git;

pub use git::GitCli;

use crate::error::VcsError;
use crate::tree::path::normalize_for_matching;
use crate::types::EntryPath;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Version-control query seam
///
/// Paths returned by both methods are relative to `root`.
pub trait VcsQuery {
    /// Paths whose working-tree state differs from the last commit.
    fn dirty_paths(&self, root: &Path) -> Result<HashSet<String>, VcsError>;

    /// Tracked path to object hash at the last commit.
    fn tracked_objects(&self, root: &Path) -> Result<HashMap<String, String>, VcsError>;
}

/// Trusted path to object hash mapping
#[derive(Debug, Clone, Default)]
pub struct TreeHashOracle {
    hashes: HashMap<EntryPath, String>,
}

impl TreeHashOracle {
    /// Oracle that trusts nothing, forcing every file to be hashed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Combine a tracked mapping with a dirty set, dropping every dirty path.
    pub fn from_parts(tracked: HashMap<String, String>, dirty: &HashSet<String>) -> Self {
        let dirty: HashSet<String> = dirty.iter().map(|p| normalize_for_matching(p)).collect();
        let hashes = tracked
            .into_iter()
            .map(|(path, hash)| (normalize_for_matching(&path), hash))
            .filter(|(path, _)| !dirty.contains(path))
            .collect();
        Self { hashes }
    }

    /// Query version control for `root`
    ///
    /// Fails open: if either query errors, the oracle is empty.
    #[instrument(skip(query), fields(root = %root.display()))]
    pub fn build(query: &dyn VcsQuery, root: &Path) -> Self {
        let start = Instant::now();
        let dirty = match query.dirty_paths(root) {
            Ok(dirty) => dirty,
            Err(e) => {
                warn!("Version control unavailable, hashing everything: {}", e);
                return Self::empty();
            }
        };
        let tracked = match query.tracked_objects(root) {
            Ok(tracked) => tracked,
            Err(e) => {
                warn!("Version control unavailable, hashing everything: {}", e);
                return Self::empty();
            }
        };

        let tracked_count = tracked.len();
        let oracle = Self::from_parts(tracked, &dirty);
        info!(
            tracked = tracked_count,
            dirty = dirty.len(),
            trusted = oracle.len(),
            duration_ms = start.elapsed().as_millis(),
            "Built trust oracle"
        );
        oracle
    }

    /// Object hash for a snapshot key, compared in NFC form.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.hashes
            .get(path)
            .or_else(|| self.hashes.get(&normalize_for_matching(path)))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
