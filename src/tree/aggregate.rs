//! Directory hash aggregation
//!
//! Folds file hashes bottom-up into directory hashes. Every directory owns an
//! accumulator starting at zero. Each hashed file child contributes
//! `path_salted(content_hash, file_path)`; each directory child whose own
//! accumulator ended non-zero contributes `path_salted(acc.to_string(), dir_path)`.
//! Contributions combine with XOR, so sibling order is irrelevant and two
//! equal contributions cancel. A directory whose accumulator ends at zero
//! receives no hash at all.

use crate::tree::fingerprint;
use crate::tree::path::parent_key;
use crate::types::Snapshot;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Maps `(value, owning path)` to a scalar contribution.
pub type FingerprintFn = fn(&str, &str) -> i64;

/// Aggregation-neutral value.
pub const NEUTRAL: i64 = 0;

/// Combine two contributions.
pub fn combine(acc: i64, contribution: i64) -> i64 {
    acc ^ contribution
}

/// Bottom-up directory hash aggregator
pub struct DirectoryHashAggregator {
    fingerprint: FingerprintFn,
}

impl Default for DirectoryHashAggregator {
    fn default() -> Self {
        Self {
            fingerprint: fingerprint::path_salted,
        }
    }
}

/// Children of one directory in the implied tree.
#[derive(Default)]
struct Children<'a> {
    files: Vec<&'a str>,
    dirs: Vec<&'a str>,
}

impl DirectoryHashAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different scalar fingerprint (the combine step is fixed).
    pub fn with_fingerprint(fingerprint: FingerprintFn) -> Self {
        Self { fingerprint }
    }

    /// Compute accumulators for every directory of the implied tree
    ///
    /// The root is keyed by the empty string. Directories that only appear as
    /// a parent of some entry are part of the implied tree even when they are
    /// not entries themselves.
    pub fn accumulate(&self, snapshot: &Snapshot) -> HashMap<String, i64> {
        let mut tree: BTreeMap<&str, Children<'_>> = BTreeMap::new();
        tree.insert("", Children::default());
        for entry in snapshot {
            if entry.is_directory {
                tree.entry(entry.path.as_str()).or_default();
            }
            // Register every ancestor so implied directories join the tree.
            let mut dir = parent_key(&entry.path);
            while !tree.contains_key(dir) {
                tree.insert(dir, Children::default());
                dir = parent_key(dir);
            }
        }
        let dirs: Vec<&str> = tree.keys().copied().filter(|d| !d.is_empty()).collect();
        for dir in dirs {
            if let Some(parent) = tree.get_mut(parent_key(dir)) {
                parent.dirs.push(dir);
            }
        }
        for entry in snapshot.iter().filter(|e| !e.is_directory) {
            if let Some(parent) = tree.get_mut(parent_key(&entry.path)) {
                parent.files.push(entry.path.as_str());
            }
        }

        let mut acc: HashMap<String, i64> = HashMap::with_capacity(tree.len());

        // Iterative post-order: a directory is finalized only after every
        // subdirectory below it has been finalized.
        let mut stack: Vec<(&str, bool)> = vec![("", false)];
        while let Some((dir, expanded)) = stack.pop() {
            let Some(children) = tree.get(dir) else {
                continue;
            };
            if !expanded {
                stack.push((dir, true));
                for sub in &children.dirs {
                    stack.push((*sub, false));
                }
                continue;
            }

            let mut value = NEUTRAL;
            for file in &children.files {
                if let Some(hash) = snapshot.get(file).and_then(|e| e.content_hash.as_deref()) {
                    value = combine(value, (self.fingerprint)(hash, file));
                }
            }
            for sub in &children.dirs {
                let sub_value = acc.get(*sub).copied().unwrap_or(NEUTRAL);
                if sub_value != NEUTRAL {
                    value = combine(value, (self.fingerprint)(&sub_value.to_string(), sub));
                }
            }
            acc.insert(dir.to_string(), value);
        }

        acc
    }

    /// Assign directory hashes in place
    ///
    /// Returns the number of directories that received a hash. Any hash a
    /// directory entry carried before is discarded first.
    #[instrument(skip_all, fields(entries = snapshot.len()))]
    pub fn aggregate(&self, snapshot: &mut Snapshot) -> usize {
        let start = Instant::now();
        let acc = self.accumulate(snapshot);

        let mut hashed = 0;
        for entry in snapshot.iter_mut().filter(|e| e.is_directory) {
            entry.content_hash = match acc.get(&entry.path) {
                Some(&value) if value != NEUTRAL => {
                    hashed += 1;
                    Some(value.to_string())
                }
                _ => None,
            };
        }

        debug!(
            root = acc.get("").copied().unwrap_or(NEUTRAL),
            "Root accumulator"
        );
        info!(
            directories = acc.len(),
            hashed,
            duration_ms = start.elapsed().as_millis(),
            "Directory aggregation completed"
        );
        hashed
    }
}
