//! Incremental hash reuse
//!
//! A file inherits its prior content hash when version control vouches that
//! its object hash is unchanged since that hash was recorded. Everything else
//! is left pending for the content hasher.

use crate::types::{EntryPath, Snapshot};
use crate::vcs::TreeHashOracle;
use tracing::{info, instrument, trace};

/// Outcome of one resolution pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Files that inherited a prior content hash.
    pub inherited: usize,
    /// Files still lacking a content hash, in key order.
    pub pending: Vec<EntryPath>,
}

/// Decides per file whether a prior content hash may be reused
pub struct IncrementalResolver<'a> {
    oracle: &'a TreeHashOracle,
    prior: &'a Snapshot,
}

impl<'a> IncrementalResolver<'a> {
    pub fn new(oracle: &'a TreeHashOracle, prior: &'a Snapshot) -> Self {
        Self { oracle, prior }
    }

    /// Stamp oracle hashes onto `current` and inherit reusable content hashes
    ///
    /// Every entry (directories included) records the oracle's object hash so
    /// the next run can compare against it. Directories are never resolved;
    /// their hash is always recomputed by aggregation.
    #[instrument(skip_all, fields(entries = current.len(), trusted = self.oracle.len()))]
    pub fn resolve(&self, current: &mut Snapshot) -> Resolution {
        let mut resolution = Resolution::default();

        for entry in current.iter_mut() {
            entry.vcs_hash = self.oracle.get(&entry.path).map(str::to_string);
            if entry.is_directory {
                continue;
            }

            let inherited = entry.vcs_hash.as_deref().and_then(|vcs| {
                self.prior
                    .get(&entry.path)
                    .filter(|old| !old.is_directory && old.vcs_hash.as_deref() == Some(vcs))
                    .and_then(|old| old.content_hash.clone())
            });

            match inherited {
                Some(hash) => {
                    trace!(path = %entry.path, "Inherited content hash");
                    entry.content_hash = Some(hash);
                    resolution.inherited += 1;
                }
                None => {
                    entry.content_hash = None;
                    resolution.pending.push(entry.path.clone());
                }
            }
        }

        info!(
            inherited = resolution.inherited,
            pending = resolution.pending.len(),
            "Resolved reusable hashes"
        );
        resolution
    }
}
