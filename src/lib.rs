//! fastbuild: incremental content fingerprinting for build caches
//!
//! Maintains a persisted snapshot of every file and directory under a target
//! root with a content hash and the timestamps a build cache last saw. Files
//! whose version-control object is unchanged inherit their prior hash; the
//! rest are hashed in parallel batches. Directory hashes are folded bottom-up
//! from their children, and content-identical paths whose timestamps drifted
//! get their prior timestamps restored.

pub mod config;
pub mod error;
pub mod hashing;
pub mod logging;
pub mod pipeline;
pub mod reconcile;
pub mod resolve;
pub mod store;
pub mod tree;
pub mod types;
pub mod vcs;

pub use pipeline::{Pipeline, RunReport};
pub use types::{FileEntry, Snapshot};
