//! Filesystem tree
//!
//! Enumerates the target root into a snapshot and folds file hashes into
//! directory hashes over the implied directory tree.

pub mod aggregate;
pub mod fingerprint;
pub mod path;
pub mod walker;

pub use aggregate::DirectoryHashAggregator;
pub use walker::{Walker, WalkerConfig};
