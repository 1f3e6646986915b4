//! Merge rules: defaults, override order, conflict handling.

use crate::hashing::DEFAULT_BATCH_LIMIT;
use crate::reconcile::DEFAULT_FALLBACK_BATCH;
use crate::store::DEFAULT_INDEX_FILE;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones key by key; lists replace lists
/// rather than appending.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("walker.exclude", vec![".xcodeproj", ".xcworkspace"])?
        .set_default("walker.skip_hidden", true)?
        .set_default("hashing.batch_limit", DEFAULT_BATCH_LIMIT as i64)?
        .set_default("reconcile.fallback_batch", DEFAULT_FALLBACK_BATCH as i64)?
        .set_default("vcs.enabled", true)?
        .set_default("index.file_name", DEFAULT_INDEX_FILE)
}
