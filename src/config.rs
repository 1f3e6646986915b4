//! Configuration System
//!
//! Layered runtime configuration. The CLI surface is fixed at two positional
//! arguments, so every tunable lives here: built-in defaults, an optional
//! global file, an optional `fastbuild.toml` in the cache directory, and
//! `FASTBUILD__*` environment variables.

use crate::error::ConfigError;
use crate::hashing::DEFAULT_BATCH_LIMIT;
use crate::logging::LoggingConfig;
use crate::reconcile::DEFAULT_FALLBACK_BATCH;
use crate::store::DEFAULT_INDEX_FILE;
use crate::tree::WalkerConfig;
use serde::{Deserialize, Serialize};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::cache_file::{cache_config_path, CACHE_CONFIG_FILE};
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FastbuildConfig {
    #[serde(default)]
    pub walker: WalkerConfig,

    #[serde(default)]
    pub hashing: HashingConfig,

    #[serde(default)]
    pub reconcile: ReconcileConfig,

    #[serde(default)]
    pub vcs: VcsConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Content hashing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashingConfig {
    /// Upper bound on files per batch
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,

    /// Worker count override (defaults to hardware threads)
    #[serde(default)]
    pub workers: Option<usize>,

    /// External checksum program and leading arguments; in-process BLAKE3 when unset
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

fn default_batch_limit() -> usize {
    DEFAULT_BATCH_LIMIT
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            batch_limit: default_batch_limit(),
            workers: None,
            command: None,
        }
    }
}

/// Timestamp reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Fallback shell commands per invocation
    #[serde(default = "default_fallback_batch")]
    pub fallback_batch: usize,
}

fn default_fallback_batch() -> usize {
    DEFAULT_FALLBACK_BATCH
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            fallback_batch: default_fallback_batch(),
        }
    }
}

/// Version-control settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcsConfig {
    /// Query git for the trust oracle
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for VcsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Index file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Index file name inside the cache directory
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

fn default_file_name() -> String {
    DEFAULT_INDEX_FILE.to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
        }
    }
}

impl FastbuildConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.hashing.batch_limit == 0 {
            errors.push("hashing.batch_limit must be at least 1".to_string());
        }
        if self.hashing.workers == Some(0) {
            errors.push("hashing.workers must be at least 1".to_string());
        }
        if let Some(command) = &self.hashing.command {
            if command.first().map_or(true, |p| p.trim().is_empty()) {
                errors.push("hashing.command must name a program".to_string());
            }
        }
        if self.reconcile.fallback_batch == 0 {
            errors.push("reconcile.fallback_batch must be at least 1".to_string());
        }
        let file_name = self.index.file_name.trim();
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            errors.push("index.file_name must be a plain file name".to_string());
        }
        if let Err(e) = self.logging.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors.join("; ")))
        }
    }
}
