//! Error types for the fastbuild fingerprinting engine.
//!
//! Only configuration and logging setup errors are fatal. Every pipeline
//! phase degrades its own errors into "unresolved" state and logs them.

use std::path::PathBuf;
use thiserror::Error;

/// Index persistence errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read index {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write index {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed index {path:?}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Unsupported index version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Index serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Version-control query errors
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Command `{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Unexpected version-control output: {0}")]
    Parse(String),
}

/// Content hashing errors
#[derive(Debug, Error)]
pub enum HashError {
    #[error("Failed to read {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to launch hash command {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Hash command {program} exited with {status}")]
    CommandFailed { program: String, status: String },

    #[error("Failed to build hashing worker pool: {0}")]
    Pool(String),
}

/// Timestamp mutation errors
#[derive(Debug, Error)]
pub enum StampError {
    #[error("Failed to set timestamps on {path:?}: {source}")]
    Direct {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to launch timestamp command: {0}")]
    Spawn(std::io::Error),

    #[error("Timestamp command batch exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

/// Umbrella error for the binary surface
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Version control error: {0}")]
    Vcs(#[from] VcsError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Timestamp error: {0}")]
    Stamp(#[from] StampError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Target root {0:?} is not a directory")]
    InvalidRoot(PathBuf),
}
