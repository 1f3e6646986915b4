//! Filesystem walker that enumerates a target root into a fresh snapshot

use crate::tree::path;
use crate::types::{epoch_seconds, FileEntry, Snapshot};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

/// Filesystem walker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkerConfig {
    /// Path-name substrings that exclude an entry and everything below it
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    /// Skip entries whose name starts with `.`
    #[serde(default = "default_true")]
    pub skip_hidden: bool,
}

fn default_exclude() -> Vec<String> {
    vec![".xcodeproj".to_string(), ".xcworkspace".to_string()]
}

fn default_true() -> bool {
    true
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
            skip_hidden: true,
        }
    }
}

/// Filesystem walker
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given root path
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    /// Create a walker with custom configuration
    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// Walk the filesystem and collect every entry below the root
    ///
    /// Symbolic links are never followed nor recorded. Entries whose
    /// metadata cannot be read are skipped with a warning.
    pub fn walk(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.should_ignore(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to walk directory entry: {}", e);
                    continue;
                }
            };

            if entry.depth() == 0 || entry.file_type().is_symlink() {
                continue;
            }

            let Some(key) = path::relative_key(&self.root, entry.path()) else {
                continue;
            };

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %key, "Failed to read metadata: {}", e);
                    continue;
                }
            };
            let modified = match metadata.modified() {
                Ok(t) => epoch_seconds(t),
                Err(e) => {
                    warn!(path = %key, "Modification time unavailable: {}", e);
                    continue;
                }
            };
            let created = metadata.created().map(epoch_seconds).unwrap_or(modified);

            trace!(path = %key, is_dir = metadata.is_dir(), "Enumerated entry");
            if metadata.is_dir() {
                snapshot.insert(FileEntry::directory(key, created, modified));
            } else if metadata.is_file() {
                snapshot.insert(FileEntry::file(key, created, modified));
            }
        }

        debug!(entry_count = snapshot.len(), "Walked filesystem");
        snapshot
    }

    /// Check if an entry should be ignored (hidden or excluded)
    fn should_ignore(&self, entry: &DirEntry) -> bool {
        if self.config.skip_hidden && entry.file_name().to_string_lossy().starts_with('.') {
            return true;
        }

        let Some(key) = path::relative_key(&self.root, entry.path()) else {
            return false;
        };
        self.config
            .exclude
            .iter()
            .any(|pattern| !pattern.is_empty() && key.contains(pattern.as_str()))
    }
}
