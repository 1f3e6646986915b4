//! Core types for the fastbuild fingerprinting engine.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch. All timestamp comparisons happen at this granularity.
pub type EpochSeconds = i64;

/// Root-relative, `/`-separated, NFC-normalized path used as the snapshot key.
pub type EntryPath = String;

/// One filesystem object as seen by a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: EntryPath,
    pub is_directory: bool,
    pub created: EpochSeconds,
    pub modified: EpochSeconds,
    /// Version-control object hash; absent when untracked or locally dirty.
    pub vcs_hash: Option<String>,
    /// File checksum, or the aggregated value for a directory.
    pub content_hash: Option<String>,
}

impl FileEntry {
    pub fn file(path: impl Into<EntryPath>, created: EpochSeconds, modified: EpochSeconds) -> Self {
        Self {
            path: path.into(),
            is_directory: false,
            created,
            modified,
            vcs_hash: None,
            content_hash: None,
        }
    }

    pub fn directory(
        path: impl Into<EntryPath>,
        created: EpochSeconds,
        modified: EpochSeconds,
    ) -> Self {
        Self {
            is_directory: true,
            ..Self::file(path, created, modified)
        }
    }

    pub fn with_vcs_hash(mut self, hash: impl Into<String>) -> Self {
        self.vcs_hash = Some(hash.into());
        self
    }

    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }
}

/// Path-keyed set of entries produced or loaded by one run.
///
/// Backed by a `BTreeMap` so iteration (and therefore the persisted index)
/// is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: BTreeMap<EntryPath, FileEntry>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any previous entry with the same path.
    pub fn insert(&mut self, entry: FileEntry) -> Option<FileEntry> {
        self.entries.insert(entry.path.clone(), entry)
    }

    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.entries.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut FileEntry> {
        self.entries.get_mut(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Values<'_, EntryPath, FileEntry> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> btree_map::ValuesMut<'_, EntryPath, FileEntry> {
        self.entries.values_mut()
    }

    /// Paths of files that still lack a content hash.
    pub fn pending_files(&self) -> Vec<EntryPath> {
        self.iter()
            .filter(|e| !e.is_directory && e.content_hash.is_none())
            .map(|e| e.path.clone())
            .collect()
    }
}

impl FromIterator<FileEntry> for Snapshot {
    fn from_iter<T: IntoIterator<Item = FileEntry>>(iter: T) -> Self {
        let mut snapshot = Snapshot::new();
        for entry in iter {
            snapshot.insert(entry);
        }
        snapshot
    }
}

impl IntoIterator for Snapshot {
    type Item = FileEntry;
    type IntoIter = btree_map::IntoValues<EntryPath, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a FileEntry;
    type IntoIter = btree_map::Values<'a, EntryPath, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

/// Truncate a `SystemTime` to whole seconds since the epoch.
///
/// Times before the epoch floor towards negative infinity so that
/// truncation is consistent on both sides of zero.
pub fn epoch_seconds(time: SystemTime) -> EpochSeconds {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as EpochSeconds,
        Err(e) => {
            let before = e.duration();
            let secs = before.as_secs() as EpochSeconds;
            if before.subsec_nanos() > 0 {
                -secs - 1
            } else {
                -secs
            }
        }
    }
}

/// Inverse of [`epoch_seconds`].
pub fn system_time(seconds: EpochSeconds) -> SystemTime {
    if seconds >= 0 {
        UNIX_EPOCH + std::time::Duration::from_secs(seconds as u64)
    } else {
        UNIX_EPOCH - std::time::Duration::from_secs(seconds.unsigned_abs())
    }
}
