//! Persistence layer for the index file

use crate::error::StorageError;
use crate::store::{IndexDocument, IndexRecord, DEFAULT_INDEX_FILE, INDEX_VERSION};
use crate::types::Snapshot;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File-backed snapshot store
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    /// Store at `cache_dir/<file_name>`.
    pub fn new<P: AsRef<Path>>(cache_dir: P, file_name: &str) -> Self {
        Self {
            path: cache_dir.as_ref().join(file_name),
        }
    }

    /// Store at `cache_dir/fastbuild-index.json`.
    pub fn in_cache_dir<P: AsRef<Path>>(cache_dir: P) -> Self {
        Self::new(cache_dir, DEFAULT_INDEX_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the prior snapshot, treating any failure as an empty snapshot.
    pub fn load(&self) -> Snapshot {
        match self.try_load() {
            Ok(snapshot) => snapshot,
            Err(StorageError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                debug!(path = %self.path.display(), "No prior index, starting empty");
                Snapshot::new()
            }
            Err(e) => {
                warn!("Discarding prior index: {}", e);
                Snapshot::new()
            }
        }
    }

    /// Load the prior snapshot, reporting why it could not be read
    ///
    /// Individual malformed records are skipped; only a missing file, an
    /// unparseable document or an unknown version is an error.
    pub fn try_load(&self) -> Result<Snapshot, StorageError> {
        let content = fs::read_to_string(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;
        let document: IndexDocument =
            serde_json::from_str(&content).map_err(|e| StorageError::Malformed {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        if document.version != INDEX_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: document.version,
                expected: INDEX_VERSION,
            });
        }

        let total = document.entries.len();
        let snapshot: Snapshot = document
            .entries
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<IndexRecord>(value) {
                Ok(record) => Some(record.0),
                Err(e) => {
                    warn!("Skipping malformed index record: {}", e);
                    None
                }
            })
            .collect();

        debug!(
            path = %self.path.display(),
            records = total,
            loaded = snapshot.len(),
            "Loaded prior index"
        );
        Ok(snapshot)
    }

    /// Persist `snapshot`, replacing the previous index atomically
    ///
    /// Writes to a temporary sibling file first and renames it into place.
    /// The cache directory is created when missing.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let write_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StorageError::Write { path, source }
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err(parent))?;
        }

        let document = IndexDocument {
            version: INDEX_VERSION,
            entries: snapshot
                .iter()
                .map(|entry| serde_json::to_value(IndexRecord(entry.clone())))
                .collect::<Result<_, _>>()?,
        };

        let tmp_path = self.path.with_extension("tmp");
        {
            let file = fs::File::create(&tmp_path).map_err(write_err(&tmp_path))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, &document)?;
            writer.flush().map_err(write_err(&tmp_path))?;
        }
        fs::rename(&tmp_path, &self.path).map_err(write_err(&self.path))?;

        debug!(
            path = %self.path.display(),
            records = snapshot.len(),
            "Persisted index"
        );
        Ok(())
    }
}
