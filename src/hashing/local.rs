//! In-process BLAKE3 content hashing

use crate::error::HashError;
use crate::hashing::BatchHasher;
use crate::tree::path;
use crate::types::EntryPath;
use blake3::Hasher;
use std::fs::File;
use std::path::Path;
use tracing::{trace, warn};

/// Hashes file content with BLAKE3 and encodes the digest as hex.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalHasher;

impl LocalHasher {
    /// Hash one file, streaming its content.
    pub fn hash_file(file_path: &Path) -> Result<String, HashError> {
        let unreadable = |source| HashError::Unreadable {
            path: file_path.to_path_buf(),
            source,
        };
        let mut file = File::open(file_path).map_err(unreadable)?;
        let mut hasher = Hasher::new();
        std::io::copy(&mut file, &mut hasher).map_err(unreadable)?;
        Ok(hex::encode(hasher.finalize().as_bytes()))
    }
}

impl BatchHasher for LocalHasher {
    fn hash_batch(
        &self,
        root: &Path,
        batch: &[EntryPath],
    ) -> Result<Vec<(EntryPath, String)>, HashError> {
        let mut hashes = Vec::with_capacity(batch.len());
        for key in batch {
            match Self::hash_file(&path::absolute(root, key)) {
                Ok(hash) => {
                    trace!(path = %key, content_hash = %hash, "Hashed file");
                    hashes.push((key.clone(), hash));
                }
                Err(e) => warn!(path = %key, "Leaving file unhashed: {}", e),
            }
        }
        Ok(hashes)
    }
}
