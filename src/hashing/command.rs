//! External-command content hashing
//!
//! Runs a checksum program (e.g. `md5sum`, `md5 -r`, `b3sum`) once per batch
//! with every file of the batch as an argument, and parses one
//! `<hash> <path>` line per file from its stdout.

use crate::error::HashError;
use crate::hashing::BatchHasher;
use crate::tree::path;
use crate::types::EntryPath;
use std::collections::HashMap;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// Hashes files by invoking an external checksum program.
#[derive(Debug, Clone)]
pub struct CommandHasher {
    program: String,
    args: Vec<String>,
}

impl CommandHasher {
    /// Build from a program followed by its leading arguments.
    ///
    /// Returns `None` for an empty command line.
    pub fn from_command_line(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

/// Split a checksum output line on its first whitespace run.
///
/// Returns `(path, hash)`.
pub fn parse_hash_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_end_matches(['\r', '\n']);
    let split = line.find(char::is_whitespace)?;
    let hash = &line[..split];
    let path = line[split..].trim_start();
    if hash.is_empty() || path.is_empty() {
        return None;
    }
    Some((path, hash))
}

impl BatchHasher for CommandHasher {
    fn hash_batch(
        &self,
        root: &Path,
        batch: &[EntryPath],
    ) -> Result<Vec<(EntryPath, String)>, HashError> {
        let mut by_arg: HashMap<String, &EntryPath> = HashMap::with_capacity(batch.len());
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        for key in batch {
            let abs = path::absolute(root, key);
            by_arg.insert(abs.to_string_lossy().into_owned(), key);
            command.arg(abs);
        }

        let output = command.output().map_err(|source| HashError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let hashes: Vec<(EntryPath, String)> = stdout
            .lines()
            .filter_map(parse_hash_line)
            .filter_map(|(printed, hash)| {
                by_arg
                    .get(printed)
                    .map(|key| ((*key).clone(), hash.to_string()))
            })
            .collect();

        if !output.status.success() {
            // Checksum tools exit non-zero when any single file is unreadable
            // but still report the rest.
            if hashes.is_empty() {
                return Err(HashError::CommandFailed {
                    program: self.program.clone(),
                    status: output.status.to_string(),
                });
            }
            warn!(
                program = %self.program,
                status = %output.status,
                reported = hashes.len(),
                requested = batch.len(),
                "Hash command partially failed"
            );
        }

        debug!(
            program = %self.program,
            reported = hashes.len(),
            requested = batch.len(),
            "Hash command finished"
        );
        Ok(hashes)
    }
}
