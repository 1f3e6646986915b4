//! Git CLI implementation of the version-control query

use crate::error::VcsError;
use crate::vcs::VcsQuery;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Queries a git working tree by invoking `git` on PATH.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific git executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run git in `root` and return lossy UTF-8 stdout.
    fn run(&self, root: &Path, args: &[&str]) -> Result<String, VcsError> {
        debug!(program = %self.program, ?args, "Running git");
        let output = Command::new(&self.program)
            .arg("-C")
            .arg(root)
            .args(args)
            .output()
            .map_err(|source| VcsError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(VcsError::Failed {
                command: format!("{} {}", self.program, args.join(" ")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VcsQuery for GitCli {
    /// Modified or added paths relative to HEAD; deletions are irrelevant
    /// because a deleted path cannot appear in the snapshot.
    fn dirty_paths(&self, root: &Path) -> Result<HashSet<String>, VcsError> {
        let out = self.run(
            root,
            &["diff", "--diff-filter=d", "--name-only", "--relative", "-z", "HEAD"],
        )?;
        Ok(parse_name_list(&out))
    }

    /// Blobs and trees at HEAD, relative to `root`.
    fn tracked_objects(&self, root: &Path) -> Result<HashMap<String, String>, VcsError> {
        let out = self.run(root, &["ls-tree", "-r", "-t", "-z", "HEAD"])?;
        parse_ls_tree(&out)
    }
}

/// Parse NUL-separated path output.
pub fn parse_name_list(output: &str) -> HashSet<String> {
    output
        .split('\0')
        .map(|p| p.trim_end_matches(['\n', '\r']))
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `ls-tree -z` records of the form `<mode> <type> <hash>\t<path>`.
pub fn parse_ls_tree(output: &str) -> Result<HashMap<String, String>, VcsError> {
    let mut objects = HashMap::new();
    for record in output.split('\0') {
        let record = record.trim_start_matches('\n');
        if record.is_empty() {
            continue;
        }
        let (header, path) = record
            .split_once('\t')
            .ok_or_else(|| VcsError::Parse(format!("missing tab in ls-tree record {:?}", record)))?;
        let hash = header
            .split_whitespace()
            .nth(2)
            .ok_or_else(|| VcsError::Parse(format!("short ls-tree header {:?}", header)))?;
        objects.insert(path.to_string(), hash.to_string());
    }
    Ok(objects)
}
