//! Timestamp writers: direct metadata mutation and the shell fallback

use crate::error::StampError;
use crate::types::{system_time, EpochSeconds};
use chrono::{Local, TimeZone};
use std::fs::{File, FileTimes};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// A timestamp restoration that could not be applied directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingStamp {
    pub path: PathBuf,
    pub created: EpochSeconds,
    pub modified: EpochSeconds,
}

/// Sets timestamps on a filesystem object in place.
pub trait TimestampWriter {
    fn set_times(
        &self,
        path: &Path,
        created: EpochSeconds,
        modified: EpochSeconds,
    ) -> Result<(), StampError>;

    /// Whether `set_times` writes the creation time as well.
    fn restores_created(&self) -> bool {
        true
    }
}

/// Executes one chunk of queued fallback commands.
pub trait FallbackRunner {
    fn run(&self, commands: &[String]) -> Result<(), StampError>;
}

/// Direct mutation through the open file handle
///
/// The modification time is restored on every platform; the creation time
/// only where the platform can set it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectStamp;

impl TimestampWriter for DirectStamp {
    fn set_times(
        &self,
        path: &Path,
        created: EpochSeconds,
        modified: EpochSeconds,
    ) -> Result<(), StampError> {
        let direct = |source| StampError::Direct {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(direct)?;
        let times = FileTimes::new().set_modified(system_time(modified));
        let times = with_created(times, created);
        file.set_times(times).map_err(direct)
    }

    fn restores_created(&self) -> bool {
        cfg!(any(target_os = "macos", windows))
    }
}

#[cfg(target_os = "macos")]
fn with_created(times: FileTimes, created: EpochSeconds) -> FileTimes {
    use std::os::macos::fs::FileTimesExt;
    times.set_created(system_time(created))
}

#[cfg(windows)]
fn with_created(times: FileTimes, created: EpochSeconds) -> FileTimes {
    use std::os::windows::fs::FileTimesExt;
    times.set_created(system_time(created))
}

#[cfg(not(any(target_os = "macos", windows)))]
fn with_created(times: FileTimes, _created: EpochSeconds) -> FileTimes {
    times
}

/// Shell command dialect for the fallback path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampStyle {
    /// `SetFile -d/-m 'MM/dd/yyyy HH:mm:ss'` (macOS developer tools, local time)
    SetFile,
    /// `touch -m -d @<epoch>`
    Touch,
}

impl StampStyle {
    pub fn native() -> Self {
        if cfg!(target_os = "macos") {
            StampStyle::SetFile
        } else {
            StampStyle::Touch
        }
    }

    /// Whether the commands write the creation time as well.
    pub fn restores_created(&self) -> bool {
        matches!(self, StampStyle::SetFile)
    }

    /// Shell commands restoring `stamp`, in execution order.
    pub fn commands(&self, stamp: &PendingStamp) -> Vec<String> {
        let target = shell_quote(&stamp.path.to_string_lossy());
        match self {
            StampStyle::SetFile => vec![
                format!(
                    "SetFile -d {} {}",
                    shell_quote(&setfile_date(stamp.created)),
                    target
                ),
                format!(
                    "SetFile -m {} {}",
                    shell_quote(&setfile_date(stamp.modified)),
                    target
                ),
            ],
            StampStyle::Touch => vec![format!("touch -m -d @{} {}", stamp.modified, target)],
        }
    }
}

/// Local-time `MM/dd/yyyy HH:mm:ss`, the format SetFile expects.
fn setfile_date(seconds: EpochSeconds) -> String {
    match Local.timestamp_opt(seconds, 0).earliest() {
        Some(dt) => dt.format("%m/%d/%Y %H:%M:%S").to_string(),
        None => String::new(),
    }
}

/// Single-quote `value` for POSIX sh.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Runs a chunk of commands joined with `;` through `sh -c`.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl FallbackRunner for ShellRunner {
    fn run(&self, commands: &[String]) -> Result<(), StampError> {
        if commands.is_empty() {
            return Ok(());
        }
        debug!(count = commands.len(), "Running fallback timestamp commands");
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(commands.join(";"))
            .output()
            .map_err(StampError::Spawn)?;
        if !output.status.success() {
            return Err(StampError::CommandFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
