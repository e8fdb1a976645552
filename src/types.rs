//! Core types for meta-updater

use crate::session::UpdateSession;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of the update pipeline
///
/// A run moves strictly forward: `Idle → Resolving → Downloading → Extracting →
/// BackingUp → Replacing → Done`. Any active stage may instead end in `Failed`,
/// which is absorbing for that run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStage {
    /// No update running
    #[default]
    Idle,
    /// Deriving working, staging and backup paths
    Resolving,
    /// Fetching the package over HTTP
    Downloading,
    /// Unpacking the package into the staging directory
    Extracting,
    /// Copying the live supporting files into the backup directory
    BackingUp,
    /// Installing the new files and executable
    Replacing,
    /// The run finished successfully
    Done,
    /// The run stopped at the first error
    Failed,
}

impl UpdateStage {
    /// Whether this stage ends a run
    pub fn is_terminal(self) -> bool {
        matches!(self, UpdateStage::Done | UpdateStage::Failed)
    }
}

impl fmt::Display for UpdateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateStage::Idle => "idle",
            UpdateStage::Resolving => "resolving paths",
            UpdateStage::Downloading => "downloading",
            UpdateStage::Extracting => "unpacking",
            UpdateStage::BackingUp => "making backup",
            UpdateStage::Replacing => "replacing",
            UpdateStage::Done => "done",
            UpdateStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Kind of an extracted archive entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
}

/// One item produced by extraction
///
/// `name` is always a bare file name: archive subdirectories are discarded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
    /// Base name inside the output directory
    pub name: String,
    /// File or directory
    pub kind: EntryKind,
    /// Permission bits applied on creation (already masked)
    pub mode: u32,
}

impl PackageEntry {
    /// Whether this entry is a regular file
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Archive format, detected by the package file name suffix
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFormat {
    /// ZIP archive (.zip)
    Zip,
    /// Gzip-compressed tar archive (.tar.gz)
    TarGz,
}

impl ArchiveFormat {
    /// Detect the format from a package file name
    ///
    /// Only `.zip` and `.tar.gz` are recognised; matching is case-sensitive.
    pub fn detect(file_name: &str) -> Option<Self> {
        if file_name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else if file_name.ends_with(".tar.gz") {
            Some(ArchiveFormat::TarGz)
        } else {
            None
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFormat::Zip => f.write_str(".zip"),
            ArchiveFormat::TarGz => f.write_str(".tar.gz"),
        }
    }
}

/// How the new executable is put in place of the old one
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceStrategy {
    /// Rename the staged executable over the original path
    AtomicMove,
    /// Read the staged executable, write it to the original path, then remove
    /// the staged copy. Used where renaming onto an in-use binary fails.
    CopyThenRemove,
}

impl ReplaceStrategy {
    /// Strategy for a target operating system (`std::env::consts::OS` naming)
    pub fn for_os(os: &str) -> Self {
        if os == "windows" {
            ReplaceStrategy::CopyThenRemove
        } else {
            ReplaceStrategy::AtomicMove
        }
    }
}

/// Event emitted while an update runs
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateEvent {
    /// A pipeline stage began
    StageStarted {
        /// The stage entered
        stage: UpdateStage,
    },
    /// The update finished successfully
    Completed {
        /// Files extracted from the package
        files: Vec<String>,
    },
    /// The update stopped at an error
    Failed {
        /// The stage that failed
        stage: UpdateStage,
        /// Error message
        error: String,
    },
}

/// Summary of a successful update
#[derive(Debug, Clone)]
pub struct UpdateReport {
    /// The session the run operated on
    pub session: UpdateSession,
    /// Replacement strategy used for the executable
    pub strategy: ReplaceStrategy,
    /// Whether the staging directory was removed afterwards
    pub staging_cleaned: bool,
}

/// Cached outcome of the host's most recent version check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionCheck {
    /// When the check last ran
    pub checked_at: Option<DateTime<Utc>>,
    /// Error message of the last check, if it failed
    pub error: Option<String>,
}
