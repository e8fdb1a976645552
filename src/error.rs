//! Error types for meta-updater
//!
//! This module provides the error taxonomy of the update pipeline:
//! - One variant per failure kind (download, extraction, backup, replace, etc.)
//! - A `Stage` wrapper the orchestrator adds so callers learn where a run failed
//! - Stable machine-readable codes for hosts that report failures upstream

use crate::types::UpdateStage;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for meta-updater operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for meta-updater
///
/// Every stage returns one of these immediately on its first unrecoverable
/// failure. The orchestrator wraps it in [`Error::Stage`] before handing it to
/// the caller, so [`Error::kind`] and [`Error::stage`] are the usual way to
/// inspect a failed run.
#[derive(Debug, Error)]
pub enum Error {
    /// Updater configuration is unusable
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
        /// The configuration key that caused the error (e.g., "app_name")
        key: Option<String>,
    },

    /// The package URL does not parse or has no file name in its path
    #[error("invalid package URL {url:?}: {reason}")]
    InvalidPackageUrl {
        /// The offending URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// The running executable could not be located on disk
    #[error("executable not found at {path}: {source}")]
    ExecutableNotFound {
        /// The path that was checked
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The HTTP request for the package failed or returned a non-success status
    #[error("downloading {url} failed: {reason}")]
    DownloadFailed {
        /// The package URL
        url: String,
        /// The reason the download failed
        reason: String,
    },

    /// The package body exceeded the configured ceiling
    #[error("package exceeds the {limit} byte limit (received at least {received} bytes)")]
    PackageTooLarge {
        /// The configured ceiling in bytes
        limit: u64,
        /// Bytes seen (or announced via Content-Length) when the limit tripped
        received: u64,
    },

    /// The downloaded package could not be written into the staging directory
    #[error("writing staging file {path} failed: {source}")]
    StagingWriteFailed {
        /// The staging path being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The package file name has neither a `.zip` nor a `.tar.gz` suffix
    #[error("unknown archive format for package {package:?}")]
    UnknownArchiveFormat {
        /// The package file name
        package: String,
    },

    /// Archive extraction stopped at an unrecoverable error
    #[error("extraction failed for {archive}: {reason}")]
    ExtractFailed {
        /// The archive being extracted
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
        /// File names extracted before the failure, in encounter order
        extracted: Vec<String>,
    },

    /// Copying a file into the backup directory failed
    #[error("backing up {source_path} to {dest_path} failed: {source}")]
    BackupFailed {
        /// The live file being backed up
        source_path: PathBuf,
        /// The backup destination
        dest_path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Moving or installing an executable failed
    #[error("replacing {from} -> {to} failed: {source}")]
    ReplaceFailed {
        /// Source path of the move/copy
        from: PathBuf,
        /// Destination path of the move/copy
        to: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Generic filesystem failure (copy, create, remove) not otherwise classified
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        /// The path the operation failed on
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Another update holds the pipeline lock (only from `try_update`)
    #[error("an update is already in progress")]
    UpdateInProgress,

    /// A stage failure, wrapped with the stage it happened in
    #[error("{stage}: {source}")]
    Stage {
        /// The stage that failed
        stage: UpdateStage,
        /// The stage's own error
        #[source]
        source: Box<Error>,
    },
}

/// Failure kind of an [`Error`], independent of stage wrapping
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`Error::Config`]
    Config,
    /// See [`Error::InvalidPackageUrl`]
    InvalidPackageUrl,
    /// See [`Error::ExecutableNotFound`]
    ExecutableNotFound,
    /// See [`Error::DownloadFailed`]
    DownloadFailed,
    /// See [`Error::PackageTooLarge`]
    PackageTooLarge,
    /// See [`Error::StagingWriteFailed`]
    StagingWriteFailed,
    /// See [`Error::UnknownArchiveFormat`]
    UnknownArchiveFormat,
    /// See [`Error::ExtractFailed`]
    ExtractFailed,
    /// See [`Error::BackupFailed`]
    BackupFailed,
    /// See [`Error::ReplaceFailed`]
    ReplaceFailed,
    /// See [`Error::Filesystem`]
    Filesystem,
    /// See [`Error::UpdateInProgress`]
    UpdateInProgress,
}

impl Error {
    /// Wrap this error with the stage it occurred in
    pub fn in_stage(self, stage: UpdateStage) -> Self {
        Error::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The innermost error, with any stage wrappers removed
    pub fn root(&self) -> &Error {
        match self {
            Error::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// The stage this error was wrapped with, if any
    pub fn stage(&self) -> Option<UpdateStage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The failure kind, looking through stage wrappers
    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Error::Config { .. } => ErrorKind::Config,
            Error::InvalidPackageUrl { .. } => ErrorKind::InvalidPackageUrl,
            Error::ExecutableNotFound { .. } => ErrorKind::ExecutableNotFound,
            Error::DownloadFailed { .. } => ErrorKind::DownloadFailed,
            Error::PackageTooLarge { .. } => ErrorKind::PackageTooLarge,
            Error::StagingWriteFailed { .. } => ErrorKind::StagingWriteFailed,
            Error::UnknownArchiveFormat { .. } => ErrorKind::UnknownArchiveFormat,
            Error::ExtractFailed { .. } => ErrorKind::ExtractFailed,
            Error::BackupFailed { .. } => ErrorKind::BackupFailed,
            Error::ReplaceFailed { .. } => ErrorKind::ReplaceFailed,
            Error::Filesystem { .. } => ErrorKind::Filesystem,
            Error::UpdateInProgress => ErrorKind::UpdateInProgress,
            // root() never returns a Stage
            Error::Stage { source, .. } => source.kind(),
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Config => "config_error",
            ErrorKind::InvalidPackageUrl => "invalid_package_url",
            ErrorKind::ExecutableNotFound => "executable_not_found",
            ErrorKind::DownloadFailed => "download_failed",
            ErrorKind::PackageTooLarge => "package_too_large",
            ErrorKind::StagingWriteFailed => "staging_write_failed",
            ErrorKind::UnknownArchiveFormat => "unknown_archive_format",
            ErrorKind::ExtractFailed => "extract_failed",
            ErrorKind::BackupFailed => "backup_failed",
            ErrorKind::ReplaceFailed => "replace_failed",
            ErrorKind::Filesystem => "filesystem_error",
            ErrorKind::UpdateInProgress => "update_in_progress",
        }
    }

    /// Convenience constructor for [`Error::Filesystem`]
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }
}
