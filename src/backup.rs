//! Supporting-file handling and the backup stage
//!
//! Supporting files are everything a package unpacks besides the executable
//! and the main configuration file. They are copied live → backup before any
//! destructive change, and staging → live during replacement.

use crate::config::UpdaterConfig;
use crate::error::{Error, Result};
use crate::session::UpdateSession;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// Names excluded from supporting-file copies
#[derive(Debug, Clone)]
pub struct SupportingFiles {
    excluded: Vec<String>,
}

impl SupportingFiles {
    /// Exclude the executable (bare and `.exe`) and the configuration file
    pub fn new(app_name: &str, conf_name: &str) -> Self {
        Self {
            excluded: vec![
                app_name.to_string(),
                format!("{app_name}.exe"),
                conf_name.to_string(),
            ],
        }
    }

    /// Exclusions for a configuration
    pub fn from_config(config: &UpdaterConfig) -> Self {
        Self::new(&config.app_name, &config.conf_name)
    }

    /// Whether `name` is a supporting file
    pub fn includes(&self, name: &str) -> bool {
        !self.excluded.iter().any(|excluded| excluded == name)
    }

    /// The supporting files among `files`, in order
    pub fn select<'a>(&self, files: &'a [String]) -> Vec<&'a str> {
        files
            .iter()
            .map(|f| base_name(f))
            .filter(|name| self.includes(name))
            .collect()
    }
}

fn base_name(file: &str) -> &str {
    Path::new(file)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file)
}

/// Copy every supporting file in `files` from `src_dir` to `dst_dir`
///
/// A file missing from `src_dir` is skipped: older installs may lack a file the
/// new package introduces. Any other read or write error stops the copy with
/// `Error::Filesystem`. Returns the names actually copied.
pub async fn copy_supporting_files(
    files: &[String],
    supporting: &SupportingFiles,
    src_dir: &Path,
    dst_dir: &Path,
) -> Result<Vec<String>> {
    let mut copied = Vec::new();

    for name in supporting.select(files) {
        let src = src_dir.join(name);
        let dst = dst_dir.join(name);

        let data = match tokio::fs::read(&src).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(?src, "supporting file absent at source, skipping");
                continue;
            }
            Err(e) => return Err(Error::filesystem(&src, e)),
        };

        tokio::fs::write(&dst, data)
            .await
            .map_err(|e| Error::filesystem(&dst, e))?;

        debug!(?src, ?dst, "copied supporting file");
        copied.push(name.to_string());
    }

    Ok(copied)
}

/// Back up the live supporting files (and the configuration file) before replacement
///
/// Creates the backup directory if needed. When `first_run` is false the main
/// configuration file is expected to exist and is copied too. Every failure is
/// `BackupFailed`; nothing in the live installation is modified here.
pub async fn run_backup_stage(
    session: &UpdateSession,
    config: &UpdaterConfig,
    first_run: bool,
) -> Result<()> {
    debug!(backup_dir = ?session.backup_dir, first_run, "backing up current configuration");

    match tokio::fs::create_dir(&session.backup_dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
        Err(source) => {
            return Err(Error::BackupFailed {
                source_path: session.work_dir.clone(),
                dest_path: session.backup_dir.clone(),
                source,
            });
        }
    }

    if !first_run {
        let src = session.work_dir.join(&config.conf_name);
        let dst = session.backup_dir.join(&config.conf_name);
        tokio::fs::copy(&src, &dst)
            .await
            .map_err(|source| Error::BackupFailed {
                source_path: src.clone(),
                dest_path: dst.clone(),
                source,
            })?;
        debug!(?src, ?dst, "backed up configuration file");
    }

    let supporting = SupportingFiles::from_config(config);
    let copied = copy_supporting_files(
        &session.unpacked_files,
        &supporting,
        &session.work_dir,
        &session.backup_dir,
    )
    .await
    .map_err(|e| match e {
        Error::Filesystem { path, source } => Error::BackupFailed {
            source_path: path,
            dest_path: session.backup_dir.clone(),
            source,
        },
        other => other,
    })?;

    info!(
        backup_dir = ?session.backup_dir,
        copied = copied.len(),
        "backup complete"
    );

    Ok(())
}
