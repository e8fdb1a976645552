//! Per-run update state and path resolution

use crate::config::UpdaterConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// State of one update run
///
/// Created at the start of [`Updater::update`](crate::Updater::update) and
/// threaded through every stage by value; nothing here outlives the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSession {
    /// Directory containing the executable (or the configured override)
    pub work_dir: PathBuf,
    /// `<work_dir>/<staging_dir_name>`
    pub staging_dir: PathBuf,
    /// `<work_dir>/<backup_dir_name>`
    pub backup_dir: PathBuf,
    /// `<staging_dir>/<file name of the package URL>`
    pub package_path: PathBuf,
    /// File name of the package URL path
    pub package_name: String,
    /// The running executable
    pub current_exe: PathBuf,
    /// `<backup_dir>/<file name of the running executable>`
    pub backup_exe: PathBuf,
    /// `<staging_dir>/<platform executable name>`
    pub staged_exe: PathBuf,
    /// The package URL
    pub package_url: String,
    /// Regular files unpacked from the package, in archive order
    pub unpacked_files: Vec<String>,
}

impl UpdateSession {
    /// Derive every path of a run from the configuration
    ///
    /// The executable is taken from `config.executable_path`, falling back to
    /// `std::env::current_exe()`. Fails with `InvalidPackageUrl` when the URL
    /// path has no file name and with `ExecutableNotFound` when the executable
    /// does not exist; no network or filesystem writes happen here.
    pub fn resolve(config: &UpdaterConfig) -> Result<Self> {
        let current_exe = match &config.executable_path {
            Some(path) => path.clone(),
            None => std::env::current_exe().map_err(|source| Error::ExecutableNotFound {
                path: PathBuf::new(),
                source,
            })?,
        };

        let work_dir = match &config.work_dir {
            Some(dir) => dir.clone(),
            None => current_exe
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };

        Self::resolve_paths(config, current_exe, work_dir)
    }

    fn resolve_paths(
        config: &UpdaterConfig,
        current_exe: PathBuf,
        work_dir: PathBuf,
    ) -> Result<Self> {
        let package_name = package_file_name(&config.package_url)?;

        let staging_dir = work_dir.join(&config.staging_dir_name);
        let backup_dir = work_dir.join(&config.backup_dir_name);
        let package_path = staging_dir.join(&package_name);
        let staged_exe = staging_dir.join(config.executable_name());

        let exe_file_name = current_exe.file_name().ok_or_else(|| Error::ExecutableNotFound {
            path: current_exe.clone(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "executable path has no file name",
            ),
        })?;
        let backup_exe = backup_dir.join(exe_file_name);

        debug!(
            ?work_dir,
            ?package_path,
            ?backup_dir,
            version = %config.version,
            url = %config.package_url,
            "resolved update paths"
        );

        std::fs::metadata(&current_exe).map_err(|source| Error::ExecutableNotFound {
            path: current_exe.clone(),
            source,
        })?;

        Ok(Self {
            work_dir,
            staging_dir,
            backup_dir,
            package_path,
            package_name,
            current_exe,
            backup_exe,
            staged_exe,
            package_url: config.package_url.clone(),
            unpacked_files: Vec::new(),
        })
    }
}

/// File name of a package URL's path
///
/// `https://host/dl/v1.2/pkg.tar.gz` yields `pkg.tar.gz`. A URL that does not
/// parse, or whose path ends in `/`, is rejected.
pub fn package_file_name(package_url: &str) -> Result<String> {
    let url = url::Url::parse(package_url).map_err(|e| Error::InvalidPackageUrl {
        url: package_url.to_string(),
        reason: e.to_string(),
    })?;

    let name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();

    if name.is_empty() {
        return Err(Error::InvalidPackageUrl {
            url: package_url.to_string(),
            reason: "URL path has no file name".to_string(),
        });
    }

    Ok(name.to_string())
}
