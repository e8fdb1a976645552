//! Configuration types for meta-updater

use crate::error::{Error, Result};
use crate::types::ReplaceStrategy;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Maximum package file length in bytes
///
/// The largest release archive seen so far is around 9 MiB; the ceiling keeps
/// a hostile or broken server from exhausting memory.
pub const MAX_PACKAGE_FILE_SIZE: u64 = 32 * 1024 * 1024;

/// Target platform of the package being installed
///
/// Uses the `std::env::consts` naming (`"linux"`, `"windows"`, `"x86_64"`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPlatform {
    /// Operating system (default: the host OS)
    #[serde(default = "default_os")]
    pub os: String,

    /// CPU architecture (default: the host architecture)
    #[serde(default = "default_arch")]
    pub arch: String,

    /// ARM variant, e.g. "6" or "7" (empty when not applicable)
    #[serde(default)]
    pub arm: String,

    /// MIPS float variant, e.g. "softfloat" (empty when not applicable)
    #[serde(default)]
    pub mips: String,
}

impl Default for TargetPlatform {
    fn default() -> Self {
        Self {
            os: default_os(),
            arch: default_arch(),
            arm: String::new(),
            mips: String::new(),
        }
    }
}

impl TargetPlatform {
    /// Whether the target is Windows
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }
}

/// Main configuration for [`Updater`](crate::Updater)
///
/// Supplied by the host application. Every field has a default, so a host only
/// needs to set the package URL (and usually the version-check URL):
///
/// ```
/// use meta_updater::UpdaterConfig;
///
/// let config = UpdaterConfig {
///     package_url: "https://example.com/releases/AdGuardHome_linux_amd64.tar.gz".into(),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Version currently running (informational)
    #[serde(default)]
    pub version: String,

    /// Release channel (default: "release")
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Platform the package targets
    #[serde(default)]
    pub target: TargetPlatform,

    /// Application name: the executable stem and the name of the archive's
    /// top-level wrapper directory (default: "AdGuardHome")
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Main configuration file name (default: "AdGuardHome.yaml")
    #[serde(default = "default_conf_name")]
    pub conf_name: String,

    /// Working directory override (default: directory of the executable)
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    /// Executable path override (default: `std::env::current_exe()`)
    #[serde(default)]
    pub executable_path: Option<PathBuf>,

    /// URL of the release archive to install
    #[serde(default)]
    pub package_url: String,

    /// URL the host polls for new versions
    #[serde(default)]
    pub version_check_url: String,

    /// Staging subdirectory of the working directory (default: "meta-updater")
    #[serde(default = "default_staging_dir_name")]
    pub staging_dir_name: String,

    /// Backup subdirectory of the working directory (default: "meta-backup")
    #[serde(default = "default_backup_dir_name")]
    pub backup_dir_name: String,

    /// Download ceiling in bytes (default: [`MAX_PACKAGE_FILE_SIZE`])
    #[serde(default = "default_max_package_size")]
    pub max_package_size: u64,

    /// Timeout for the whole download (None = wait indefinitely)
    #[serde(default)]
    pub download_timeout: Option<Duration>,

    /// Remove the staging directory after the run (default: false)
    ///
    /// Left off, the downloaded package and its unpacked contents stay on disk
    /// after both success and failure for post-mortem inspection.
    #[serde(default)]
    pub cleanup_staging: bool,

    /// Replacement strategy override (None = chosen from `target.os`)
    #[serde(default)]
    pub replace_strategy: Option<ReplaceStrategy>,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            version: String::new(),
            channel: default_channel(),
            target: TargetPlatform::default(),
            app_name: default_app_name(),
            conf_name: default_conf_name(),
            work_dir: None,
            executable_path: None,
            package_url: String::new(),
            version_check_url: String::new(),
            staging_dir_name: default_staging_dir_name(),
            backup_dir_name: default_backup_dir_name(),
            max_package_size: default_max_package_size(),
            download_timeout: None,
            cleanup_staging: false,
            replace_strategy: None,
        }
    }
}

impl UpdaterConfig {
    /// Check the settings the pipeline cannot work without
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("app_name", &self.app_name),
            ("conf_name", &self.conf_name),
            ("staging_dir_name", &self.staging_dir_name),
            ("backup_dir_name", &self.backup_dir_name),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config {
                    message: format!("{key} must not be empty"),
                    key: Some(key.to_string()),
                });
            }
        }

        if self.max_package_size == 0 {
            return Err(Error::Config {
                message: "max_package_size must be greater than zero".to_string(),
                key: Some("max_package_size".to_string()),
            });
        }

        Ok(())
    }

    /// File name of the executable inside a package for the target platform
    pub fn executable_name(&self) -> String {
        if self.target.is_windows() {
            format!("{}.exe", self.app_name)
        } else {
            self.app_name.clone()
        }
    }

    /// Replacement strategy for this configuration
    pub fn strategy(&self) -> ReplaceStrategy {
        self.replace_strategy
            .unwrap_or_else(|| ReplaceStrategy::for_os(&self.target.os))
    }
}

fn default_os() -> String {
    std::env::consts::OS.to_string()
}

fn default_arch() -> String {
    std::env::consts::ARCH.to_string()
}

fn default_channel() -> String {
    "release".to_string()
}

fn default_app_name() -> String {
    "AdGuardHome".to_string()
}

fn default_conf_name() -> String {
    "AdGuardHome.yaml".to_string()
}

fn default_staging_dir_name() -> String {
    "meta-updater".to_string()
}

fn default_backup_dir_name() -> String {
    "meta-backup".to_string()
}

fn default_max_package_size() -> u64 {
    MAX_PACKAGE_FILE_SIZE
}
