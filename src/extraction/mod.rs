//! Package extraction
//!
//! This module unpacks a downloaded release archive (ZIP or tar.gz) flat into
//! the staging directory. Archive subdirectory structure is discarded, the
//! archive's self-named wrapper directory is skipped, and only regular files
//! are reported back as extracted.

mod shared;
mod tar_gz;
mod zip;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

// Re-exports
pub use shared::{entry_base_name, file_names};
pub use tar_gz::TarGzExtractor;
pub use zip::ZipExtractor;

use crate::error::{Error, Result};
use crate::types::{ArchiveFormat, PackageEntry};
use std::path::Path;
use tokio::task::spawn_blocking;
use tracing::info;

/// Unpack a package, choosing the extractor from its file name
///
/// `package_name` decides the format (`.zip` or `.tar.gz`; anything else is
/// `UnknownArchiveFormat`). Decoding runs on the blocking thread pool, one
/// entry at a time.
///
/// # Example
/// ```no_run
/// use meta_updater::extraction::unpack;
/// use std::path::Path;
///
/// # async fn example() -> meta_updater::Result<()> {
/// let entries = unpack(
///     "AdGuardHome_linux_amd64.tar.gz",
///     Path::new("/opt/agh/meta-updater/AdGuardHome_linux_amd64.tar.gz"),
///     Path::new("/opt/agh/meta-updater"),
///     "AdGuardHome",
/// )
/// .await?;
/// println!("unpacked {} entries", entries.len());
/// # Ok(())
/// # }
/// ```
pub async fn unpack(
    package_name: &str,
    archive_path: &Path,
    out_dir: &Path,
    wrapper_dir: &str,
) -> Result<Vec<PackageEntry>> {
    let format = ArchiveFormat::detect(package_name).ok_or_else(|| Error::UnknownArchiveFormat {
        package: package_name.to_string(),
    })?;

    info!(?archive_path, %format, "dispatching extraction");

    let archive_owned = archive_path.to_path_buf();
    let out_owned = out_dir.to_path_buf();
    let wrapper_owned = wrapper_dir.to_string();

    spawn_blocking(move || extract_blocking(format, &archive_owned, &out_owned, &wrapper_owned))
        .await
        .map_err(|e| Error::ExtractFailed {
            archive: archive_path.to_path_buf(),
            reason: format!("extraction task panicked: {e}"),
            extracted: Vec::new(),
        })?
}

/// Synchronous form of [`unpack`] for an already-detected format
pub fn extract_blocking(
    format: ArchiveFormat,
    archive_path: &Path,
    out_dir: &Path,
    wrapper_dir: &str,
) -> Result<Vec<PackageEntry>> {
    match format {
        ArchiveFormat::Zip => ZipExtractor::extract(archive_path, out_dir, wrapper_dir),
        ArchiveFormat::TarGz => TarGzExtractor::extract(archive_path, out_dir, wrapper_dir),
    }
}
