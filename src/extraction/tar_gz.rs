use crate::error::Result;
use crate::types::PackageEntry;
use flate2::read::GzDecoder;
use std::path::Path;
use tracing::{debug, info};

use super::shared::{DEFAULT_FILE_MODE, FlatWriter, open_archive};

/// Archive extractor for gzip-compressed tar files
pub struct TarGzExtractor;

impl TarGzExtractor {
    /// Unpack every entry of a `.tar.gz` archive flat into `out_dir`
    ///
    /// Same contract as [`ZipExtractor::extract`](super::ZipExtractor::extract):
    /// flattened names, `wrapper_dir` skipped, regular files overwritten,
    /// other entry types (symlinks, devices, ...) skipped with a warning.
    pub fn extract(
        archive_path: &Path,
        out_dir: &Path,
        wrapper_dir: &str,
    ) -> Result<Vec<PackageEntry>> {
        debug!(?archive_path, ?out_dir, "unpacking tar.gz package");

        let file = open_archive(archive_path)?;
        let mut writer = FlatWriter::new(archive_path, out_dir, wrapper_dir);
        let mut archive = tar::Archive::new(GzDecoder::new(file));

        let entries = archive
            .entries()
            .map_err(|e| writer.fail(format!("failed to read tar archive: {e}")))?;

        for entry in entries {
            let mut entry =
                entry.map_err(|e| writer.fail(format!("failed to read tar entry: {e}")))?;

            let raw_name = entry
                .path()
                .map_err(|e| writer.fail(format!("invalid tar entry path: {e}")))?
                .to_string_lossy()
                .into_owned();
            let entry_type = entry.header().entry_type();
            let mode = entry.header().mode().unwrap_or(DEFAULT_FILE_MODE);

            if entry_type.is_dir() {
                writer.directory(&raw_name, mode)?;
            } else if entry_type.is_file() {
                writer.file(&raw_name, mode, &mut entry)?;
            } else {
                writer.skip_unsupported(&raw_name, &format!("{entry_type:?}"));
            }
        }

        let entries = writer.finish();
        info!(
            ?archive_path,
            extracted_count = entries.iter().filter(|e| e.is_file()).count(),
            "tar.gz extraction successful"
        );

        Ok(entries)
    }
}
