use crate::error::Result;
use crate::types::PackageEntry;
use std::path::Path;
use tracing::{debug, info};

use super::shared::{DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, FlatWriter, open_archive};

/// `S_IFMT` file-type bits of a unix mode
const S_IFMT: u32 = 0o170000;
/// `S_IFLNK` symlink file type
const S_IFLNK: u32 = 0o120000;

/// Archive extractor for ZIP files
pub struct ZipExtractor;

impl ZipExtractor {
    /// Unpack every entry of a ZIP archive flat into `out_dir`
    ///
    /// Existing files are overwritten; subdirectories of the archive are not
    /// recreated. A directory entry named `wrapper_dir` is skipped. Stops at the
    /// first unrecoverable error, which carries the files extracted so far.
    pub fn extract(
        archive_path: &Path,
        out_dir: &Path,
        wrapper_dir: &str,
    ) -> Result<Vec<PackageEntry>> {
        debug!(?archive_path, ?out_dir, "unpacking ZIP package");

        let file = open_archive(archive_path)?;
        let mut writer = FlatWriter::new(archive_path, out_dir, wrapper_dir);

        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| writer.fail(format!("failed to read ZIP archive: {e}")))?;

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| writer.fail(format!("failed to read ZIP entry {i}: {e}")))?;

            let raw_name = entry.name().to_string();
            let unix_mode = entry.unix_mode();

            if entry.is_dir() {
                writer.directory(&raw_name, unix_mode.unwrap_or(DEFAULT_DIR_MODE))?;
            } else if unix_mode.is_some_and(|m| m & S_IFMT == S_IFLNK) {
                writer.skip_unsupported(&raw_name, "symlink");
            } else {
                writer.file(&raw_name, unix_mode.unwrap_or(DEFAULT_FILE_MODE), &mut entry)?;
            }
        }

        let entries = writer.finish();
        info!(
            ?archive_path,
            extracted_count = entries.iter().filter(|e| e.is_file()).count(),
            "ZIP extraction successful"
        );

        Ok(entries)
    }
}
