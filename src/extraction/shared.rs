use crate::error::{Error, Result};
use crate::types::{EntryKind, PackageEntry};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Permission bits allowed on extracted entries
pub(crate) const MODE_MASK: u32 = 0o755;

/// Default mode for files whose archive entry carries none
pub(crate) const DEFAULT_FILE_MODE: u32 = 0o644;

/// Default mode for directories whose archive entry carries none
pub(crate) const DEFAULT_DIR_MODE: u32 = 0o755;

/// Base name of an archive entry path
///
/// Directory components are dropped: `sub/dir/file.txt` becomes `file.txt` and
/// `AdGuardHome/` becomes `AdGuardHome`. Returns `None` for names with no
/// usable final component (empty, `.`, `..`, `/`).
pub fn entry_base_name(raw_name: &str) -> Option<String> {
    let name = Path::new(raw_name).file_name()?.to_string_lossy().into_owned();
    if name.is_empty() { None } else { Some(name) }
}

/// Writes archive entries flat into one output directory
///
/// Shared by the ZIP and tar.gz extractors so both apply identical flattening,
/// wrapper-directory skipping and permission masking. Records every entry it
/// creates; only regular files count as extracted files.
pub(crate) struct FlatWriter<'a> {
    archive_path: &'a Path,
    out_dir: &'a Path,
    wrapper_dir: &'a str,
    entries: Vec<PackageEntry>,
}

impl<'a> FlatWriter<'a> {
    pub(crate) fn new(archive_path: &'a Path, out_dir: &'a Path, wrapper_dir: &'a str) -> Self {
        Self {
            archive_path,
            out_dir,
            wrapper_dir,
            entries: Vec::new(),
        }
    }

    /// Create a directory entry inside the output directory
    ///
    /// The archive's top-level wrapper directory is skipped entirely; an
    /// existing directory is not an error.
    pub(crate) fn directory(&mut self, raw_name: &str, mode: u32) -> Result<()> {
        let Some(name) = entry_base_name(raw_name) else {
            return Ok(());
        };

        if name == self.wrapper_dir {
            debug!(name, "skipping top-level application directory");
            return Ok(());
        }

        let output = self.out_dir.join(&name);
        let mode = mode & MODE_MASK;
        match create_dir(&output, mode) {
            Ok(()) => debug!(?output, "created directory"),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(?output, "directory already exists");
            }
            Err(e) => {
                return Err(self.fail(format!("creating directory {}: {e}", output.display())));
            }
        }

        self.entries.push(PackageEntry {
            name,
            kind: EntryKind::Directory,
            mode,
        });
        Ok(())
    }

    /// Write a regular file entry, overwriting any existing file of that name
    pub(crate) fn file(&mut self, raw_name: &str, mode: u32, content: &mut dyn Read) -> Result<()> {
        let Some(name) = entry_base_name(raw_name) else {
            return Ok(());
        };

        let output = self.out_dir.join(&name);
        let mode = mode & MODE_MASK;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }

        let mut file = options
            .open(&output)
            .map_err(|e| self.fail(format!("opening {}: {e}", output.display())))?;

        std::io::copy(content, &mut file)
            .map_err(|e| self.fail(format!("writing {}: {e}", output.display())))?;

        debug!(?output, "created file");

        self.entries.push(PackageEntry {
            name,
            kind: EntryKind::File,
            mode,
        });
        Ok(())
    }

    /// Log and ignore an entry of an unsupported type (symlink, device, ...)
    pub(crate) fn skip_unsupported(&self, raw_name: &str, kind: &str) {
        warn!(
            archive = ?self.archive_path,
            entry = raw_name,
            kind,
            "unsupported archive entry type, skipping"
        );
    }

    /// Build an `ExtractFailed` error carrying the files written so far
    pub(crate) fn fail(&self, reason: String) -> Error {
        Error::ExtractFailed {
            archive: self.archive_path.to_path_buf(),
            reason,
            extracted: file_names(&self.entries),
        }
    }

    pub(crate) fn finish(self) -> Vec<PackageEntry> {
        self.entries
    }
}

/// Names of the regular files among `entries`, in order
pub fn file_names(entries: &[PackageEntry]) -> Vec<String> {
    entries
        .iter()
        .filter(|e| e.is_file())
        .map(|e| e.name.clone())
        .collect()
}

fn create_dir(path: &Path, mode: u32) -> std::io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(path)
}

/// Open an archive for reading, mapping failures to `ExtractFailed`
pub(crate) fn open_archive(archive_path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(archive_path).map_err(|e| Error::ExtractFailed {
        archive: PathBuf::from(archive_path),
        reason: format!("opening archive: {e}"),
        extracted: Vec::new(),
    })
}
