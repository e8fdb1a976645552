use crate::error::{Error, ErrorKind};
use crate::extraction::*;
use crate::test_helpers::{Item, create_tar_gz, create_zip, release_items};
use crate::types::{ArchiveFormat, EntryKind};
use std::path::PathBuf;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build an archive of `format` in a fresh temp dir; returns (dir, archive, out_dir)
fn build(format: ArchiveFormat, items: &[Item<'_>]) -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().unwrap();
    let out_dir = dir.path().join("out");
    std::fs::create_dir(&out_dir).unwrap();
    let archive = match format {
        ArchiveFormat::Zip => {
            let path = dir.path().join("pkg.zip");
            create_zip(&path, items);
            path
        }
        ArchiveFormat::TarGz => {
            let path = dir.path().join("pkg.tar.gz");
            create_tar_gz(&path, items);
            path
        }
    };
    (dir, archive, out_dir)
}

const FORMATS: [ArchiveFormat; 2] = [ArchiveFormat::Zip, ArchiveFormat::TarGz];

// ---------------------------------------------------------------------------
// entry_base_name
// ---------------------------------------------------------------------------

#[test]
fn base_name_strips_directories() {
    assert_eq!(entry_base_name("sub/dir/file.txt").as_deref(), Some("file.txt"));
    assert_eq!(entry_base_name("AdGuardHome/").as_deref(), Some("AdGuardHome"));
    assert_eq!(entry_base_name("README.md").as_deref(), Some("README.md"));
}

#[test]
fn base_name_rejects_unusable_names() {
    assert_eq!(entry_base_name(""), None);
    assert_eq!(entry_base_name("/"), None);
    assert_eq!(entry_base_name("."), None);
    assert_eq!(entry_base_name("../"), None);
    assert_eq!(entry_base_name("a/.."), None);
}

// ---------------------------------------------------------------------------
// Behaviour shared by both formats
// ---------------------------------------------------------------------------

#[test]
fn wrapper_directory_alone_yields_nothing() {
    for format in FORMATS {
        let (_dir, archive, out_dir) = build(format, &[Item::Dir("AdGuardHome/")]);

        let entries = extract_blocking(format, &archive, &out_dir, "AdGuardHome").unwrap();

        assert!(entries.is_empty(), "{format}: got {entries:?}");
        assert!(!out_dir.join("AdGuardHome").exists(), "{format}: wrapper dir created");
    }
}

#[test]
fn nested_paths_are_flattened() {
    for format in FORMATS {
        let (_dir, archive, out_dir) =
            build(format, &[Item::File("sub/dir/file.txt", b"deep", 0o644)]);

        let entries = extract_blocking(format, &archive, &out_dir, "AdGuardHome").unwrap();

        assert_eq!(file_names(&entries), vec!["file.txt"], "{format}");
        assert_eq!(std::fs::read(out_dir.join("file.txt")).unwrap(), b"deep");
        assert!(!out_dir.join("sub").exists(), "{format}: subdirectory created");
    }
}

#[test]
fn release_layout_lists_files_in_encounter_order() {
    for format in FORMATS {
        let (_dir, archive, out_dir) = build(format, &release_items());

        let entries = extract_blocking(format, &archive, &out_dir, "AdGuardHome").unwrap();

        assert_eq!(
            file_names(&entries),
            vec!["AdGuardHome.exe", "AdGuardHome.yaml", "README.md"],
            "{format}"
        );
        assert_eq!(
            std::fs::read(out_dir.join("AdGuardHome.exe")).unwrap(),
            b"new-binary"
        );
        assert_eq!(std::fs::read(out_dir.join("README.md")).unwrap(), b"readme");
    }
}

#[test]
fn other_directories_are_created_but_not_listed_as_files() {
    for format in FORMATS {
        let (_dir, archive, out_dir) = build(
            format,
            &[
                Item::Dir("AdGuardHome/"),
                Item::Dir("AdGuardHome/data/"),
                Item::File("AdGuardHome/data/filter.txt", b"rules", 0o644),
            ],
        );

        let entries = extract_blocking(format, &archive, &out_dir, "AdGuardHome").unwrap();

        assert!(out_dir.join("data").is_dir(), "{format}: data dir missing");
        assert_eq!(file_names(&entries), vec!["filter.txt"], "{format}");
        assert_eq!(entries.len(), 2, "{format}");
        assert_eq!(entries[0].kind, EntryKind::Directory);
        assert_eq!(entries[0].name, "data");
        // Flattened: the file lands next to the directory, not inside it
        assert!(out_dir.join("filter.txt").is_file());
    }
}

#[test]
fn existing_directory_is_tolerated() {
    for format in FORMATS {
        let (_dir, archive, out_dir) = build(format, &[Item::Dir("pkg/data/")]);
        std::fs::create_dir(out_dir.join("data")).unwrap();

        let entries = extract_blocking(format, &archive, &out_dir, "AdGuardHome").unwrap();
        assert_eq!(entries.len(), 1, "{format}");
        assert!(file_names(&entries).is_empty());
    }
}

#[test]
fn existing_files_are_overwritten() {
    for format in FORMATS {
        let (_dir, archive, out_dir) = build(format, &[Item::File("README.md", b"new", 0o644)]);
        std::fs::write(out_dir.join("README.md"), b"old and longer").unwrap();

        extract_blocking(format, &archive, &out_dir, "AdGuardHome").unwrap();

        assert_eq!(std::fs::read(out_dir.join("README.md")).unwrap(), b"new");
    }
}

#[test]
fn wrapper_name_only_matters_for_directories() {
    for format in FORMATS {
        // A file that happens to carry the application name is the executable
        let (_dir, archive, out_dir) =
            build(format, &[Item::File("AdGuardHome/AdGuardHome", b"bin", 0o755)]);

        let entries = extract_blocking(format, &archive, &out_dir, "AdGuardHome").unwrap();
        assert_eq!(file_names(&entries), vec!["AdGuardHome"], "{format}");
    }
}

#[test]
fn symlinks_are_skipped() {
    for format in FORMATS {
        let (_dir, archive, out_dir) = build(
            format,
            &[
                Item::Symlink("link", "/etc/passwd"),
                Item::File("README.md", b"readme", 0o644),
            ],
        );

        let entries = extract_blocking(format, &archive, &out_dir, "AdGuardHome").unwrap();

        assert_eq!(file_names(&entries), vec!["README.md"], "{format}");
        assert!(std::fs::symlink_metadata(out_dir.join("link")).is_err());
    }
}

#[cfg(unix)]
#[test]
fn unsafe_mode_bits_are_masked() {
    use std::os::unix::fs::PermissionsExt;

    for format in FORMATS {
        let (_dir, archive, out_dir) = build(
            format,
            &[
                Item::File("setuid", b"x", 0o4777),
                Item::File("plain", b"y", 0o644),
            ],
        );

        let entries = extract_blocking(format, &archive, &out_dir, "AdGuardHome").unwrap();

        assert_eq!(entries[0].mode, 0o755, "{format}");
        assert_eq!(entries[1].mode, 0o644, "{format}");
        let mode = std::fs::metadata(out_dir.join("setuid"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o7000, 0, "{format}: special bits survived");
        assert_eq!(mode & 0o022, 0, "{format}: group/other write survived");
    }
}

#[test]
fn first_error_returns_partial_file_list() {
    for format in FORMATS {
        let (_dir, archive, out_dir) = build(
            format,
            &[
                Item::File("first.txt", b"1", 0o644),
                Item::File("blocked", b"2", 0o644),
                Item::File("never.txt", b"3", 0o644),
            ],
        );
        // A directory where a file must be written makes the open fail
        std::fs::create_dir(out_dir.join("blocked")).unwrap();

        let err = extract_blocking(format, &archive, &out_dir, "AdGuardHome").unwrap_err();

        match err {
            Error::ExtractFailed { extracted, .. } => {
                assert_eq!(extracted, vec!["first.txt"], "{format}");
            }
            other => panic!("{format}: expected ExtractFailed, got {other:?}"),
        }
        assert!(!out_dir.join("never.txt").exists(), "{format}: kept going");
    }
}

#[test]
fn directory_creation_failure_aborts() {
    for format in FORMATS {
        let (dir, archive, _out_dir) = build(
            format,
            &[
                Item::Dir("pkg/data/"),
                Item::File("pkg/README.md", b"readme", 0o644),
            ],
        );
        let missing = dir.path().join("no-such-dir");

        let err = extract_blocking(format, &archive, &missing, "AdGuardHome").unwrap_err();

        match err {
            Error::ExtractFailed {
                reason, extracted, ..
            } => {
                assert!(reason.contains("creating directory"), "{format}: {reason}");
                assert!(extracted.is_empty(), "{format}");
            }
            other => panic!("{format}: expected ExtractFailed, got {other:?}"),
        }
        assert!(!missing.exists(), "{format}");
    }
}

#[test]
fn corrupt_archive_is_extract_failure() {
    for format in FORMATS {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("broken");
        std::fs::write(&archive, b"this is not an archive at all").unwrap();

        let err = extract_blocking(format, &archive, dir.path(), "AdGuardHome").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtractFailed, "{format}");
    }
}

#[test]
fn missing_archive_is_extract_failure() {
    let dir = TempDir::new().unwrap();
    let err = extract_blocking(
        ArchiveFormat::Zip,
        &dir.path().join("absent.zip"),
        dir.path(),
        "AdGuardHome",
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExtractFailed);
}

// ---------------------------------------------------------------------------
// unpack (async dispatcher)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unpack_dispatches_on_suffix() {
    for format in FORMATS {
        let (_dir, archive, out_dir) = build(format, &release_items());
        let package_name = archive.file_name().unwrap().to_str().unwrap().to_string();

        let entries = unpack(&package_name, &archive, &out_dir, "AdGuardHome")
            .await
            .unwrap();
        assert_eq!(file_names(&entries).len(), 3, "{format}");
    }
}

#[tokio::test]
async fn unpack_rejects_unknown_suffix() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("pkg.rar");
    std::fs::write(&archive, b"Rar!").unwrap();

    let err = unpack("pkg.rar", &archive, dir.path(), "AdGuardHome")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownArchiveFormat);
}

#[tokio::test]
async fn unpack_format_follows_name_not_content() {
    // A tar.gz saved under a .zip name is decoded as ZIP and fails
    let (_dir, archive, out_dir) = build(ArchiveFormat::TarGz, &release_items());

    let err = unpack("pkg.zip", &archive, &out_dir, "AdGuardHome")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExtractFailed);
}
