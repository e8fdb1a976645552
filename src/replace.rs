//! Installing the new package over the live installation

use crate::backup::{SupportingFiles, copy_supporting_files};
use crate::config::UpdaterConfig;
use crate::error::{Error, Result};
use crate::session::UpdateSession;
use crate::types::ReplaceStrategy;
use std::path::Path;
use tracing::{debug, info, warn};

/// Replace the live installation with the staged one
///
/// Order matters:
/// 1. copy the supporting files staging → working directory;
/// 2. rename the running executable to the backup executable path;
/// 3. install the staged executable at the original path using `strategy`.
///
/// A failure in step 1 leaves the old executable untouched. A failure in step 3
/// leaves the executable moved to the backup directory with nothing in its
/// place; recovery is a manual restore from the backup directory.
pub async fn run_replace_stage(
    session: &UpdateSession,
    config: &UpdaterConfig,
    strategy: ReplaceStrategy,
) -> Result<()> {
    let supporting = SupportingFiles::from_config(config);
    let copied = copy_supporting_files(
        &session.unpacked_files,
        &supporting,
        &session.staging_dir,
        &session.work_dir,
    )
    .await?;
    debug!(copied = copied.len(), "supporting files installed");

    debug!(from = ?session.current_exe, to = ?session.backup_exe, "renaming");
    tokio::fs::rename(&session.current_exe, &session.backup_exe)
        .await
        .map_err(|source| Error::ReplaceFailed {
            from: session.current_exe.clone(),
            to: session.backup_exe.clone(),
            source,
        })?;

    install_executable(strategy, &session.staged_exe, &session.current_exe).await?;

    info!(
        exe = ?session.current_exe,
        ?strategy,
        "executable replaced"
    );

    Ok(())
}

/// Put the staged executable at `target`
pub async fn install_executable(
    strategy: ReplaceStrategy,
    staged: &Path,
    target: &Path,
) -> Result<()> {
    let replace_err = |source: std::io::Error| Error::ReplaceFailed {
        from: staged.to_path_buf(),
        to: target.to_path_buf(),
        source,
    };

    match strategy {
        ReplaceStrategy::AtomicMove => {
            tokio::fs::rename(staged, target).await.map_err(replace_err)?;
        }
        ReplaceStrategy::CopyThenRemove => {
            // Renaming onto an in-use binary fails on some platforms
            let data = tokio::fs::read(staged).await.map_err(replace_err)?;
            tokio::fs::write(target, data).await.map_err(replace_err)?;

            #[cfg(unix)]
            {
                let permissions = tokio::fs::metadata(staged)
                    .await
                    .map_err(replace_err)?
                    .permissions();
                tokio::fs::set_permissions(target, permissions)
                    .await
                    .map_err(replace_err)?;
            }

            if let Err(e) = tokio::fs::remove_file(staged).await {
                warn!(?staged, error = %e, "failed to remove staged executable after copy");
            }
        }
    }

    Ok(())
}
