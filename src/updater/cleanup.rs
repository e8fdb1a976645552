//! Staging directory removal

use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// Remove the staging directory and everything in it
///
/// Best effort: failures are logged, never returned. Returns whether the
/// directory is gone afterwards.
pub async fn clean_staging(staging_dir: &Path) -> bool {
    match tokio::fs::remove_dir_all(staging_dir).await {
        Ok(()) => {
            debug!(?staging_dir, "removed staging directory");
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(?staging_dir, "staging directory already absent");
            true
        }
        Err(e) => {
            warn!(?staging_dir, error = %e, "failed to remove staging directory");
            false
        }
    }
}
