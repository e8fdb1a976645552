//! Bounded package download
//!
//! Fetches the release archive into memory with a hard size ceiling, then
//! writes it into the staging directory. Nothing touches the disk until the
//! whole body has been read within the limit.

use crate::error::{Error, Result};
use crate::session::UpdateSession;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Download `session.package_url` into `session.package_path`
///
/// Creates the staging directory if needed. Fails with `DownloadFailed` on a
/// network error or non-success status, `PackageTooLarge` when the body would
/// exceed `max_size`, and `StagingWriteFailed` when the file cannot be written.
pub async fn download_package(
    client: &reqwest::Client,
    session: &UpdateSession,
    max_size: u64,
    timeout: Option<Duration>,
) -> Result<u64> {
    let fetch = fetch_limited(client, &session.package_url, max_size);
    let body = match timeout {
        Some(limit) => tokio::time::timeout(limit, fetch)
            .await
            .map_err(|_| Error::DownloadFailed {
                url: session.package_url.clone(),
                reason: format!("timed out after {} seconds", limit.as_secs_f64()),
            })??,
        None => fetch.await?,
    };

    create_staging_dir(&session.staging_dir).await?;

    debug!(path = ?session.package_path, bytes = body.len(), "saving package to file");
    write_package(&session.package_path, &body).await?;

    info!(
        url = %session.package_url,
        path = ?session.package_path,
        bytes = body.len(),
        "package downloaded"
    );

    Ok(body.len() as u64)
}

/// Issue one GET and read at most `max_size` bytes of the body
pub async fn fetch_limited(client: &reqwest::Client, url: &str, max_size: u64) -> Result<Vec<u8>> {
    let mut response = client.get(url).send().await.map_err(|e| {
        let reason = if e.is_timeout() {
            format!("request timed out: {e}")
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            format!("http request failed: {e}")
        };
        Error::DownloadFailed {
            url: url.to_string(),
            reason,
        }
    })?;

    if !response.status().is_success() {
        return Err(Error::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP status {}", response.status()),
        });
    }

    if let Some(announced) = response.content_length()
        && announced > max_size
    {
        return Err(Error::PackageTooLarge {
            limit: max_size,
            received: announced,
        });
    }

    debug!(url, "reading http body");

    let mut body = Vec::new();
    loop {
        let chunk = response.chunk().await.map_err(|e| Error::DownloadFailed {
            url: url.to_string(),
            reason: format!("reading response body: {e}"),
        })?;
        let Some(chunk) = chunk else {
            break;
        };

        let received = body.len() as u64 + chunk.len() as u64;
        if received > max_size {
            return Err(Error::PackageTooLarge {
                limit: max_size,
                received,
            });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

/// Create the staging directory, tolerating an existing one
async fn create_staging_dir(dir: &Path) -> Result<()> {
    match tokio::fs::create_dir(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(source) => Err(Error::StagingWriteFailed {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

/// Write the package with executable-range permissions
async fn write_package(path: &Path, body: &[u8]) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    let staging_err = |source: std::io::Error| Error::StagingWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o755);

    let mut file = options.open(path).await.map_err(staging_err)?;
    file.write_all(body).await.map_err(staging_err)?;
    file.flush().await.map_err(staging_err)?;

    Ok(())
}
