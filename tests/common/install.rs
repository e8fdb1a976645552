//! A live installation in a temp dir and the server that updates it

use meta_updater::UpdaterConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::write_release;

/// Contents of the installation before any update
pub const OLD_BINARY: &[u8] = b"old-binary";
pub const OLD_README: &[u8] = b"old readme";
pub const LIVE_CONFIG: &[u8] = b"live config";

/// A temp-dir installation of the application
pub struct TestInstall {
    pub dir: TempDir,
    pub server: MockServer,
    pub config: UpdaterConfig,
}

impl TestInstall {
    /// Install the old version and serve the release as `package_name`
    pub async fn new(package_name: &str) -> Self {
        Self::with_delay(package_name, None).await
    }

    /// Like [`TestInstall::new`], delaying every package response by `delay`
    pub async fn with_delay(package_name: &str, delay: Option<Duration>) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");

        let archive = dir.path().join(format!("upstream-{package_name}"));
        write_release(&archive);

        let server = MockServer::start().await;
        let mut response = ResponseTemplate::new(200)
            .set_body_bytes(std::fs::read(&archive).expect("Failed to read archive"));
        if let Some(delay) = delay {
            response = response.set_delay(delay);
        }
        Mock::given(method("GET"))
            .and(path(format!("/releases/latest/{package_name}")))
            .respond_with(response)
            .mount(&server)
            .await;

        let work = dir.path().join("opt");
        std::fs::create_dir(&work).expect("Failed to create work dir");
        std::fs::write(work.join("AdGuardHome.exe"), OLD_BINARY).expect("Failed to write exe");
        std::fs::write(work.join("README.md"), OLD_README).expect("Failed to write readme");
        std::fs::write(work.join("AdGuardHome.yaml"), LIVE_CONFIG).expect("Failed to write config");

        let mut config = UpdaterConfig {
            version: "v0.107.0".into(),
            package_url: format!("{}/releases/latest/{package_name}", server.uri()),
            version_check_url: format!("{}/version.json", server.uri()),
            executable_path: Some(work.join("AdGuardHome.exe")),
            ..Default::default()
        };
        config.target.os = "windows".into();
        config.target.arch = "amd64".into();

        Self {
            dir,
            server,
            config,
        }
    }

    /// The installation's working directory
    pub fn work_dir(&self) -> PathBuf {
        self.dir.path().join("opt")
    }

    /// Read a file relative to the working directory
    pub fn read(&self, relative: impl AsRef<Path>) -> Vec<u8> {
        std::fs::read(self.work_dir().join(relative)).expect("Failed to read file")
    }
}
