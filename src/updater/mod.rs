//! Update orchestration
//!
//! [`Updater`] runs the pipeline `Resolving → Downloading → Extracting →
//! BackingUp → Replacing` under one exclusive lock. Each stage consumes the
//! previous stage's output; the first error aborts the run, is wrapped with
//! the stage it happened in and returned unchanged otherwise. Nothing is
//! retried and nothing is rolled back.

mod cleanup;


pub use cleanup::clean_staging;

use crate::backup::run_backup_stage;
use crate::config::UpdaterConfig;
use crate::download::download_package;
use crate::error::{Error, Result};
use crate::extraction::{file_names, unpack};
use crate::replace::run_replace_stage;
use crate::session::UpdateSession;
use crate::types::{UpdateEvent, UpdateReport, UpdateStage, VersionCheck};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, RwLockWriteGuard, broadcast, watch};
use tracing::{debug, error, info};

/// Capacity of the event channel; slow subscribers lose the oldest events
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// State shared between the pipeline and the read-only accessors
#[derive(Debug, Default)]
struct SharedState {
    version_check_url: String,
    last_check: VersionCheck,
}

/// Self-updater for an installed executable (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Updater {
    config: Arc<UpdaterConfig>,
    client: reqwest::Client,
    /// Single-flight guard: held for a whole update, never by the accessors
    running: Arc<Mutex<()>>,
    /// Held exclusively for a whole update; shared by the accessors
    state: Arc<RwLock<SharedState>>,
    stage_tx: Arc<watch::Sender<UpdateStage>>,
    event_tx: broadcast::Sender<UpdateEvent>,
}

impl Updater {
    /// Create an updater from the host's configuration and HTTP client
    ///
    /// # Example
    ///
    /// ```no_run
    /// use meta_updater::{Updater, UpdaterConfig};
    ///
    /// # async fn example() -> meta_updater::Result<()> {
    /// let config = UpdaterConfig {
    ///     package_url: "https://example.com/dl/AdGuardHome_linux_amd64.tar.gz".into(),
    ///     version_check_url: "https://example.com/version.json".into(),
    ///     ..Default::default()
    /// };
    /// let updater = Updater::new(config, reqwest::Client::new())?;
    /// updater.update(false).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: UpdaterConfig, client: reqwest::Client) -> Result<Self> {
        config.validate()?;

        let state = SharedState {
            version_check_url: config.version_check_url.clone(),
            last_check: VersionCheck::default(),
        };
        let (stage_tx, _) = watch::channel(UpdateStage::Idle);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config: Arc::new(config),
            client,
            running: Arc::new(Mutex::new(())),
            state: Arc::new(RwLock::new(state)),
            stage_tx: Arc::new(stage_tx),
            event_tx,
        })
    }

    /// Run the update pipeline
    ///
    /// Waits for any update already in progress to finish first. If
    /// `first_run` is true the main configuration file is assumed not to exist
    /// yet and is not backed up.
    pub async fn update(&self, first_run: bool) -> Result<UpdateReport> {
        let _running = self.running.lock().await;
        let guard = self.state.write().await;
        self.run_exclusive(guard, first_run).await
    }

    /// Run the update pipeline unless another update is in progress
    ///
    /// Returns [`Error::UpdateInProgress`] instead of waiting for another
    /// update. Readers of the shared state are still waited for.
    pub async fn try_update(&self, first_run: bool) -> Result<UpdateReport> {
        let _running = self
            .running
            .try_lock()
            .map_err(|_| Error::UpdateInProgress)?;
        let guard = self.state.write().await;
        self.run_exclusive(guard, first_run).await
    }

    /// The configured version-check URL
    ///
    /// Shares the lock with other readers but waits for a running update.
    pub async fn version_check_url(&self) -> String {
        self.state.read().await.version_check_url.clone()
    }

    /// Remember the outcome of a version check performed by the host
    pub async fn record_version_check(&self, error: Option<String>) {
        let mut state = self.state.write().await;
        state.last_check = VersionCheck {
            checked_at: Some(Utc::now()),
            error,
        };
    }

    /// The outcome of the most recent recorded version check
    pub async fn last_version_check(&self) -> VersionCheck {
        self.state.read().await.last_check.clone()
    }

    /// Stage of the current (or most recent) run, readable without the lock
    pub fn current_stage(&self) -> UpdateStage {
        *self.stage_tx.borrow()
    }

    /// Subscribe to update events
    pub fn subscribe(&self) -> broadcast::Receiver<UpdateEvent> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// Body of one run; `_guard` keeps every other update and accessor out
    /// until this returns, on every exit path
    async fn run_exclusive(
        &self,
        _guard: RwLockWriteGuard<'_, SharedState>,
        first_run: bool,
    ) -> Result<UpdateReport> {
        info!(
            version = %self.config.version,
            channel = %self.config.channel,
            os = %self.config.target.os,
            arch = %self.config.target.arch,
            "updater: updating"
        );

        self.enter(UpdateStage::Resolving);
        let session = match UpdateSession::resolve(&self.config) {
            Ok(session) => session,
            Err(e) => return Err(self.fail(e.in_stage(UpdateStage::Resolving))),
        };
        let staging_dir = session.staging_dir.clone();

        let result = self.run_stages(session, first_run).await;

        let staging_cleaned = if self.config.cleanup_staging {
            clean_staging(&staging_dir).await
        } else {
            debug!(?staging_dir, "leaving staging directory in place");
            false
        };

        match result {
            Ok(session) => {
                self.enter(UpdateStage::Done);
                self.event_tx
                    .send(UpdateEvent::Completed {
                        files: session.unpacked_files.clone(),
                    })
                    .ok();
                info!(exe = ?session.current_exe, "updater: finished");

                Ok(UpdateReport {
                    session,
                    strategy: self.config.strategy(),
                    staging_cleaned,
                })
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// The stages after path resolution, threading the session through
    async fn run_stages(
        &self,
        mut session: UpdateSession,
        first_run: bool,
    ) -> Result<UpdateSession> {
        self.enter(UpdateStage::Downloading);
        download_package(
            &self.client,
            &session,
            self.config.max_package_size,
            self.config.download_timeout,
        )
        .await
        .map_err(|e| e.in_stage(UpdateStage::Downloading))?;

        self.enter(UpdateStage::Extracting);
        let entries = unpack(
            &session.package_name,
            &session.package_path,
            &session.staging_dir,
            &self.config.app_name,
        )
        .await
        .map_err(|e| e.in_stage(UpdateStage::Extracting))?;
        session.unpacked_files = file_names(&entries);
        debug!(files = ?session.unpacked_files, "package unpacked");

        self.enter(UpdateStage::BackingUp);
        run_backup_stage(&session, &self.config, first_run)
            .await
            .map_err(|e| e.in_stage(UpdateStage::BackingUp))?;

        self.enter(UpdateStage::Replacing);
        run_replace_stage(&session, &self.config, self.config.strategy())
            .await
            .map_err(|e| e.in_stage(UpdateStage::Replacing))?;

        Ok(session)
    }

    fn enter(&self, stage: UpdateStage) {
        self.stage_tx.send_replace(stage);
        if !stage.is_terminal() {
            info!(%stage, "updater: entering stage");
            self.event_tx.send(UpdateEvent::StageStarted { stage }).ok();
        }
    }

    fn fail(&self, e: Error) -> Error {
        let stage = e.stage().unwrap_or(UpdateStage::Failed);
        self.stage_tx.send_replace(UpdateStage::Failed);
        self.event_tx
            .send(UpdateEvent::Failed {
                stage,
                error: e.to_string(),
            })
            .ok();
        error!(%stage, error = %e, "updater: failed");
        e
    }
}
