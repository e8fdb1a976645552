//! # meta-updater
//!
//! Self-update pipeline for an installed application.
//!
//! ## Design Philosophy
//!
//! meta-updater is designed to be:
//! - **Library-first** - The host decides when to update; this crate only performs it
//! - **Fail-fast** - The first error aborts the run and names the stage it happened in
//! - **Non-destructive until the end** - Nothing live is touched before the backup exists
//! - **Event-driven** - Consumers subscribe to stage events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use meta_updater::{Updater, UpdaterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = UpdaterConfig {
//!         version: "v0.107.0".to_string(),
//!         package_url: "https://static.example.com/AdGuardHome_linux_amd64.tar.gz".to_string(),
//!         version_check_url: "https://static.example.com/version.json".to_string(),
//!         ..Default::default()
//!     };
//!
//!     let updater = Updater::new(config, reqwest::Client::new())?;
//!
//!     // Subscribe to events
//!     let mut events = updater.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = updater.update(false).await?;
//!     println!("installed {} files", report.session.unpacked_files.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Supporting-file copies and the backup stage
pub mod backup;
/// Configuration types
pub mod config;
/// Bounded package download
pub mod download;
/// Error types
pub mod error;
/// Archive extraction
pub mod extraction;
/// Executable replacement
pub mod replace;
/// Per-run paths and state
pub mod session;
/// Core types and events
pub mod types;
/// Update orchestration
pub mod updater;


// Re-export commonly used types
pub use config::{MAX_PACKAGE_FILE_SIZE, TargetPlatform, UpdaterConfig};
pub use error::{Error, ErrorKind, Result};
pub use session::UpdateSession;
pub use types::{
    ArchiveFormat, EntryKind, PackageEntry, ReplaceStrategy, UpdateEvent, UpdateReport,
    UpdateStage, VersionCheck,
};
pub use updater::Updater;
