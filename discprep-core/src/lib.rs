//! Core library for preparing optical movie discs for transcoding.
//!
//! This crate fingerprints a mounted DVD or Blu-ray, parses MakeMKV's robot
//! output into typed titles and tracks, pre-selects the audio to keep, rips
//! with read-error recovery, and hands the result to a metadata store where a
//! reviewer finalizes the layout.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use discprep_core::{RipConfigBuilder, ScanRunner, RunnerSettings};
//! use discprep_core::external::{MakemkvSpawner, SystemDrive};
//! use discprep_core::runner::info_args;
//! use std::path::PathBuf;
//!
//! let config = RipConfigBuilder::new()
//!     .temp_dir(PathBuf::from("/tmp/discprep"))
//!     .build();
//! config.validate().unwrap();
//!
//! let disc = discprep_core::find_disc(&config.volumes_root).unwrap();
//! let spawner = MakemkvSpawner::new(&config.makemkv_path);
//! let drive = SystemDrive;
//! let runner = ScanRunner::new(&spawner, &drive, RunnerSettings::from_config(&config));
//!
//! let mut lines = Vec::new();
//! runner
//!     .run(
//!         &info_args(config.disc_index),
//!         Some(&disc.path),
//!         Some(config.info_timeout()),
//!         |line| lines.push(line.to_string()),
//!     )
//!     .unwrap();
//!
//! let titles = discprep_core::scan::parse(&lines).unwrap();
//! println!("{} titles", titles.len());
//! ```

pub mod classify;
pub mod config;
pub mod discovery;
pub mod error;
pub mod external;
pub mod fingerprint;
pub mod handoff;
pub mod model;
pub mod notifications;
pub mod runner;
pub mod scan;
pub mod selection;
pub mod store;
pub mod utils;

// Re-exports for public API
pub use config::{RipConfig, RipConfigBuilder};
pub use discovery::{DiscVolume, find_disc, find_disc_volumes, find_title_file};
pub use error::{CoreError, CoreResult};
pub use fingerprint::{DiscFingerprint, FingerprintResolution, Resolution, fingerprint, resolve_fingerprint};
pub use handoff::{ItemsReport, MetadataHandoff};
pub use model::{AudioTrack, DiscType, MovieIdentity, SubtitleFormat, SubtitleTrack, Title};
pub use notifications::{NotificationSender, NotificationType, NtfyNotificationSender};
pub use runner::{DriveControl, RetryState, RunnerSettings, ScanProcess, ScanRunner, ScanSpawner};
pub use selection::{AudioPolicy, AudioQuality};
pub use store::{HttpMetadataStore, MetadataStore, PublishOutcome};
pub use utils::{format_bytes, format_duration};
