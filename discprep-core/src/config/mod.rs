//! Configuration structures and constants for the discprep-core library.
//!
//! This module provides the configuration for a rip: external tool paths, the
//! metadata store endpoint, working directories, retry and polling behavior,
//! and the audio selection policy.

mod builder;

use std::path::PathBuf;
use std::time::Duration;

pub use builder::RipConfigBuilder;

use crate::error::{CoreError, CoreResult};
use crate::selection::AudioPolicy;

// Default constants

/// Default path of the MakeMKV console binary.
pub const DEFAULT_MAKEMKV_PATH: &str = "makemkvcon";

/// Default path of the HandBrake command-line transcoder.
pub const DEFAULT_HANDBRAKE_PATH: &str = "HandBrakeCLI";

/// Default path of ffmpeg, used for the optional loudness analysis.
pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";

/// Default base URL of the metadata store API.
pub const DEFAULT_STORE_URL: &str = "http://localhost:8000/api";

/// Default root under which optical volumes are mounted.
pub const DEFAULT_VOLUMES_ROOT: &str = "/Volumes";

/// Default MakeMKV disc index (`disc:0`).
pub const DEFAULT_DISC_INDEX: u32 = 0;

/// Default HandBrake preset for DVD sources.
pub const DEFAULT_DVD_PRESET: &str = "HQ 720p30 Surround";

/// Default HandBrake preset for Blu-ray sources.
pub const DEFAULT_BLURAY_PRESET: &str = "HQ 1080p30 Surround";

/// Default number of scan/rip attempts before a read error becomes fatal.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Seconds to wait for an ejected disc to be reinserted (one poll per second).
pub const DEFAULT_REINSERT_TIMEOUT_SECS: u64 = 60;

/// Seconds between ready-status polls while a layout awaits review.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

/// Seconds allowed for the MakeMKV info scan.
pub const DEFAULT_INFO_TIMEOUT_SECS: u64 = 180;

/// Main configuration structure for the discprep-core library.
///
/// Built once by the consumer (normally discprep-cli) through
/// [`RipConfigBuilder`] and passed by reference; nothing mutates it afterwards.
///
/// # Examples
///
/// ```rust,no_run
/// use discprep_core::config::RipConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = RipConfigBuilder::new()
///     .temp_dir(PathBuf::from("/tmp/discprep"))
///     .movies_dir(PathBuf::from("/media/movies"))
///     .store_url("http://nas.local:8000/api")
///     .max_retries(5)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct RipConfig {
    /// MakeMKV console binary
    pub makemkv_path: PathBuf,

    /// HandBrake CLI binary
    pub handbrake_path: PathBuf,

    /// ffmpeg binary for loudness analysis
    pub ffmpeg_path: PathBuf,

    /// Base URL of the metadata store API, without trailing slash
    pub store_url: String,

    /// Optional bearer token for the metadata store
    pub user_token: Option<String>,

    /// Base directory for per-disc working directories
    pub temp_dir: PathBuf,

    /// Directory where transcoded movies are written
    pub movies_dir: PathBuf,

    /// Root under which optical volumes are mounted
    pub volumes_root: PathBuf,

    /// MakeMKV disc index
    pub disc_index: u32,

    pub dvd_preset: String,
    pub bluray_preset: String,

    /// Attempts before a persistent read error is fatal
    pub max_retries: u32,

    /// Seconds to wait for the disc to come back after an eject
    pub reinsert_timeout_secs: u64,

    /// Seconds between ready polls
    pub poll_interval_secs: u64,

    /// Seconds allowed for the info scan
    pub info_timeout_secs: u64,

    /// Which audio tracks start enabled
    pub audio_policy: AudioPolicy,

    /// Run ffmpeg loudness analysis on ripped audio streams
    pub analyze_loudness: bool,

    /// Optional ntfy.sh topic URL for sending notifications
    pub ntfy_topic: Option<String>,
}

impl Default for RipConfig {
    fn default() -> Self {
        Self {
            makemkv_path: PathBuf::from(DEFAULT_MAKEMKV_PATH),
            handbrake_path: PathBuf::from(DEFAULT_HANDBRAKE_PATH),
            ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG_PATH),
            store_url: DEFAULT_STORE_URL.to_string(),
            user_token: None,
            temp_dir: std::env::temp_dir().join("discprep"),
            movies_dir: PathBuf::from("."),
            volumes_root: PathBuf::from(DEFAULT_VOLUMES_ROOT),
            disc_index: DEFAULT_DISC_INDEX,
            dvd_preset: DEFAULT_DVD_PRESET.to_string(),
            bluray_preset: DEFAULT_BLURAY_PRESET.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            reinsert_timeout_secs: DEFAULT_REINSERT_TIMEOUT_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            info_timeout_secs: DEFAULT_INFO_TIMEOUT_SECS,
            audio_policy: AudioPolicy::default(),
            analyze_loudness: false,
            ntfy_topic: None,
        }
    }
}

impl RipConfig {
    /// Validates the configuration.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the configuration is usable
    /// * `Err(CoreError::InvalidConfig)` - Naming the first offending field
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_retries == 0 {
            return Err(CoreError::InvalidConfig(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.info_timeout_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "info_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if !(self.store_url.starts_with("http://") || self.store_url.starts_with("https://")) {
            return Err(CoreError::InvalidConfig(format!(
                "store_url must be an http(s) URL, got '{}'",
                self.store_url
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn info_timeout(&self) -> Duration {
        Duration::from_secs(self.info_timeout_secs)
    }

    /// Working directory for one disc: `<temp_dir>/<short fingerprint>`.
    pub fn disc_work_dir(&self, short_fingerprint: &str) -> PathBuf {
        self.temp_dir.join(short_fingerprint)
    }

    /// HandBrake preset for the given disc type.
    pub fn preset_for(&self, disc_type: crate::model::DiscType) -> &str {
        match disc_type {
            crate::model::DiscType::Dvd => &self.dvd_preset,
            crate::model::DiscType::BluRay => &self.bluray_preset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DiscType;

    #[test]
    fn default_config_is_valid() {
        assert!(RipConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_retries() {
        let config = RipConfig {
            max_retries: 0,
            ..RipConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let config = RipConfig {
            poll_interval_secs: 0,
            ..RipConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_store() {
        let config = RipConfig {
            store_url: "ftp://nas/api".to_string(),
            ..RipConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn preset_follows_disc_type() {
        let config = RipConfig::default();
        assert_eq!(config.preset_for(DiscType::Dvd), DEFAULT_DVD_PRESET);
        assert_eq!(config.preset_for(DiscType::BluRay), DEFAULT_BLURAY_PRESET);
    }
}
