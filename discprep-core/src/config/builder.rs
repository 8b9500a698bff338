// ============================================================================
// discprep-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for RipConfig
//
// Fluent construction of RipConfig. Every field starts at its DEFAULT_*
// value; the CLI overrides the ones given as flags or environment variables.

use std::path::PathBuf;

use super::RipConfig;
use crate::selection::AudioPolicy;

/// Builder for creating RipConfig instances.
///
/// # Examples
///
/// ```rust
/// use discprep_core::config::RipConfigBuilder;
/// use discprep_core::selection::{AudioPolicy, AudioQuality};
///
/// let config = RipConfigBuilder::new()
///     .store_url("http://nas.local:8000/api/")
///     .audio_policy(AudioPolicy { quality: AudioQuality::Lossless, include_commentary: true })
///     .build();
/// assert_eq!(config.store_url, "http://nas.local:8000/api");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RipConfigBuilder {
    config: RipConfig,
}

impl RipConfigBuilder {
    /// Creates a new RipConfigBuilder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn makemkv_path(mut self, path: PathBuf) -> Self {
        self.config.makemkv_path = path;
        self
    }

    pub fn handbrake_path(mut self, path: PathBuf) -> Self {
        self.config.handbrake_path = path;
        self
    }

    pub fn ffmpeg_path(mut self, path: PathBuf) -> Self {
        self.config.ffmpeg_path = path;
        self
    }

    /// Sets the metadata store base URL.
    ///
    /// # Arguments
    ///
    /// * `url` - Base URL; a trailing slash is removed
    ///
    /// # Returns
    ///
    /// * Self for method chaining
    pub fn store_url(mut self, url: &str) -> Self {
        self.config.store_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn user_token(mut self, token: &str) -> Self {
        self.config.user_token = Some(token.to_string()).filter(|t| !t.is_empty());
        self
    }

    pub fn temp_dir(mut self, dir: PathBuf) -> Self {
        self.config.temp_dir = dir;
        self
    }

    pub fn movies_dir(mut self, dir: PathBuf) -> Self {
        self.config.movies_dir = dir;
        self
    }

    pub fn volumes_root(mut self, dir: PathBuf) -> Self {
        self.config.volumes_root = dir;
        self
    }

    pub fn disc_index(mut self, index: u32) -> Self {
        self.config.disc_index = index;
        self
    }

    pub fn dvd_preset(mut self, preset: &str) -> Self {
        self.config.dvd_preset = preset.to_string();
        self
    }

    pub fn bluray_preset(mut self, preset: &str) -> Self {
        self.config.bluray_preset = preset.to_string();
        self
    }

    /// Sets how many attempts a scan or rip gets before a read error is fatal.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn reinsert_timeout_secs(mut self, secs: u64) -> Self {
        self.config.reinsert_timeout_secs = secs;
        self
    }

    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.config.poll_interval_secs = secs;
        self
    }

    pub fn info_timeout_secs(mut self, secs: u64) -> Self {
        self.config.info_timeout_secs = secs;
        self
    }

    pub fn audio_policy(mut self, policy: AudioPolicy) -> Self {
        self.config.audio_policy = policy;
        self
    }

    pub fn analyze_loudness(mut self, enabled: bool) -> Self {
        self.config.analyze_loudness = enabled;
        self
    }

    /// Sets the ntfy topic URL; an empty string leaves notifications off.
    pub fn ntfy_topic(mut self, topic: &str) -> Self {
        self.config.ntfy_topic = Some(topic.to_string()).filter(|t| !t.is_empty());
        self
    }

    /// Builds the RipConfig. Call [`RipConfig::validate`] before use.
    pub fn build(self) -> RipConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::AudioQuality;

    #[test]
    fn builder_overrides_defaults() {
        let config = RipConfigBuilder::new()
            .disc_index(1)
            .max_retries(5)
            .poll_interval_secs(10)
            .audio_policy(AudioPolicy {
                quality: AudioQuality::Lossy,
                include_commentary: true,
            })
            .build();

        assert_eq!(config.disc_index, 1);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.audio_policy.quality, AudioQuality::Lossy);
        assert_eq!(config.reinsert_timeout_secs, super::super::DEFAULT_REINSERT_TIMEOUT_SECS);
    }

    #[test]
    fn empty_optional_strings_stay_unset() {
        let config = RipConfigBuilder::new().user_token("").ntfy_topic("").build();
        assert!(config.user_token.is_none());
        assert!(config.ntfy_topic.is_none());
    }
}
