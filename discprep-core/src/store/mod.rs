// ============================================================================
// discprep-core/src/store/mod.rs
// ============================================================================
//
// METADATA STORE: Disc Registry and Review Layout API
//
// The metadata store holds one record per disc (keyed by fingerprint) and, per
// disc, a "metadata layout": the list of titles and tracks a human reviewer
// curates before transcoding starts. The MetadataStore trait is the seam;
// HttpMetadataStore is the production implementation.
//
// Status conventions shared by every implementation:
// - 200/201 on create  -> PublishOutcome::Created
// - 409 on create      -> PublishOutcome::AlreadyExists
// - 404 on lookup      -> Ok(None)
// - network failures   -> CoreError::StoreUnavailable
// - other statuses     -> CoreError::StoreResponse

pub mod http;

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::model::{AudioTrack, MovieIdentity, SubtitleTrack, Title};
use crate::selection::{AudioPolicy, AudioQuality};

pub use http::HttpMetadataStore;

/// Result of an idempotent create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Created,
    AlreadyExists,
}

/// A disc as known to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub checksum: Option<String>,
}

/// Payload registering a new disc.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDisc {
    pub disc_label: String,
    pub disc_type: String,
    pub checksum: String,
    pub imdb_id: Option<String>,
    pub title: String,
    pub year: String,
}

/// Payload creating a metadata layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutRequest {
    /// Content kind ("movie"); not the physical disc type.
    pub disc_type: String,
    pub imdb_id: Option<String>,
    pub title: String,
    pub year: String,
}

impl LayoutRequest {
    pub fn movie(identity: &MovieIdentity) -> Self {
        Self {
            disc_type: "movie".to_string(),
            imdb_id: identity.imdb_id.clone(),
            title: identity.title.clone(),
            year: identity.year.clone(),
        }
    }
}

/// Review status of a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutStatus {
    #[serde(default)]
    pub status: Option<String>,
}

impl LayoutStatus {
    pub fn is_ready(&self) -> bool {
        self.status.as_deref() == Some("ready")
    }
}

/// One title of a stored layout, as edited by the reviewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutItem {
    pub id: i64,
    pub title_index: u32,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub output_filename: Option<String>,
    #[serde(default)]
    pub source_file: Option<String>,
    #[serde(default)]
    pub audio_tracks: Vec<AudioTrack>,
    #[serde(default)]
    pub subtitle_tracks: Vec<SubtitleTrack>,
}

/// Per-user preferences stored server side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub include_commentary: Option<bool>,
    #[serde(default)]
    pub audio_quality_preference: Option<String>,
}

impl UserSettings {
    /// Overlays the stored preferences on a local default policy.
    pub fn apply_to(&self, base: AudioPolicy) -> AudioPolicy {
        AudioPolicy {
            quality: self
                .audio_quality_preference
                .as_deref()
                .map(AudioQuality::from_str_lossy)
                .unwrap_or(base.quality),
            include_commentary: self.include_commentary.unwrap_or(base.include_commentary),
        }
    }
}

/// Operations the pipeline needs from the metadata store.
pub trait MetadataStore {
    /// Looks up a disc by fingerprint; `Ok(None)` when unknown.
    fn lookup_disc(&self, checksum: &str) -> CoreResult<Option<DiscRecord>>;

    fn create_disc(&self, disc: &NewDisc) -> CoreResult<PublishOutcome>;

    /// Moves a record from an old fingerprint to a new one.
    fn rekey_disc(&self, old_checksum: &str, new_checksum: &str) -> CoreResult<()>;

    /// Adds the disc to the authenticated user's collection. No-op without a token.
    fn link_disc(&self, checksum: &str) -> CoreResult<()>;

    fn create_layout(&self, checksum: &str, layout: &LayoutRequest) -> CoreResult<PublishOutcome>;

    fn layout_status(&self, checksum: &str) -> CoreResult<LayoutStatus>;

    fn list_items(&self, checksum: &str) -> CoreResult<Vec<LayoutItem>>;

    fn create_item(&self, checksum: &str, title: &Title) -> CoreResult<PublishOutcome>;

    fn update_item_audio(&self, item_id: i64, audio_tracks: &[AudioTrack]) -> CoreResult<()>;

    fn delete_item(&self, item_id: i64) -> CoreResult<()>;

    /// Stored user preferences, or `None` when unauthenticated or unavailable.
    fn user_settings(&self) -> CoreResult<Option<UserSettings>>;

    /// Liveness probe.
    fn health(&self) -> CoreResult<()>;
}
