//! Domain types shared by the scanner, classifier, selector and store client.
//!
//! The serialized field names follow the metadata store's schema, which is why a
//! few raw codec fields carry a `serde(rename)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Physical disc format, detected from the volume's top-level layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscType {
    #[serde(rename = "DVD")]
    Dvd,
    #[serde(rename = "BLURAY")]
    BluRay,
}

impl DiscType {
    /// Upper-case spelling used by the store and by historical fingerprints.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscType::Dvd => "DVD",
            DiscType::BluRay => "BLURAY",
        }
    }

    /// Marker directory at the volume root that identifies this format.
    pub fn marker_dir(&self) -> &'static str {
        match self {
            DiscType::Dvd => "VIDEO_TS",
            DiscType::BluRay => "BDMV",
        }
    }
}

impl fmt::Display for DiscType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dvd" => Ok(DiscType::Dvd),
            "bluray" | "blu-ray" | "bd" => Ok(DiscType::BluRay),
            other => Err(CoreError::InvalidConfig(format!("unknown disc type '{other}'"))),
        }
    }
}

/// One playable content unit discovered on the disc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub title_index: u32,
    pub name: Option<String>,
    /// Raw `HH:MM:SS` string as reported by the scanner.
    pub length: Option<String>,
    pub duration_seconds: Option<u64>,
    /// Raw size string as reported by the scanner, e.g. "4.3 GB".
    pub size: Option<String>,
    pub size_bytes: Option<u64>,
    pub source_file: Option<String>,
    #[serde(default)]
    pub audio_tracks: Vec<AudioTrack>,
    #[serde(default)]
    pub subtitle_tracks: Vec<SubtitleTrack>,
}

/// An audio stream of a title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrack {
    pub stream_index: u32,
    pub language_code: String,
    pub language_name: String,
    /// Raw codec id (`A_TRUEHD`, `A_DTS-HD.MA`, ...).
    #[serde(rename = "codec_format")]
    pub codec_id: String,
    /// Composed human readable codec, e.g. "Dolby TrueHD Atmos 7.1".
    pub codec_name: String,
    pub channel_format: String,
    #[serde(default)]
    pub name: String,
    pub is_atmos: bool,
    pub is_commentary: bool,
    pub is_default: bool,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_range: Option<f64>,
}

/// A subtitle stream of a title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub stream_index: u32,
    pub language_code: String,
    pub language_name: String,
    /// Raw codec id (`S_HDMV/PGS`, `S_VOBSUB`, ...).
    #[serde(rename = "codec_name")]
    pub codec_id: String,
    pub codec_format: SubtitleFormat,
    #[serde(default)]
    pub name: String,
    pub is_forced: bool,
    pub is_sdh: bool,
    pub is_commentary: bool,
    pub is_default: bool,
    pub enabled: bool,
}

/// Subtitle encoding family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubtitleFormat {
    Pgs,
    Srt,
    Ass,
    VobSub,
    Text,
    /// Unclassified codec, carrying the scanner's short name or raw id.
    Other(String),
    Unknown,
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubtitleFormat::Pgs => f.write_str("PGS"),
            SubtitleFormat::Srt => f.write_str("SRT"),
            SubtitleFormat::Ass => f.write_str("ASS"),
            SubtitleFormat::VobSub => f.write_str("VobSub"),
            SubtitleFormat::Text => f.write_str("Text"),
            SubtitleFormat::Other(raw) => f.write_str(raw),
            SubtitleFormat::Unknown => f.write_str("Unknown"),
        }
    }
}

impl From<String> for SubtitleFormat {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PGS" => SubtitleFormat::Pgs,
            "SRT" => SubtitleFormat::Srt,
            "ASS" => SubtitleFormat::Ass,
            "VobSub" => SubtitleFormat::VobSub,
            "Text" => SubtitleFormat::Text,
            "Unknown" | "" => SubtitleFormat::Unknown,
            _ => SubtitleFormat::Other(s),
        }
    }
}

impl From<SubtitleFormat> for String {
    fn from(format: SubtitleFormat) -> Self {
        format.to_string()
    }
}

/// Movie identity attached to a disc record; supplied by the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieIdentity {
    pub title: String,
    pub year: String,
    pub imdb_id: Option<String>,
}
