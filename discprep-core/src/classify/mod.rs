// ============================================================================
// discprep-core/src/classify/mod.rs
// ============================================================================
//
// TRACK CLASSIFICATION: Raw Scan Attributes to Titles and Tracks
//
// Turns one raw title from a ScanSession into a model::Title: duration and
// size parsing, stream typing, language and codec naming, channel layout,
// Atmos detection, and the commentary/forced/SDH flags.
//
// MakeMKV's numeric attribute ids are not stable across disc types (the
// language code has been seen at id 2 as well as id 3), so stream type comes
// from the value text ("Audio", "Subtitles") and language fields are checked
// by shape before use. This is a heuristic; a third id layout would need
// another fallback here.

pub mod keywords;
pub mod tables;

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{AudioTrack, SubtitleFormat, SubtitleTrack, Title};
use crate::scan::{RawTitle, StreamAttr, StreamAttributes, TitleAttr};
use crate::utils::{parse_duration_to_seconds, parse_size_to_bytes};

use self::keywords::{
    ATMOS_KEYWORDS, COMMENTARY_KEYWORDS, FORCED_KEYWORDS, SDH_KEYWORDS, contains_any,
};

/// Only real speaker layouts, so "1.5 Mb/s" is not read as a layout.
static CHANNEL_LAYOUT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([12567]\.[012])\b").expect("valid channel layout regex"));

static BITRATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?\s*[KkMm]b/s)").expect("valid bitrate regex"));

/// What a stream carries, as far as the layout is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Audio,
    Subtitle,
    /// Video and anything unrecognised; not projected.
    Other,
}

/// Heuristic flags shared by audio and subtitle tracks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackFlags {
    pub commentary: bool,
    pub forced: bool,
    pub sdh: bool,
    pub default: bool,
}

/// Classifies one raw title. Pure and deterministic.
pub fn classify(raw: &RawTitle<'_>) -> Title {
    let attrs = raw.attributes;
    let length = attrs.get(TitleAttr::Duration).map(str::to_string);
    let size = attrs.get(TitleAttr::Size).map(str::to_string);

    let mut audio_tracks = Vec::new();
    let mut subtitle_tracks = Vec::new();

    for (stream_index, stream) in raw.streams.into_iter().flatten() {
        match stream_kind(stream) {
            StreamKind::Audio => audio_tracks.push(classify_audio(*stream_index, stream)),
            StreamKind::Subtitle => subtitle_tracks.push(classify_subtitle(*stream_index, stream)),
            StreamKind::Other => {}
        }
    }

    Title {
        title_index: raw.index,
        name: attrs.get(TitleAttr::Name).map(str::to_string),
        duration_seconds: length.as_deref().and_then(parse_duration_to_seconds),
        length,
        size_bytes: size.as_deref().and_then(parse_size_to_bytes),
        size,
        source_file: attrs.get(TitleAttr::SourceFile).map(str::to_string),
        audio_tracks,
        subtitle_tracks,
    }
}

/// Stream type from the value text of the type attribute.
pub fn stream_kind(stream: &StreamAttributes) -> StreamKind {
    let type_text = stream
        .get(StreamAttr::Type)
        .or_else(|| stream.get(StreamAttr::TypeName))
        .unwrap_or("")
        .to_lowercase();

    if type_text.contains("audio") {
        StreamKind::Audio
    } else if type_text.contains("subtitle") {
        StreamKind::Subtitle
    } else {
        StreamKind::Other
    }
}

fn looks_like_language_code(value: &str) -> bool {
    value.len() == 3 && value.chars().all(|c| c.is_ascii_lowercase())
}

/// Language code and display name, tolerating both attribute id layouts.
fn resolve_language(stream: &StreamAttributes) -> (String, String) {
    let code = [StreamAttr::LangCode, StreamAttr::TypeName]
        .into_iter()
        .filter_map(|key| stream.get(key))
        .find(|v| looks_like_language_code(v))
        .unwrap_or("und")
        .to_string();

    let reported = [StreamAttr::LangName, StreamAttr::LangCode]
        .into_iter()
        .filter_map(|key| stream.get(key))
        .find(|v| !looks_like_language_code(v));

    let name = match reported {
        Some(name) if name != "Unknown" => name.to_string(),
        _ => tables::language_name(&code)
            .map(str::to_string)
            .unwrap_or_else(|| code.to_uppercase()),
    };

    (code, name)
}

/// Detects commentary, forced and SDH markers in the stream's descriptive text.
pub fn detect_flags(stream: &StreamAttributes) -> TrackFlags {
    let combined = format!(
        "{} {} {}",
        stream.text(StreamAttr::Name),
        stream.text(StreamAttr::Extra),
        stream.text(StreamAttr::CodecShort)
    );

    TrackFlags {
        commentary: contains_any(&combined, COMMENTARY_KEYWORDS),
        forced: contains_any(&combined, FORCED_KEYWORDS),
        sdh: contains_any(&combined, SDH_KEYWORDS),
        default: false,
    }
}

/// Finds a speaker layout such as "5.1" in free text, falling back to the
/// stereo / mono / surround keywords.
pub fn detect_channel_layout(text: &str) -> Option<String> {
    if let Some(caps) = CHANNEL_LAYOUT_RE.captures(text) {
        return Some(caps[1].to_string());
    }
    let lower = text.to_lowercase();
    if lower.contains("stereo") {
        Some("2.0".to_string())
    } else if lower.contains("mono") {
        Some("1.0".to_string())
    } else if lower.contains("surround") {
        Some("5.1".to_string())
    } else {
        None
    }
}

fn format_channels(layout: &str) -> String {
    match layout {
        "5.1" | "6.1" | "7.1" => format!("{layout} Surround"),
        "2.0" => "Stereo".to_string(),
        "1.0" => "Mono".to_string(),
        other => other.to_string(),
    }
}

/// Projects an audio stream.
pub fn classify_audio(stream_index: u32, stream: &StreamAttributes) -> AudioTrack {
    let (language_code, language_name) = resolve_language(stream);
    let codec_id = stream.text(StreamAttr::CodecId).to_string();
    let channels = stream.text(StreamAttr::Channels);
    let name = stream.text(StreamAttr::Name).to_string();

    let readable = tables::audio_codec_name(&codec_id)
        .map(str::to_string)
        .unwrap_or_else(|| {
            if codec_id.is_empty() {
                "Unknown".to_string()
            } else {
                codec_id.clone()
            }
        });

    let all_info = format!("{} {} {}", channels, name, stream.text(StreamAttr::CodecShort));
    let layout = detect_channel_layout(&all_info);
    let is_atmos = contains_any(&all_info, ATMOS_KEYWORDS);

    let mut codec_name = readable;
    if is_atmos && !codec_name.to_lowercase().contains("atmos") {
        codec_name.push_str(" Atmos");
    }
    if let Some(layout) = layout.as_deref() {
        if !codec_name.contains(layout) {
            codec_name.push(' ');
            codec_name.push_str(layout);
        }
    }

    let mut channel_format = match layout.as_deref() {
        Some(layout) => format_channels(layout),
        None => channels.to_string(),
    };
    if channel_format.is_empty() {
        channel_format = BITRATE_RE
            .captures(&all_info)
            .map(|caps| caps[1].to_string())
            .or_else(|| stream.get(StreamAttr::Bitrate).map(str::to_string))
            .unwrap_or_default();
    }

    let flags = detect_flags(stream);

    AudioTrack {
        stream_index,
        language_code,
        language_name,
        codec_id,
        codec_name,
        channel_format,
        name,
        is_atmos,
        is_commentary: flags.commentary,
        is_default: flags.default,
        enabled: true,
        dynamic_range: None,
    }
}

/// Subtitle family from the codec id, first match wins.
pub fn subtitle_format(codec_id: &str, codec_short: &str) -> SubtitleFormat {
    let lower = codec_id.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if has(&["pgs", "hdmv"]) {
        SubtitleFormat::Pgs
    } else if has(&["srt", "subrip"]) {
        SubtitleFormat::Srt
    } else if has(&["ass", "ssa"]) {
        SubtitleFormat::Ass
    } else if has(&["vobsub", "dvd"]) {
        SubtitleFormat::VobSub
    } else if has(&["utf8", "text"]) {
        SubtitleFormat::Text
    } else if !codec_short.is_empty() {
        SubtitleFormat::Other(codec_short.to_string())
    } else if !codec_id.is_empty() {
        SubtitleFormat::Other(codec_id.to_string())
    } else {
        SubtitleFormat::Unknown
    }
}

/// Projects a subtitle stream.
pub fn classify_subtitle(stream_index: u32, stream: &StreamAttributes) -> SubtitleTrack {
    let (language_code, language_name) = resolve_language(stream);
    let codec_id = stream.text(StreamAttr::CodecId).to_string();
    let flags = detect_flags(stream);

    SubtitleTrack {
        stream_index,
        language_code,
        language_name,
        codec_format: subtitle_format(&codec_id, stream.text(StreamAttr::CodecShort)),
        codec_id,
        name: stream.text(StreamAttr::Name).to_string(),
        is_forced: flags.forced,
        is_sdh: flags.sdh,
        is_commentary: flags.commentary,
        is_default: flags.default,
        enabled: true,
    }
}

/// Drops alternate-angle duplicates: when angles were announced, only the
/// first title of each distinct duration survives. Titles with an unknown
/// duration count as one group.
pub fn dedupe_angles(titles: Vec<Title>, angles_detected: bool) -> Vec<Title> {
    if !angles_detected || titles.len() <= 1 {
        return titles;
    }

    let mut seen: HashSet<Option<u64>> = HashSet::new();
    let mut kept = Vec::with_capacity(titles.len());
    let mut dropped = Vec::new();

    for title in titles {
        if seen.insert(title.duration_seconds) {
            kept.push(title);
        } else {
            dropped.push(title.title_index);
        }
    }

    if !dropped.is_empty() {
        log::info!(
            "Angle duplicates removed: titles {:?} share a runtime with an earlier title",
            dropped
        );
    }
    kept
}
