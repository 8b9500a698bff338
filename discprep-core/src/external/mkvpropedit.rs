//! Track labelling of the final MKV with `mkvpropedit`.
//!
//! Only the tracks that made it into the output are passed in, so the 1-based
//! `track:aN` / `track:sN` selectors line up with the file's own order.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};
use crate::model::{AudioTrack, SubtitleTrack};

pub const MKVPROPEDIT: &str = "mkvpropedit";

/// Matroska expects ISO 639-2/B codes; MakeMKV sometimes reports the /T
/// variant or a two-letter code.
pub fn matroska_language(code: &str) -> &str {
    match code {
        "" => "und",
        "en" => "eng",
        "sv" => "swe",
        "no" => "nor",
        "da" => "dan",
        "fi" => "fin",
        "deu" | "de" => "ger",
        "fra" | "fr" => "fre",
        "es" => "spa",
        "it" => "ita",
        "pt" => "por",
        "nld" | "nl" => "dut",
        "pl" => "pol",
        "ru" => "rus",
        "ja" => "jpn",
        "ko" => "kor",
        "zho" | "zh" => "chi",
        other => other,
    }
}

/// Display name for an audio track, e.g. "English 5.1 Surround (Commentary)".
pub fn audio_track_label(track: &AudioTrack) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    if !track.language_name.is_empty() && track.language_name != "Unknown" {
        parts.push(&track.language_name);
    }
    if !track.channel_format.is_empty() {
        parts.push(&track.channel_format);
    }
    if track.is_commentary {
        parts.push("(Commentary)");
    }
    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Builds the edit arguments; empty when there is nothing to set.
pub fn build_args(audio: &[AudioTrack], subtitles: &[SubtitleTrack]) -> Vec<String> {
    let mut args = Vec::new();

    for (i, track) in audio.iter().enumerate() {
        args.push("--edit".to_string());
        args.push(format!("track:a{}", i + 1));
        args.push("--set".to_string());
        args.push(format!("language={}", matroska_language(&track.language_code)));
        if let Some(label) = audio_track_label(track) {
            args.push("--set".to_string());
            args.push(format!("name={label}"));
        }
    }

    for (i, track) in subtitles.iter().enumerate() {
        args.push("--edit".to_string());
        args.push(format!("track:s{}", i + 1));
        args.push("--set".to_string());
        args.push(format!("language={}", matroska_language(&track.language_code)));
        if !track.language_name.is_empty() {
            args.push("--set".to_string());
            args.push(format!("name={}", track.language_name));
        }
    }

    args
}

/// Writes language and name properties into `output`.
///
/// # Returns
///
/// * `Ok(true)` - Properties were written
/// * `Ok(false)` - Nothing to write, or `mkvpropedit` is not installed
/// * `Err(_)` - `mkvpropedit` ran and failed
pub fn apply_track_metadata(
    output: &Path,
    audio: &[AudioTrack],
    subtitles: &[SubtitleTrack],
) -> CoreResult<bool> {
    let edits = build_args(audio, subtitles);
    if edits.is_empty() {
        return Ok(false);
    }

    let result = Command::new(MKVPROPEDIT)
        .arg(output)
        .args(&edits)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| command_start_error(MKVPROPEDIT, e));

    let out = match result {
        Ok(out) => out,
        Err(CoreError::DependencyNotFound(_)) => {
            log::warn!("mkvpropedit not found, skipping track metadata");
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    if out.status.success() {
        log::info!("Track metadata applied to {}", output.display());
        Ok(true)
    } else {
        log::warn!(
            "mkvpropedit failed: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        );
        Err(command_failed_error(MKVPROPEDIT, out.status.code()))
    }
}
