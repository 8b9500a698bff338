//! Audio track scoring and selection.
//!
//! Every audio track gets a score from its channel layout, with bonuses for
//! lossless codecs and Atmos. The policy then decides which tracks start
//! enabled in the layout handed to the reviewer. Selection always starts from
//! "all disabled", so running it twice gives the same result.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{AudioTrack, Title};

/// Codec fragments that identify lossless audio.
pub const LOSSLESS_MARKERS: &[&str] = &["truehd", "dts-hd", "dts:x", "flac", "pcm", "lpcm"];

const LOSSLESS_BONUS: u32 = 50;
const ATMOS_BONUS: u32 = 25;

/// Which main (non-commentary) tracks to keep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioQuality {
    /// Only the single highest-scoring track.
    #[default]
    Best,
    /// Every lossless track.
    Lossless,
    /// Every lossy track.
    Lossy,
}

impl AudioQuality {
    /// Parses a policy name; anything unrecognised means `Best`.
    pub fn from_str_lossy(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "lossless" => AudioQuality::Lossless,
            "lossy" => AudioQuality::Lossy,
            _ => AudioQuality::Best,
        }
    }
}

impl fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioQuality::Best => f.write_str("best"),
            AudioQuality::Lossless => f.write_str("lossless"),
            AudioQuality::Lossy => f.write_str("lossy"),
        }
    }
}

/// Audio selection policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioPolicy {
    pub quality: AudioQuality,
    /// Also enable commentary tracks.
    pub include_commentary: bool,
}

/// True when the codec name or raw codec id names a lossless format.
pub fn is_lossless(track: &AudioTrack) -> bool {
    let haystack = format!("{} {}", track.codec_name, track.codec_id).to_lowercase();
    LOSSLESS_MARKERS.iter().any(|m| haystack.contains(m))
}

/// Scores a track: 7.1 = 400, 5.1 = 300, stereo = 200, mono = 100, plus 50
/// for a lossless codec and 25 for Atmos.
pub fn score(track: &AudioTrack) -> u32 {
    let channels = format!("{} {}", track.channel_format, track.codec_name).to_lowercase();

    let mut score = if channels.contains("7.1") {
        400
    } else if channels.contains("5.1") {
        300
    } else if channels.contains("stereo") || channels.contains("2.0") {
        200
    } else if channels.contains("mono") || channels.contains("1.0") {
        100
    } else {
        0
    };

    if is_lossless(track) {
        score += LOSSLESS_BONUS;
    }
    if track.is_atmos {
        score += ATMOS_BONUS;
    }
    score
}

/// Applies the policy to `tracks`, setting each `enabled` flag.
pub fn select(tracks: &mut [AudioTrack], policy: &AudioPolicy) {
    for track in tracks.iter_mut() {
        track.enabled = false;
    }

    // Stable sort by descending score keeps stream order on ties.
    let mut main: Vec<(usize, u32)> = tracks
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.is_commentary)
        .map(|(i, t)| (i, score(t)))
        .collect();
    main.sort_by(|a, b| b.1.cmp(&a.1));

    match policy.quality {
        AudioQuality::Best => {
            if let Some((index, _)) = main.first() {
                tracks[*index].enabled = true;
            }
        }
        AudioQuality::Lossless => {
            for (index, _) in &main {
                if is_lossless(&tracks[*index]) {
                    tracks[*index].enabled = true;
                }
            }
        }
        AudioQuality::Lossy => {
            for (index, _) in &main {
                if !is_lossless(&tracks[*index]) {
                    tracks[*index].enabled = true;
                }
            }
        }
    }

    if policy.include_commentary {
        for track in tracks.iter_mut().filter(|t| t.is_commentary) {
            track.enabled = true;
        }
    }
}

/// Applies the policy to a title's audio tracks.
pub fn select_for_title(title: &mut Title, policy: &AudioPolicy) {
    select(&mut title.audio_tracks, policy);
    let enabled = title.audio_tracks.iter().filter(|t| t.enabled).count();
    log::debug!(
        "Title {}: {} of {} audio track(s) enabled ({})",
        title.title_index,
        enabled,
        title.audio_tracks.len(),
        policy.quality
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(index: u32, codec_id: &str, codec_name: &str, channels: &str) -> AudioTrack {
        AudioTrack {
            stream_index: index,
            language_code: "eng".into(),
            language_name: "English".into(),
            codec_id: codec_id.into(),
            codec_name: codec_name.into(),
            channel_format: channels.into(),
            name: String::new(),
            is_atmos: false,
            is_commentary: false,
            is_default: false,
            enabled: true,
            dynamic_range: None,
        }
    }

    #[test]
    fn scores_follow_layout_and_bonuses() {
        assert_eq!(score(&track(1, "A_AC3", "Dolby Digital 5.1", "5.1 Surround")), 300);
        assert_eq!(score(&track(1, "A_AC3", "Dolby Digital 2.0", "Stereo")), 200);
        assert_eq!(score(&track(1, "A_AC3", "Dolby Digital 1.0", "Mono")), 100);
        assert_eq!(
            score(&track(1, "A_TRUEHD", "Dolby TrueHD 7.1", "7.1 Surround")),
            450
        );
        let mut atmos = track(1, "A_TRUEHD", "Dolby TrueHD Atmos 7.1", "7.1 Surround");
        atmos.is_atmos = true;
        assert_eq!(score(&atmos), 475);
        assert_eq!(score(&track(1, "A_AC3", "Dolby Digital", "")), 0);
    }

    #[test]
    fn best_enables_only_the_top_track() {
        let mut tracks = vec![
            track(1, "A_AC3", "Dolby Digital 5.1", "5.1 Surround"),
            track(2, "A_AC3", "Dolby Digital 7.1", "7.1 Surround"),
            track(3, "A_AC3", "Dolby Digital 2.0", "Stereo"),
        ];
        select(&mut tracks, &AudioPolicy::default());
        let enabled: Vec<u32> = tracks.iter().filter(|t| t.enabled).map(|t| t.stream_index).collect();
        assert_eq!(enabled, vec![2]);
    }

    #[test]
    fn ties_keep_stream_order() {
        let mut tracks = vec![
            track(1, "A_AC3", "Dolby Digital 5.1", "5.1 Surround"),
            track(2, "A_AC3", "Dolby Digital 5.1", "5.1 Surround"),
        ];
        select(&mut tracks, &AudioPolicy::default());
        assert!(tracks[0].enabled);
        assert!(!tracks[1].enabled);
    }

    #[test]
    fn lossless_and_lossy_partition_main_tracks() {
        let base = vec![
            track(1, "A_TRUEHD", "Dolby TrueHD 7.1", "7.1 Surround"),
            track(2, "A_AC3", "Dolby Digital 5.1", "5.1 Surround"),
            track(3, "A_LPCM", "LPCM 2.0", "Stereo"),
        ];

        let mut lossless = base.clone();
        select(
            &mut lossless,
            &AudioPolicy {
                quality: AudioQuality::Lossless,
                include_commentary: false,
            },
        );
        assert_eq!(
            lossless.iter().map(|t| t.enabled).collect::<Vec<_>>(),
            vec![true, false, true]
        );

        let mut lossy = base;
        select(
            &mut lossy,
            &AudioPolicy {
                quality: AudioQuality::Lossy,
                include_commentary: false,
            },
        );
        assert_eq!(
            lossy.iter().map(|t| t.enabled).collect::<Vec<_>>(),
            vec![false, true, false]
        );
    }

    #[test]
    fn commentary_needs_opt_in() {
        let mut commentary = track(2, "A_AC3", "Dolby Digital 7.1", "7.1 Surround");
        commentary.is_commentary = true;
        let mut tracks = vec![track(1, "A_AC3", "Dolby Digital 2.0", "Stereo"), commentary];

        select(&mut tracks, &AudioPolicy::default());
        assert_eq!(tracks.iter().map(|t| t.enabled).collect::<Vec<_>>(), vec![true, false]);

        select(
            &mut tracks,
            &AudioPolicy {
                quality: AudioQuality::Best,
                include_commentary: true,
            },
        );
        assert_eq!(tracks.iter().map(|t| t.enabled).collect::<Vec<_>>(), vec![true, true]);
    }

    #[test]
    fn from_str_lossy_defaults_to_best() {
        assert_eq!(AudioQuality::from_str_lossy("LOSSLESS"), AudioQuality::Lossless);
        assert_eq!(AudioQuality::from_str_lossy("lossy"), AudioQuality::Lossy);
        assert_eq!(AudioQuality::from_str_lossy("whatever"), AudioQuality::Best);
    }
}
