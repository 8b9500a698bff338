// ============================================================================
// discprep-core/src/external/handbrake.rs
// ============================================================================
//
// HANDBRAKE: Transcoder Invocation
//
// HandBrakeCLI selects tracks by 1-based position within each track type, in
// the order they appear in the ripped file. The reviewer's enabled flags are
// turned into those position lists here.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{CoreResult, command_failed_error, command_start_error, command_wait_error};
use crate::model::{AudioTrack, DiscType, SubtitleTrack};

/// Codecs passed through untouched on Blu-ray sources.
pub const BLURAY_AUDIO_COPY_MASK: &str = "truehd,eac3,ac3,dts,dtshd";

/// Encoder used when a passthrough codec is not allowed.
pub const BLURAY_AUDIO_FALLBACK: &str = "ac3";

/// One transcode of a ripped title.
#[derive(Debug, Clone)]
pub struct TranscodeJob<'a> {
    pub input: PathBuf,
    pub output: PathBuf,
    pub preset: String,
    pub disc_type: DiscType,
    /// Track data from the reviewed layout; empty means "keep everything".
    pub audio_tracks: &'a [AudioTrack],
    pub subtitle_tracks: &'a [SubtitleTrack],
}

/// 1-based positions of the enabled entries, comma separated.
fn enabled_positions(enabled: impl Iterator<Item = bool>) -> Vec<String> {
    enabled
        .enumerate()
        .filter(|(_, on)| *on)
        .map(|(i, _)| (i + 1).to_string())
        .collect()
}

/// Builds the HandBrakeCLI argument list for a job.
pub fn build_args(job: &TranscodeJob<'_>) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        job.input.display().to_string(),
        "-o".to_string(),
        job.output.display().to_string(),
        "--preset".to_string(),
        job.preset.clone(),
        "--format".to_string(),
        "mkv".to_string(),
    ];

    if job.audio_tracks.is_empty() {
        args.push("--all-audio".to_string());
    } else {
        let audio = enabled_positions(job.audio_tracks.iter().map(|t| t.enabled));
        args.push("--audio".to_string());
        if audio.is_empty() {
            log::info!("No audio selected, using track 1");
            args.push("1".to_string());
        } else {
            args.push(audio.join(","));
        }
    }

    if job.subtitle_tracks.is_empty() {
        args.push("--all-subtitles".to_string());
    } else {
        let subs = enabled_positions(job.subtitle_tracks.iter().map(|t| t.enabled));
        if !subs.is_empty() {
            args.push("--subtitle".to_string());
            args.push(subs.join(","));
        }
    }

    if job.disc_type == DiscType::BluRay {
        args.extend([
            "--audio-copy-mask".to_string(),
            BLURAY_AUDIO_COPY_MASK.to_string(),
            "--audio-fallback".to_string(),
            BLURAY_AUDIO_FALLBACK.to_string(),
        ]);
    }

    args
}

/// Runs HandBrakeCLI for one job. Its stderr is forwarded to the debug log.
///
/// # Returns
///
/// * `Ok(())` - The transcode finished with exit status 0
/// * `Err(CoreError::DependencyNotFound)` - If the binary is missing
/// * `Err(CoreError::NonZeroExit)` - If HandBrake failed
pub fn transcode(binary: &Path, job: &TranscodeJob<'_>) -> CoreResult<()> {
    let tool = "HandBrakeCLI";
    if let Some(parent) = job.output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let args = build_args(job);
    log::info!(">>> {} {}", binary.display(), args.join(" "));

    let mut child = Command::new(binary)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| command_start_error(tool, e))?;

    if let Some(stderr) = child.stderr.take() {
        for line in BufReader::new(stderr).lines().map_while(Result::ok) {
            log::debug!("[handbrake] {}", line);
        }
    }

    let status = child.wait().map_err(|e| command_wait_error(tool, e))?;
    if status.success() {
        Ok(())
    } else {
        Err(command_failed_error(tool, status.code()))
    }
}
