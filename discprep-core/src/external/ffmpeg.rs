//! Loudness analysis of ripped audio streams with ffmpeg's `volumedetect`.
//!
//! Commentary is mostly speech at a steady level, so its peak sits close to
//! its mean. Film mixes typically show more than 25 dB between the two.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CoreError, CoreResult, command_start_error, command_wait_error};

static MEAN_VOLUME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"mean_volume:\s*(-?[\d.]+)\s*dB").expect("valid mean_volume regex")
});

static MAX_VOLUME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"max_volume:\s*(-?[\d.]+)\s*dB").expect("valid max_volume regex")
});

/// Seconds skipped at the start so intros and logos do not skew the sample.
pub const DEFAULT_SKIP_SECS: u64 = 600;

/// Length of the analysed sample.
pub const DEFAULT_SAMPLE_SECS: u64 = 120;

const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(60);

/// Levels reported by `volumedetect`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessStats {
    pub mean_volume_db: f64,
    pub max_volume_db: f64,
}

impl LoudnessStats {
    /// Peak minus mean, in dB.
    pub fn dynamic_range(&self) -> f64 {
        self.max_volume_db - self.mean_volume_db
    }
}

/// Extracts mean and max volume from ffmpeg's stderr.
pub fn parse_volumedetect(output: &str) -> Option<LoudnessStats> {
    let mean = MEAN_VOLUME_RE.captures(output)?[1].parse().ok()?;
    let max = MAX_VOLUME_RE.captures(output)?[1].parse().ok()?;
    Some(LoudnessStats {
        mean_volume_db: mean,
        max_volume_db: max,
    })
}

/// Runs ffmpeg `volumedetect` over a sample of stream `stream_index`.
pub struct LoudnessAnalyzer {
    ffmpeg: std::path::PathBuf,
    skip_secs: u64,
    sample_secs: u64,
}

impl LoudnessAnalyzer {
    pub fn new(ffmpeg: &Path) -> Self {
        Self {
            ffmpeg: ffmpeg.to_path_buf(),
            skip_secs: DEFAULT_SKIP_SECS,
            sample_secs: DEFAULT_SAMPLE_SECS,
        }
    }

    fn args(&self, input: &Path, stream_index: u32) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-ss".to_string(),
            self.skip_secs.to_string(),
            "-i".to_string(),
            input.display().to_string(),
            "-map".to_string(),
            format!("0:{stream_index}"),
            "-t".to_string(),
            self.sample_secs.to_string(),
            "-af".to_string(),
            "volumedetect".to_string(),
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ]
    }

    /// Measures one stream.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(stats))` - Levels were reported
    /// * `Ok(None)` - ffmpeg ran but reported no levels (e.g. sample past the end)
    /// * `Err(CoreError::Timeout)` - Analysis took longer than a minute
    /// * `Err(_)` - ffmpeg could not be started
    pub fn analyze(&self, input: &Path, stream_index: u32) -> CoreResult<Option<LoudnessStats>> {
        let tool = "ffmpeg";
        let mut child = Command::new(&self.ffmpeg)
            .args(self.args(input, stream_index))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| command_start_error(tool, e))?;

        let stderr = child.stderr.take();
        let reader = std::thread::spawn(move || {
            let mut text = String::new();
            if let Some(mut pipe) = stderr {
                let _ = std::io::Read::read_to_string(&mut pipe, &mut text);
            }
            text
        });

        let deadline = Instant::now() + ANALYSIS_TIMEOUT;
        loop {
            if child
                .try_wait()
                .map_err(|e| command_wait_error(tool, e))?
                .is_some()
            {
                break;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CoreError::Timeout(tool.to_string(), ANALYSIS_TIMEOUT.as_secs()));
            }
            std::thread::sleep(Duration::from_millis(200));
        }

        let output = reader.join().unwrap_or_default();
        Ok(parse_volumedetect(&output))
    }

    /// Dynamic range of a stream, with failures logged and mapped to `None`.
    pub fn dynamic_range(&self, input: &Path, stream_index: u32) -> Option<f64> {
        match self.analyze(input, stream_index) {
            Ok(Some(stats)) => Some(stats.dynamic_range()),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Audio analysis failed for stream {}: {}", stream_index, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[Parsed_volumedetect_0 @ 0x7f8] n_samples: 11520000
[Parsed_volumedetect_0 @ 0x7f8] mean_volume: -27.4 dB
[Parsed_volumedetect_0 @ 0x7f8] max_volume: -1.2 dB
[Parsed_volumedetect_0 @ 0x7f8] histogram_1db: 12";

    #[test]
    fn parses_mean_and_max() {
        let stats = parse_volumedetect(SAMPLE).unwrap();
        assert_eq!(stats.mean_volume_db, -27.4);
        assert_eq!(stats.max_volume_db, -1.2);
        assert!((stats.dynamic_range() - 26.2).abs() < 1e-9);
    }

    #[test]
    fn missing_levels_yield_none() {
        assert!(parse_volumedetect("Output file is empty, nothing was encoded").is_none());
        assert!(parse_volumedetect("mean_volume: -20.0 dB").is_none());
    }

    #[test]
    fn sample_window_is_mapped_to_stream() {
        let analyzer = LoudnessAnalyzer::new(Path::new("ffmpeg"));
        let args = analyzer.args(Path::new("/tmp/a_t00.mkv"), 2);
        let map = args.iter().position(|a| a == "-map").unwrap();
        assert_eq!(args[map + 1], "0:2");
        assert!(args.contains(&"volumedetect".to_string()));
    }
}
