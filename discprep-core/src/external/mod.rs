// ============================================================================
// discprep-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with makemkvcon, HandBrakeCLI, ffmpeg,
// mkvpropedit and the optical drive
//
// The scan runner only sees the `ScanSpawner` / `DriveControl` traits; the
// implementations here are the ones wired in by the CLI. Everything else is a
// thin, blocking `std::process::Command` wrapper.

use std::env;
use std::path::Path;
use std::process::{Command, Stdio};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::RipConfig;
use crate::error::{CoreError, CoreResult};
use crate::store::MetadataStore;

// ============================================================================
// SUBMODULES
// ============================================================================

/// Optical drive eject and presence checks
pub mod drive;

/// Loudness analysis with ffmpeg volumedetect
pub mod ffmpeg;

/// HandBrakeCLI argument building and execution
pub mod handbrake;

/// Real makemkvcon process for the scan runner
pub mod makemkv;

/// Track labelling with mkvpropedit
pub mod mkvpropedit;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use drive::{SystemDrive, eject_quietly};
pub use ffmpeg::{LoudnessAnalyzer, LoudnessStats};
pub use handbrake::{TranscodeJob, transcode};
pub use makemkv::{MakemkvProcess, MakemkvSpawner};
pub use mkvpropedit::apply_track_metadata;

/// True when running on macOS.
pub fn is_macos() -> bool {
    env::consts::OS == "macos"
}

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

static HANDBRAKE_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"HandBrake\s+([\d.]+)").expect("valid HandBrake version regex"));

static FFMPEG_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:ffmpeg|ffprobe) version (\S+)").expect("valid ffmpeg version regex"));

static MKVTOOLNIX_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v(\d+(?:\.\d+)+)").expect("valid mkvtoolnix version regex"));

/// Result of probing one dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyStatus {
    pub name: String,
    /// Whether a missing dependency prevents a rip.
    pub required: bool,
    pub found: bool,
    /// Version or licence detail, when the tool reported one.
    pub detail: Option<String>,
}

/// Outcome of [`check_dependencies`].
#[derive(Debug, Clone, Default)]
pub struct DependencyReport {
    pub tools: Vec<DependencyStatus>,
    /// `None` when the store answered its health check.
    pub store_error: Option<String>,
}

impl DependencyReport {
    /// True when every required tool was found and the store is reachable.
    pub fn all_required_ok(&self) -> bool {
        self.store_error.is_none() && self.tools.iter().all(|t| t.found || !t.required)
    }
}

/// Runs `cmd version_arg` and returns its combined output.
///
/// # Returns
///
/// * `Ok(String)` - stdout followed by stderr; the exit status is not checked
/// * `Err(CoreError::DependencyNotFound)` - If the command is not found
/// * `Err(CoreError::CommandStart)` - If the command exists but fails to start
pub(crate) fn check_dependency(cmd: &Path, version_arg: &str) -> CoreResult<String> {
    let name = cmd.display().to_string();
    match Command::new(cmd)
        .arg(version_arg)
        .stdin(Stdio::null())
        .output()
    {
        Ok(out) => {
            log::debug!("Found dependency: {}", name);
            let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&out.stderr));
            Ok(text)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", name);
            Err(CoreError::DependencyNotFound(name))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", name, e);
            Err(CoreError::CommandStart(name, e))
        }
    }
}

/// Licence state reported by `makemkvcon reg`.
fn makemkv_licence(output: &str) -> Option<String> {
    if output.contains("This application is registered") {
        Some("registered".to_string())
    } else {
        let lower = output.to_lowercase();
        (lower.contains("evaluation period") || lower.contains("trial"))
            .then(|| "trial mode".to_string())
    }
}

fn version_from(re: &Regex, output: &str) -> Option<String> {
    re.captures(output).map(|c| format!("v{}", &c[1]))
}

fn probe(
    name: &str,
    cmd: &Path,
    arg: &str,
    required: bool,
    detail: impl Fn(&str) -> Option<String>,
) -> DependencyStatus {
    match check_dependency(cmd, arg) {
        Ok(output) => DependencyStatus {
            name: name.to_string(),
            required,
            found: true,
            detail: detail(&output),
        },
        Err(e) => DependencyStatus {
            name: name.to_string(),
            required,
            found: false,
            detail: Some(e.to_string()),
        },
    }
}

/// Probes every external tool a rip uses and the metadata store's health.
///
/// makemkvcon, HandBrakeCLI and the store are required. ffmpeg, ffprobe and
/// mkvpropedit are optional: without them loudness analysis and track
/// labelling are skipped.
pub fn check_dependencies<S: MetadataStore + ?Sized>(
    config: &RipConfig,
    store: &S,
) -> DependencyReport {
    let ffprobe = config.ffmpeg_path.with_file_name("ffprobe");
    let tools = vec![
        probe("makemkvcon", &config.makemkv_path, "reg", true, makemkv_licence),
        probe("HandBrakeCLI", &config.handbrake_path, "--version", true, |o| {
            version_from(&HANDBRAKE_VERSION_RE, o)
        }),
        probe("ffmpeg", &config.ffmpeg_path, "-version", false, |o| {
            version_from(&FFMPEG_VERSION_RE, o)
        }),
        probe("ffprobe", &ffprobe, "-version", false, |o| {
            version_from(&FFMPEG_VERSION_RE, o)
        }),
        probe(
            "mkvpropedit",
            Path::new(mkvpropedit::MKVPROPEDIT),
            "--version",
            false,
            |o| version_from(&MKVTOOLNIX_VERSION_RE, o),
        ),
    ];

    let store_error = store.health().err().map(|e| e.to_string());
    DependencyReport { tools, store_error }
}
