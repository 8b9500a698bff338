// discprep-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use discprep_core::config::{
    DEFAULT_DISC_INDEX, DEFAULT_FFMPEG_PATH, DEFAULT_HANDBRAKE_PATH, DEFAULT_MAKEMKV_PATH,
    DEFAULT_MAX_RETRIES, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_REINSERT_TIMEOUT_SECS,
    DEFAULT_STORE_URL, DEFAULT_VOLUMES_ROOT,
};

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "discprep: Optical disc preparation tool",
    long_about = "Fingerprints, scans and rips movie discs with MakeMKV, hands the layout to a \
                  metadata store for review, then transcodes the approved titles with HandBrakeCLI."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Directory for log files (defaults to <temp dir>/logs)
    #[arg(long, global = true, value_name = "LOG_DIR", env = "DISCPREP_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan, rip, publish for review and transcode the inserted disc
    Rip(RipArgs),
    /// Scan the inserted disc and print its titles and tracks
    Scan(ScanArgs),
    /// Print the fingerprint of a mounted disc
    Fingerprint(FingerprintArgs),
    /// Check external tools and the metadata store
    Check(CheckArgs),
}

/// Tool locations and endpoints shared by every command.
#[derive(Args, Debug, Clone)]
pub struct ToolArgs {
    /// Path to makemkvcon
    #[arg(long, value_name = "PATH", env = "DISCPREP_MAKEMKV", default_value = DEFAULT_MAKEMKV_PATH)]
    pub makemkv: PathBuf,

    /// Path to HandBrakeCLI
    #[arg(long, value_name = "PATH", env = "DISCPREP_HANDBRAKE", default_value = DEFAULT_HANDBRAKE_PATH)]
    pub handbrake: PathBuf,

    /// Path to ffmpeg (ffprobe is expected alongside it)
    #[arg(long, value_name = "PATH", env = "DISCPREP_FFMPEG", default_value = DEFAULT_FFMPEG_PATH)]
    pub ffmpeg: PathBuf,

    /// Base URL of the metadata store API
    #[arg(long, value_name = "URL", env = "DISCPREP_STORE_URL", default_value = DEFAULT_STORE_URL)]
    pub store_url: String,

    /// Bearer token linking discs to your account
    #[arg(long, value_name = "TOKEN", env = "DISCPREP_USER_TOKEN", hide_env_values = true)]
    pub user_token: Option<String>,

    /// Directory whose children are disc mount points
    #[arg(long, value_name = "DIR", env = "DISCPREP_VOLUMES_ROOT", default_value = DEFAULT_VOLUMES_ROOT)]
    pub volumes_root: PathBuf,

    /// MakeMKV drive index
    #[arg(long, value_name = "N", env = "DISCPREP_DISC_INDEX", default_value_t = DEFAULT_DISC_INDEX)]
    pub disc_index: u32,

    /// Base directory for per-disc working directories
    #[arg(long, value_name = "DIR", env = "DISCPREP_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Scan attempts before giving up on read errors
    #[arg(long, value_name = "N", env = "DISCPREP_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Seconds to wait for the disc after an eject
    #[arg(long, value_name = "SECONDS", env = "DISCPREP_REINSERT_TIMEOUT", default_value_t = DEFAULT_REINSERT_TIMEOUT_SECS)]
    pub reinsert_timeout: u64,
}

#[derive(Args, Debug)]
pub struct RipArgs {
    #[command(flatten)]
    pub tools: ToolArgs,

    /// Movie title (defaults to a guess from the volume label)
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Release year
    #[arg(long, value_name = "YEAR")]
    pub year: Option<String>,

    /// IMDb id, e.g. tt0113277
    #[arg(long, value_name = "ID")]
    pub imdb_id: Option<String>,

    /// Library directory receiving "<Title> (<Year>)/<Title> (<Year>).mkv"
    #[arg(short = 'o', long, value_name = "DIR", env = "DISCPREP_MOVIES_DIR")]
    pub movies_dir: PathBuf,

    /// Audio to keep: best, lossless or lossy
    #[arg(long, value_name = "POLICY", env = "DISCPREP_AUDIO_QUALITY", default_value = "best")]
    pub audio_quality: String,

    /// Keep commentary tracks
    #[arg(long, env = "DISCPREP_INCLUDE_COMMENTARY")]
    pub include_commentary: bool,

    /// Measure loudness of ripped audio to spot unlabelled commentary
    #[arg(long)]
    pub analyze_audio: bool,

    /// Seconds between review status polls
    #[arg(long, value_name = "SECONDS", env = "DISCPREP_POLL_INTERVAL", default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval: u64,

    /// HandBrake preset for DVDs
    #[arg(long, value_name = "PRESET", env = "DISCPREP_DVD_PRESET")]
    pub dvd_preset: Option<String>,

    /// HandBrake preset for Blu-rays
    #[arg(long, value_name = "PRESET", env = "DISCPREP_BLURAY_PRESET")]
    pub bluray_preset: Option<String>,

    /// Keep the ripped MKV files after transcoding
    #[arg(long)]
    pub keep_files: bool,

    /// Leave the disc in the drive when done
    #[arg(long)]
    pub no_eject: bool,

    /// ntfy.sh topic URL for notifications (e.g., https://ntfy.sh/your_topic)
    #[arg(long, value_name = "TOPIC_URL", env = "DISCPREP_NTFY_TOPIC")]
    pub ntfy: Option<String>,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub tools: ToolArgs,

    /// Print the titles as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct FingerprintArgs {
    /// Mounted volume to fingerprint (defaults to the first disc found)
    #[arg(value_name = "VOLUME")]
    pub volume: Option<PathBuf>,

    /// Directory whose children are disc mount points
    #[arg(long, value_name = "DIR", env = "DISCPREP_VOLUMES_ROOT", default_value = DEFAULT_VOLUMES_ROOT)]
    pub volumes_root: PathBuf,

    /// Also print the historical fingerprints used for migration
    #[arg(long)]
    pub legacy: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub tools: ToolArgs,
}
