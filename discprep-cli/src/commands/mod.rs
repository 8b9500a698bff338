//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Tool and store readiness report.
pub mod check;

/// Fingerprint of a mounted disc, with optional historical variants.
pub mod fingerprint;

/// The full pipeline: scan, rip, review handoff, transcode.
pub mod rip;

/// Scan-only listing of titles and tracks.
pub mod scan;

use discprep_core::external::{MakemkvSpawner, SystemDrive};
use discprep_core::runner::{RunnerSettings, ScanRunner, info_args};
use discprep_core::selection::{AudioPolicy, select_for_title};
use discprep_core::{DiscVolume, RipConfig, Title};

use crate::error::CliResult;

/// Runs an info scan of `disc` and returns its titles with the audio policy
/// applied.
pub(crate) fn scan_titles(
    config: &RipConfig,
    disc: &DiscVolume,
    policy: &AudioPolicy,
) -> CliResult<Vec<Title>> {
    let spawner = MakemkvSpawner::new(&config.makemkv_path);
    let drive = SystemDrive;
    let runner = ScanRunner::new(&spawner, &drive, RunnerSettings::from_config(config));

    log::info!("Scanning {} ({})", disc.label, disc.disc_type);
    let mut lines = Vec::new();
    runner.run(
        &info_args(config.disc_index),
        Some(&disc.path),
        Some(config.info_timeout()),
        |line| {
            log::trace!("{}", line);
            lines.push(line.to_string());
        },
    )?;

    let mut titles = discprep_core::scan::parse(&lines)?;
    for title in &mut titles {
        select_for_title(title, policy);
    }
    Ok(titles)
}
