//! Implementation of the 'fingerprint' subcommand.

use discprep_core::discovery::{DiscVolume, detect_disc_type};
use discprep_core::fingerprint::{fingerprint, legacy_candidates};
use discprep_core::{CoreError, find_disc};

use crate::cli::FingerprintArgs;
use crate::error::CliResult;
use crate::output::print_info;

fn target_volume(args: &FingerprintArgs) -> CliResult<DiscVolume> {
    let Some(path) = args.volume.clone() else {
        return find_disc(&args.volumes_root);
    };

    let disc_type = detect_disc_type(&path).ok_or_else(|| {
        CoreError::NoDiscFound(format!("{} (no BDMV or VIDEO_TS directory)", path.display()))
    })?;
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(DiscVolume {
        label,
        path,
        disc_type,
    })
}

pub fn run_fingerprint(args: FingerprintArgs) -> CliResult<()> {
    let disc = target_volume(&args)?;
    let canonical = fingerprint(&disc.path, disc.disc_type.as_str())?;

    print_info("Volume", disc.path.display());
    print_info("Disc type", disc.disc_type);
    print_info("Fingerprint", &canonical);
    print_info("Work dir", canonical.short());

    if args.legacy {
        let label = (!disc.label.is_empty()).then_some(disc.label.as_str());
        for candidate in legacy_candidates(&disc.path, disc.disc_type, label, &canonical)? {
            print_info("Legacy", candidate);
        }
    }
    Ok(())
}
