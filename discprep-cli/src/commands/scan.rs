//! Implementation of the 'scan' subcommand.

use discprep_core::CoreError;

use crate::cli::ScanArgs;
use crate::config::tools_config;
use crate::error::CliResult;
use crate::output::{print_heading, print_info, print_titles};

pub fn run_scan(args: ScanArgs) -> CliResult<()> {
    let config = tools_config(&args.tools)?;
    let disc = discprep_core::find_disc(&config.volumes_root)?;
    let titles = super::scan_titles(&config, &disc, &config.audio_policy)?;

    if args.json {
        let json = serde_json::to_string_pretty(&titles).map_err(CoreError::from)?;
        println!("{json}");
        return Ok(());
    }

    print_heading(&format!("{} ({})", disc.label, disc.disc_type));
    print_info("Titles", titles.len());
    print_titles(&titles);
    Ok(())
}
