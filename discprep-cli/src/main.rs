// ============================================================================
// discprep-cli/src/main.rs
// ============================================================================
//
// MAIN ENTRY POINT: Parses arguments, sets up logging and dispatches the
// selected subcommand. Any error ends the process with exit code 1.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use console::style;
use discprep_cli::{Cli, Commands, run_check, run_fingerprint, run_rip, run_scan};
use discprep_core::RipConfig;

fn log_dir(cli: &Cli) -> PathBuf {
    cli.log_dir
        .clone()
        .unwrap_or_else(|| RipConfig::default().temp_dir.join("logs"))
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = discprep_cli::logging::init_logging(cli.verbose, &log_dir(&cli)) {
        eprintln!("{} {e}", style("Warning: logging disabled:").yellow());
    }

    let result = match cli.command {
        Commands::Rip(args) => run_rip(args),
        Commands::Scan(args) => run_scan(args),
        Commands::Fingerprint(args) => run_fingerprint(args),
        Commands::Check(args) => run_check(args),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        eprintln!("{} {e}", style("Error:").red().bold());
        process::exit(1);
    }
}
