// discprep-cli/src/lib.rs
//
// Library portion of the discprep CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;

// Re-export items needed by the binary or integration tests
pub use cli::{CheckArgs, Cli, Commands, FingerprintArgs, RipArgs, ScanArgs, ToolArgs};
pub use commands::check::run_check;
pub use commands::fingerprint::run_fingerprint;
pub use commands::rip::run_rip;
pub use commands::scan::run_scan;
pub use error::{CliErrorContext, CliResult};
