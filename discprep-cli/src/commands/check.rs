//! Implementation of the 'check' subcommand.

use discprep_core::CoreError;
use discprep_core::external::check_dependencies;
use discprep_core::store::{HttpMetadataStore, MetadataStore};

use crate::cli::CheckArgs;
use crate::config::tools_config;
use crate::error::CliResult;
use crate::output::{print_failure, print_heading, print_success, print_warning};

pub fn run_check(args: CheckArgs) -> CliResult<()> {
    let config = tools_config(&args.tools)?;
    let store = HttpMetadataStore::from_config(&config)?;

    print_heading("Dependency check");
    let report = check_dependencies(&config, &store);

    for tool in &report.tools {
        let detail = tool
            .detail
            .as_deref()
            .map(|d| format!(" ({d})"))
            .unwrap_or_default();
        match (tool.found, tool.required) {
            (true, _) => print_success(&format!("{} found{}", tool.name, detail)),
            (false, true) => print_failure(&format!("{} not found{}", tool.name, detail)),
            (false, false) => print_warning(&format!("{} not found (optional)", tool.name)),
        }
    }

    match &report.store_error {
        None => print_success(&format!("Metadata store reachable at {}", config.store_url)),
        Some(e) => print_failure(&format!("Metadata store: {e}")),
    }

    if config.user_token.is_some() {
        match store.user_settings() {
            Ok(Some(_)) => print_success("User token accepted"),
            Ok(None) | Err(_) => print_warning("User token invalid or expired"),
        }
    } else {
        print_warning("No user token set; discs won't be linked to an account");
    }

    if report.all_required_ok() {
        Ok(())
    } else {
        Err(CoreError::OperationFailed(
            "One or more required checks failed".to_string(),
        ))
    }
}
