// ============================================================================
// discprep-cli/src/logging.rs
// ============================================================================
//
// LOGGING: Console and File Log Dispatch
//
// Console output goes to stderr with a coloured level, at info (or debug with
// --verbose). Every run also writes a debug-level log file named
// discprep_<YYYYMMDD_HHMMSS>.log, which keeps the raw MakeMKV and HandBrake
// output for later inspection.

use std::fs;
use std::path::{Path, PathBuf};

use discprep_core::CoreError;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

use crate::error::CliResult;

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Log file path for a run started now.
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(format!("discprep_{}.log", get_timestamp()))
}

/// Installs the global logger.
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the log file for this run
/// * `Err(CoreError)` - If the log directory or file cannot be created, or a
///   logger is already installed
pub fn init_logging(verbose: bool, log_dir: &Path) -> CliResult<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let path = log_file_path(log_dir);

    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    let console_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let console = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!("{:<5} {}", colors.color(record.level()), message))
        })
        .level(console_level)
        .chain(std::io::stderr());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {:<5} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Debug)
        .chain(fern::log_file(&path)?);

    fern::Dispatch::new()
        .level(LevelFilter::Debug)
        .level_for("reqwest", LevelFilter::Warn)
        .level_for("rustls", LevelFilter::Warn)
        .level_for("hyper", LevelFilter::Warn)
        .chain(console)
        .chain(file)
        .apply()
        .map_err(|e| CoreError::OperationFailed(format!("Failed to initialize logging: {e}")))?;

    log::debug!("Logging to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_name_is_timestamped() {
        let path = log_file_path(Path::new("/tmp/logs"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("discprep_"));
        assert!(name.ends_with(".log"));
        // discprep_ + YYYYMMDD_HHMMSS + .log
        assert_eq!(name.len(), "discprep_".len() + 15 + ".log".len());
    }
}
