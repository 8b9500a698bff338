// ============================================================================
// discprep-core/src/runner.rs
// ============================================================================
//
// SCAN RUNNER: Bounded Retry and Recovery Around MakeMKV
//
// Runs one MakeMKV invocation (info scan or rip), watches its combined output
// for disc read-error signatures and drives the recovery loop:
//
//   Running ──clean exit──────────────▶ Success
//      │
//      └─read error─▶ ErrorDetected ──attempts left──▶ Retrying ──▶ Running
//                          │
//                          └─exhausted──▶ Failed (DiscReadError)
//
// Recovery ejects the disc and waits for it to be mounted again. A non-zero
// exit without a read-error signature is a hard failure and is not retried.
//
// The process and the drive are reached through the ScanSpawner/ScanProcess
// and DriveControl traits so the state machine can be driven by mocks.

use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::RipConfig;
use crate::error::{CoreError, CoreResult, command_failed_error};

/// Case-insensitive output fragments that indicate an unreadable sector.
pub const READ_ERROR_SIGNATURES: &[&str] = &[
    "medium error",
    "uncorrectable error",
    "scsi error",
    "lec uncorrectable",
];

static OFFSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)offset\s*['"]?([^'"\s]+)"#).expect("valid offset regex")
});

/// How a scan process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Exited(i32),
    /// Killed by a signal; no exit code.
    Signaled,
    /// Still running when the wait timeout expired.
    TimedOut,
}

/// A running MakeMKV process.
pub trait ScanProcess {
    /// Next line of combined stdout/stderr, or `None` once both are closed.
    fn next_line(&mut self) -> Option<String>;

    /// Asks the process to stop, escalating to a kill after `grace`.
    fn terminate(&mut self, grace: Duration);

    /// Waits for exit, giving up after `timeout` when one is set.
    fn wait(&mut self, timeout: Option<Duration>) -> CoreResult<ExitOutcome>;
}

/// Starts MakeMKV processes.
pub trait ScanSpawner {
    type Process: ScanProcess;

    /// Spawns the tool with `args` (everything after the binary name).
    fn spawn(&self, args: &[String]) -> CoreResult<Self::Process>;

    /// Tool name used in errors and logs.
    fn tool_name(&self) -> &str {
        "makemkvcon"
    }
}

/// Physical drive operations used during recovery.
pub trait DriveControl {
    fn eject(&self, volume: &Path) -> CoreResult<()>;
    fn volume_present(&self, volume: &Path) -> bool;
    fn sleep(&self, duration: Duration);
}

/// State of one `ScanRunner::run` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    ErrorDetected,
    Retrying,
    Success,
    Failed,
}

/// Attempt bookkeeping for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    pub attempt: u32,
    pub max_retries: u32,
    pub last_error: Option<String>,
    pub last_offset: Option<String>,
}

impl RetryState {
    pub fn new(max_retries: u32) -> Self {
        Self {
            attempt: 0,
            max_retries,
            last_error: None,
            last_offset: None,
        }
    }

    pub fn can_retry(&self) -> bool {
        self.attempt < self.max_retries
    }

    fn record_error(&mut self, line: &str) {
        self.last_error = Some(line.to_string());
        self.last_offset = extract_offset(line);
    }
}

/// Returns the matching read-error signature, if the line carries one.
pub fn detect_read_error(line: &str) -> Option<&'static str> {
    let lower = line.to_lowercase();
    READ_ERROR_SIGNATURES
        .iter()
        .copied()
        .find(|sig| lower.contains(sig))
}

/// Pulls the byte offset out of a read-error line.
pub fn extract_offset(line: &str) -> Option<String> {
    OFFSET_RE.captures(line).map(|caps| caps[1].to_string())
}

/// Timing and bounds of the recovery loop.
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub max_retries: u32,
    /// Time between the graceful stop request and the forced kill.
    pub terminate_grace: Duration,
    /// Number of one-interval polls while waiting for the disc to return.
    pub reinsert_polls: u32,
    pub reinsert_poll_interval: Duration,
    /// Pause after the volume reappears, before the next attempt.
    pub settle: Duration,
    /// Pause before a retry when there is no volume to eject.
    pub no_volume_wait: Duration,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            max_retries: crate::config::DEFAULT_MAX_RETRIES,
            terminate_grace: Duration::from_secs(2),
            reinsert_polls: crate::config::DEFAULT_REINSERT_TIMEOUT_SECS as u32,
            reinsert_poll_interval: Duration::from_secs(1),
            settle: Duration::from_secs(2),
            no_volume_wait: Duration::from_secs(5),
        }
    }
}

impl RunnerSettings {
    pub fn from_config(config: &RipConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            reinsert_polls: u32::try_from(config.reinsert_timeout_secs).unwrap_or(u32::MAX),
            ..Self::default()
        }
    }
}

enum AttemptOutcome {
    Clean,
    ReadError,
}

/// Drives MakeMKV through the retry state machine.
pub struct ScanRunner<'a, S: ScanSpawner, D: DriveControl> {
    spawner: &'a S,
    drive: &'a D,
    settings: RunnerSettings,
}

impl<'a, S: ScanSpawner, D: DriveControl> ScanRunner<'a, S, D> {
    pub fn new(spawner: &'a S, drive: &'a D, settings: RunnerSettings) -> Self {
        Self {
            spawner,
            drive,
            settings,
        }
    }

    /// Runs the tool until it exits cleanly or the retry budget is spent.
    ///
    /// # Arguments
    ///
    /// * `args` - Tool arguments
    /// * `volume` - Mounted volume to eject and wait for during recovery
    /// * `exit_timeout` - Limit on the wait for exit once output has ended
    /// * `on_line` - Called with every output line as it arrives
    ///
    /// # Returns
    ///
    /// * `Ok(RetryState)` - Final attempt bookkeeping after a clean exit
    /// * `Err(CoreError::DiscReadError)` - Read errors on every attempt
    /// * `Err(CoreError::DiscNotReinserted)` - Disc not back after an eject
    /// * `Err(CoreError::NonZeroExit)` - Tool failed for another reason
    /// * `Err(CoreError::Timeout)` - Tool did not exit within `exit_timeout`
    pub fn run<F>(
        &self,
        args: &[String],
        volume: Option<&Path>,
        exit_timeout: Option<Duration>,
        mut on_line: F,
    ) -> CoreResult<RetryState>
    where
        F: FnMut(&str),
    {
        let mut retry = RetryState::new(self.settings.max_retries.max(1));
        let mut state = RunState::Running;

        loop {
            log::debug!("Scan runner state: {:?} (attempt {})", state, retry.attempt);
            state = match state {
                RunState::Running => {
                    retry.attempt += 1;
                    if retry.attempt > 1 {
                        log::info!("Retry attempt {}/{}", retry.attempt, retry.max_retries);
                    }
                    match self.attempt(args, exit_timeout, &mut on_line, &mut retry)? {
                        AttemptOutcome::Clean => RunState::Success,
                        AttemptOutcome::ReadError => RunState::ErrorDetected,
                    }
                }
                RunState::ErrorDetected => {
                    if retry.can_retry() {
                        log::warn!(
                            "Read error detected at offset {}; attempting recovery",
                            retry.last_offset.as_deref().unwrap_or("unknown")
                        );
                        RunState::Retrying
                    } else {
                        RunState::Failed
                    }
                }
                RunState::Retrying => {
                    self.recover(volume)?;
                    RunState::Running
                }
                RunState::Success => return Ok(retry),
                RunState::Failed => {
                    log::error!("Disc read error persisted after {} attempt(s)", retry.attempt);
                    return Err(CoreError::DiscReadError {
                        attempts: retry.attempt,
                        offset: retry.last_offset.clone(),
                    });
                }
            };
        }
    }

    fn attempt<F>(
        &self,
        args: &[String],
        exit_timeout: Option<Duration>,
        on_line: &mut F,
        retry: &mut RetryState,
    ) -> CoreResult<AttemptOutcome>
    where
        F: FnMut(&str),
    {
        let tool = self.spawner.tool_name().to_string();
        log::info!(">>> {} {}", tool, args.join(" "));

        let mut process = self.spawner.spawn(args)?;

        while let Some(line) = process.next_line() {
            on_line(&line);
            if let Some(signature) = detect_read_error(&line) {
                log::warn!("Read error signature '{}': {}", signature, line.trim());
                retry.record_error(&line);
                process.terminate(self.settings.terminate_grace);
                return Ok(AttemptOutcome::ReadError);
            }
        }

        match process.wait(exit_timeout)? {
            ExitOutcome::Exited(0) => Ok(AttemptOutcome::Clean),
            ExitOutcome::Exited(code) => Err(command_failed_error(&tool, Some(code))),
            ExitOutcome::Signaled => Err(command_failed_error(&tool, None)),
            ExitOutcome::TimedOut => {
                process.terminate(Duration::ZERO);
                let secs = exit_timeout.map(|t| t.as_secs()).unwrap_or_default();
                Err(CoreError::Timeout(tool, secs))
            }
        }
    }

    fn recover(&self, volume: Option<&Path>) -> CoreResult<()> {
        let Some(volume) = volume else {
            log::info!(
                "Waiting {}s before retry",
                self.settings.no_volume_wait.as_secs()
            );
            self.drive.sleep(self.settings.no_volume_wait);
            return Ok(());
        };

        log::info!("Ejecting {} to reset the drive", volume.display());
        if let Err(e) = self.drive.eject(volume) {
            log::warn!("Eject failed (continuing): {}", e);
        }

        log::info!("Waiting for the disc to be reinserted...");
        for _ in 0..self.settings.reinsert_polls {
            self.drive.sleep(self.settings.reinsert_poll_interval);
            if self.drive.volume_present(volume) {
                log::info!("Disc detected: {}", volume.display());
                self.drive.sleep(self.settings.settle);
                return Ok(());
            }
        }

        let waited = self.settings.reinsert_poll_interval * self.settings.reinsert_polls;
        Err(CoreError::DiscNotReinserted {
            volume: volume.display().to_string(),
            waited_secs: waited.as_secs(),
        })
    }
}

/// Arguments for `makemkvcon -r info disc:<n>`.
pub fn info_args(disc_index: u32) -> Vec<String> {
    vec![
        "-r".to_string(),
        "info".to_string(),
        format!("disc:{disc_index}"),
    ]
}

/// Arguments for `makemkvcon -r mkv disc:<n> all <dir>`.
pub fn rip_args(disc_index: u32, output_dir: &Path) -> Vec<String> {
    vec![
        "-r".to_string(),
        "mkv".to_string(),
        format!("disc:{disc_index}"),
        "all".to_string(),
        output_dir.display().to_string(),
    ]
}
