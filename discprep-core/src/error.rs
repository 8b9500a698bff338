// ============================================================================
// discprep-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the discprep Core Library
//
// Every fallible operation in the core returns `CoreResult<T>`. Nothing in this
// crate terminates the process; the CLI maps errors to exit codes.
//
// Parse failures of individual fields (duration, size) and unrecognised
// MakeMKV attribute ids are deliberately NOT errors: the field becomes `None`
// or lands in the unknown-attribute bucket.

use thiserror::Error;

/// Errors produced by the discprep core library.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    PathError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No optical disc found under {0}")]
    NoDiscFound(String),

    /// The scan output contained no per-title records.
    #[error("No titles found in scan output")]
    NoTitlesFound,

    /// A recognised read-error signature kept appearing until retries ran out.
    #[error(
        "Disc read error persisted after {attempts} attempt(s) (last offset: {}). \
         Clean the disc with a soft cloth from the center outwards, try a different drive, \
         or check whether the disc plays in a standalone player.",
        .offset.as_deref().unwrap_or("unknown")
    )]
    DiscReadError {
        attempts: u32,
        offset: Option<String>,
    },

    /// The disc was ejected for recovery but never came back.
    #[error(
        "Disc '{volume}' was not detected within {waited_secs}s after ejecting. \
         Insert the disc and run again."
    )]
    DiscNotReinserted { volume: String, waited_secs: u64 },

    #[error("Required dependency not found: {0}")]
    DependencyNotFound(String),

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, std::io::Error),

    #[error("Failed waiting for {0}: {1}")]
    CommandWait(String, std::io::Error),

    /// The external tool exited unsuccessfully without a recognised read error.
    #[error(
        "{tool} exited with {}",
        .code.map_or_else(|| "a signal".to_string(), |c| format!("status {c}"))
    )]
    NonZeroExit { tool: String, code: Option<i32> },

    #[error("{0} timed out after {1}s")]
    Timeout(String, u64),

    /// Network-level failure talking to the metadata store.
    #[error("Metadata store unavailable: {0}")]
    StoreUnavailable(String),

    /// The metadata store answered with an unexpected status.
    #[error("Metadata store returned HTTP {status}: {body}")]
    StoreResponse { status: u16, body: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Notification error: {0}")]
    NotificationError(String),

    #[error("{0}")]
    OperationFailed(String),
}

/// Result alias used across the core library.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        CoreError::StoreUnavailable(err.to_string())
    }
}

// ---- Helper constructors ----

pub(crate) fn command_start_error(tool: &str, err: std::io::Error) -> CoreError {
    if err.kind() == std::io::ErrorKind::NotFound {
        CoreError::DependencyNotFound(tool.to_string())
    } else {
        CoreError::CommandStart(tool.to_string(), err)
    }
}

pub(crate) fn command_wait_error(tool: &str, err: std::io::Error) -> CoreError {
    CoreError::CommandWait(tool.to_string(), err)
}

pub(crate) fn command_failed_error(tool: &str, code: Option<i32>) -> CoreError {
    CoreError::NonZeroExit {
        tool: tool.to_string(),
        code,
    }
}

impl CoreError {
    /// True for errors the ready-poll should retry rather than surface.
    ///
    /// Undecodable bodies count as transient: a proxy or maintenance page can
    /// answer in place of the store for a while.
    pub fn is_transient(&self) -> bool {
        match self {
            CoreError::StoreUnavailable(_) => true,
            CoreError::StoreResponse { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            CoreError::Io(_) | CoreError::Json(_) => true,
            _ => false,
        }
    }
}
