//! Error types for the runner module.

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur while launching an external command.
///
/// A command that starts and exits non-zero is not an error at this level;
/// it is reported through [`crate::ProcessOutput`] like any other exit.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to launch {program}: {message}")]
    LaunchFailed { program: String, message: String },

    #[error("Failed to wait for process: {0}")]
    WaitFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
