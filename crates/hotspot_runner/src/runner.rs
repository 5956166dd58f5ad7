//! Process runner trait and types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CommandLine;
use crate::error::RunnerResult;

/// Raw result of an external process that was launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOutput {
    /// Exit code (-1 when the platform reports none)
    pub exit_code: i64,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Execution start time
    pub started_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ProcessOutput {
    /// Check if execution was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes command lines through an interpreter and captures their output.
///
/// Implementations never inherit the caller's standard streams and never
/// open a visible console window.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run a command line to completion.
    ///
    /// `Err` means the interpreter could not be started at all.
    async fn execute(&self, command: &CommandLine) -> RunnerResult<ProcessOutput>;
}
