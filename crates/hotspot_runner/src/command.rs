//! Traced command execution.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::CommandLine;
use crate::runner::ProcessRunner;
use crate::trace::{ExecutionRecord, TraceSession};

/// Exit code recorded when the interpreter could not be launched.
pub const LAUNCH_FAILURE_EXIT_CODE: i64 = -1;

/// Result of one traced command.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// Exit code was 0
    pub success: bool,
    /// Trimmed stdout on success; stderr (or stdout if stderr is blank) otherwise
    pub output: String,
    /// Record of this execution, whether or not the trace kept it
    pub record: ExecutionRecord,
    /// The interpreter never started
    pub launch_failed: bool,
}

/// Runs command lines and forwards every execution to a [`TraceSession`].
#[derive(Clone)]
pub struct CommandRunner {
    process: Arc<dyn ProcessRunner>,
}

impl CommandRunner {
    pub fn new(process: Arc<dyn ProcessRunner>) -> Self {
        Self { process }
    }

    /// Execute `command`, labelled `step` in the trace.
    pub async fn run(&self, command: &CommandLine, step: &str, trace: &TraceSession) -> CommandOutcome {
        match self.process.execute(command).await {
            Ok(output) => {
                let record = trace.log(
                    step,
                    &command.text,
                    output.exit_code,
                    &output.stdout,
                    &output.stderr,
                );

                if output.success() {
                    info!(step, duration_ms = output.duration_ms, "Step completed");
                    CommandOutcome {
                        success: true,
                        output: output.stdout.trim().to_string(),
                        record,
                        launch_failed: false,
                    }
                } else {
                    warn!(step, exit_code = output.exit_code, "Step failed");
                    let stderr = output.stderr.trim();
                    let text = if stderr.is_empty() {
                        output.stdout.trim()
                    } else {
                        stderr
                    };
                    CommandOutcome {
                        success: false,
                        output: text.to_string(),
                        record,
                        launch_failed: false,
                    }
                }
            }
            Err(e) => {
                let message = e.to_string();
                warn!(step, error = %message, "Could not launch interpreter");
                let record = trace.log(step, &command.text, LAUNCH_FAILURE_EXIT_CODE, "", &message);
                CommandOutcome {
                    success: false,
                    output: message,
                    record,
                    launch_failed: true,
                }
            }
        }
    }
}

impl std::fmt::Debug for CommandRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRunner").finish_non_exhaustive()
    }
}
