//! Process-backed runner for the host shell and PowerShell.
//!
//! Every command is spawned with piped stdout/stderr so nothing leaks into the
//! caller's terminal, and on Windows without a console window.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::{CommandLine, ShellOptions};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ProcessOutput, ProcessRunner};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Runner that spawns real interpreter processes.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    options: ShellOptions,
}

impl ShellRunner {
    pub fn new(options: ShellOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ShellOptions {
        &self.options
    }

    /// Build the interpreter invocation for a command line.
    fn build_command(&self, command: &CommandLine) -> (String, Command) {
        let (program, leading) = self.options.invocation(command.interpreter);
        let mut cmd = Command::new(program);
        cmd.args(leading);
        match command.interpreter {
            // cmd.exe parses its own command line and does not understand `\"`
            #[cfg(windows)]
            crate::config::Interpreter::Shell => {
                cmd.raw_arg(&command.text);
            }
            _ => {
                cmd.arg(&command.text);
            }
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);
        (program.to_string(), cmd)
    }
}

#[async_trait]
impl ProcessRunner for ShellRunner {
    async fn execute(&self, command: &CommandLine) -> RunnerResult<ProcessOutput> {
        let (program, mut cmd) = self.build_command(command);
        debug!(interpreter = %command.interpreter, "Executing: {}", command.text);

        let started_at = Utc::now();
        let start = Instant::now();

        let child = cmd.spawn().map_err(|e| RunnerError::LaunchFailed {
            program: program.clone(),
            message: e.to_string(),
        })?;

        let output = if self.options.timeout_seconds > 0 {
            let limit = Duration::from_secs(self.options.timeout_seconds);
            match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result.map_err(|e| RunnerError::WaitFailed(e.to_string()))?,
                Err(_) => {
                    warn!(
                        timeout_seconds = self.options.timeout_seconds,
                        "Process exceeded its time limit and was killed"
                    );
                    return Ok(ProcessOutput {
                        exit_code: -1,
                        stdout: String::new(),
                        stderr: format!(
                            "Process timed out after {} seconds",
                            self.options.timeout_seconds
                        ),
                        started_at,
                        duration_ms: start.elapsed().as_millis() as u64,
                    });
                }
            }
        } else {
            child
                .wait_with_output()
                .await
                .map_err(|e| RunnerError::WaitFailed(e.to_string()))?
        };

        let exit_code = output.status.code().unwrap_or(-1) as i64;
        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(exit_code, duration_ms, "Process finished");

        Ok(ProcessOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            started_at,
            duration_ms,
        })
    }
}
