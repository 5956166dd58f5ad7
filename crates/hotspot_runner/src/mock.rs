//! Mock process runner for testing.
//!
//! Provides a configurable mock implementation of the ProcessRunner trait
//! for use in unit tests without touching the host's network stack.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::config::{CommandLine, Interpreter};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ProcessOutput, ProcessRunner};

/// Predefined mock response for a command execution.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
    pub delay_ms: u64,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            delay_ms: 0,
        }
    }

    pub fn failure(exit_code: i64, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            delay_ms: 0,
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    /// Make the mock take this long before "exiting".
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub interpreter: Interpreter,
    pub command: String,
}

/// Responses served to commands whose text contains `pattern`.
#[derive(Debug)]
struct ResponseRule {
    pattern: String,
    responses: Vec<MockResponse>,
    served: AtomicUsize,
}

impl ResponseRule {
    /// Serve responses in order, repeating the last one once exhausted.
    fn next(&self) -> MockResponse {
        let index = self.served.fetch_add(1, Ordering::SeqCst);
        let last = self.responses.len().saturating_sub(1);
        self.responses
            .get(index.min(last))
            .cloned()
            .unwrap_or_else(|| MockResponse::success(""))
    }
}

/// Mock process runner for testing.
///
/// Commands are answered by the first rule whose pattern occurs in the
/// command text; otherwise by the sequential response list (cycling), and
/// finally by an empty success.
#[derive(Clone)]
pub struct MockProcessRunner {
    /// Pattern-matched responses, checked in declaration order.
    rules: Arc<RwLock<Vec<Arc<ResponseRule>>>>,
    /// Predefined responses for commands no rule matches.
    responses: Arc<RwLock<Vec<MockResponse>>>,
    /// Index of next sequential response to return.
    response_index: Arc<AtomicUsize>,
    /// Captured calls for verification.
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Simulated launch failure message.
    launch_failure: Arc<RwLock<Option<String>>>,
}

impl Default for MockProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProcessRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RwLock::new(Vec::new())),
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            launch_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Add a mock response for the next unmatched call.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    /// Set multiple sequential responses.
    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        *self.responses.write() = responses;
        self
    }

    /// Answer every command containing `pattern` with `response`.
    pub fn respond_to(self, pattern: impl Into<String>, response: MockResponse) -> Self {
        self.respond_to_sequence(pattern, vec![response])
    }

    /// Answer commands containing `pattern` with `responses` in order.
    pub fn respond_to_sequence(
        self,
        pattern: impl Into<String>,
        responses: Vec<MockResponse>,
    ) -> Self {
        self.rules.write().push(Arc::new(ResponseRule {
            pattern: pattern.into(),
            responses,
            served: AtomicUsize::new(0),
        }));
        self
    }

    /// Make every call fail to launch.
    pub fn simulate_launch_failure(self, message: impl Into<String>) -> Self {
        *self.launch_failure.write() = Some(message.into());
        self
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if any command containing `pattern` was run.
    pub fn was_called(&self, pattern: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.command.contains(pattern))
    }

    /// Get calls whose command contains `pattern`.
    pub fn get_matching_calls(&self, pattern: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.command.contains(pattern))
            .cloned()
            .collect()
    }

    fn record_call(&self, command: &CommandLine) {
        self.captured_calls.write().push(CapturedCall {
            interpreter: command.interpreter,
            command: command.text.clone(),
        });
    }

    fn next_response(&self, command: &CommandLine) -> MockResponse {
        let rule = self
            .rules
            .read()
            .iter()
            .find(|r| command.text.contains(&r.pattern))
            .cloned();
        if let Some(rule) = rule {
            return rule.next();
        }

        let responses = self.responses.read();
        if responses.is_empty() {
            return MockResponse::success("");
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses
            .get(index % responses.len())
            .cloned()
            .unwrap_or_else(|| MockResponse::success(""))
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn execute(&self, command: &CommandLine) -> RunnerResult<ProcessOutput> {
        self.record_call(command);

        if let Some(message) = self.launch_failure.read().clone() {
            return Err(RunnerError::LaunchFailed {
                program: command.interpreter.name().to_string(),
                message,
            });
        }

        let response = self.next_response(command);
        if response.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(response.delay_ms)).await;
        }

        Ok(ProcessOutput {
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
            started_at: Utc::now(),
            duration_ms: response.delay_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_runner_basic() {
        let runner = MockProcessRunner::new().add_response(MockResponse::success("test output"));

        let result = runner
            .execute(&CommandLine::shell("echo hello"))
            .await
            .unwrap();

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "test output");
    }

    #[tokio::test]
    async fn test_mock_runner_captures_calls() {
        let runner = MockProcessRunner::new();

        let _ = runner
            .execute(&CommandLine::powershell("netsh wlan show drivers"))
            .await;

        let calls = runner.get_matching_calls("show drivers");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].interpreter, Interpreter::PowerShell);
    }

    #[tokio::test]
    async fn test_rules_take_precedence_and_repeat_last() {
        let runner = MockProcessRunner::new()
            .add_response(MockResponse::success("fallback"))
            .respond_to_sequence(
                "State",
                vec![MockResponse::success("State: Off"), MockResponse::success("State: On")],
            );

        let cmd = CommandLine::powershell("Write-Output \"State: ...\"");
        let first = runner.execute(&cmd).await.unwrap();
        let second = runner.execute(&cmd).await.unwrap();
        let third = runner.execute(&cmd).await.unwrap();
        let other = runner.execute(&CommandLine::shell("whoami")).await.unwrap();

        assert_eq!(first.stdout, "State: Off");
        assert_eq!(second.stdout, "State: On");
        assert_eq!(third.stdout, "State: On");
        assert_eq!(other.stdout, "fallback");
    }

    #[tokio::test]
    async fn test_mock_runner_launch_failure() {
        let runner = MockProcessRunner::new().simulate_launch_failure("simulated error");

        let result = runner.execute(&CommandLine::shell("netsh")).await;

        assert!(matches!(result, Err(RunnerError::LaunchFailed { .. })));
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_clear_calls() {
        let runner = MockProcessRunner::new();
        let _ = runner.execute(&CommandLine::shell("a")).await;
        assert!(runner.was_called("a"));

        runner.clear_calls();
        assert_eq!(runner.call_count(), 0);
    }
}
