//! Per-operation trace of executed commands.
//!
//! A [`TraceSession`] is created by the caller for one logical operation,
//! handed by reference to everything that runs commands, and read at the end
//! to build the developer report. Clones share the same record list, so a
//! background task can append to the session its operation owns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Returned by [`TraceSession::full_report`] when nothing was recorded.
pub const NO_LOGS_SENTINEL: &str = "No hay logs disponibles.";

/// Number of stderr characters quoted in the error summary.
const SUMMARY_STDERR_CHARS: usize = 100;

const BANNER_WIDTH: usize = 60;

/// Immutable record of one external command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    step: String,
    command: String,
    exit_code: i64,
    stdout: String,
    stderr: String,
    timestamp: DateTime<Local>,
}

impl ExecutionRecord {
    pub fn new(
        step: impl Into<String>,
        command: impl Into<String>,
        exit_code: i64,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            step: step.into(),
            command: command.into(),
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            timestamp: Local::now(),
        }
    }

    pub fn step(&self) -> &str {
        &self.step
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn exit_code(&self) -> i64 {
        self.exit_code
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// `HH:MM:SS.mmm` form used in reports.
    pub fn timestamp_label(&self) -> String {
        self.timestamp.format("%H:%M:%S%.3f").to_string()
    }

    /// Always derived from the exit code.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Human-readable block for one record.
    pub fn render(&self) -> String {
        let status = if self.success() { "OK" } else { "FALLO" };
        let mut lines = vec![
            format!("[{}] Paso: {}", self.timestamp_label(), self.step),
            format!("Estado: {}", status),
            "Comando ejecutado:".to_string(),
            format!("  {}", self.command),
            format!("Codigo de retorno: {}", self.exit_code),
        ];

        push_indented(&mut lines, "Salida (stdout):", &self.stdout);
        push_indented(&mut lines, "Error (stderr):", &self.stderr);

        lines.join("\n")
    }
}

/// Append `header` and the indented lines of `text`, unless it is blank.
pub fn push_indented(lines: &mut Vec<String>, header: &str, text: &str) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return;
    }
    lines.push(header.to_string());
    for line in trimmed.lines() {
        lines.push(format!("  {}", line));
    }
}

#[derive(Debug)]
struct SessionState {
    id: Uuid,
    enabled: AtomicBool,
    records: Mutex<Vec<ExecutionRecord>>,
}

/// Ordered, togglable log of the commands run by one logical operation.
#[derive(Debug, Clone)]
pub struct TraceSession {
    state: Arc<SessionState>,
}

impl Default for TraceSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceSession {
    /// Create a disabled session.
    pub fn new() -> Self {
        Self {
            state: Arc::new(SessionState {
                id: Uuid::new_v4(),
                enabled: AtomicBool::new(false),
                records: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Create a session with capture already switched on or off.
    pub fn with_capture(enabled: bool) -> Self {
        let session = Self::new();
        session.state.enabled.store(enabled, Ordering::SeqCst);
        session
    }

    pub fn id(&self) -> Uuid {
        self.state.id
    }

    pub fn enable(&self) {
        self.state.enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.state.enabled.store(false, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled.load(Ordering::SeqCst)
    }

    /// Build a record and keep it if capture is enabled.
    ///
    /// The record is returned either way so callers can build messages from it.
    pub fn log(
        &self,
        step: &str,
        command: &str,
        exit_code: i64,
        stdout: &str,
        stderr: &str,
    ) -> ExecutionRecord {
        let record = ExecutionRecord::new(step, command, exit_code, stdout, stderr);
        if self.is_enabled() {
            self.state.records.lock().push(record.clone());
            debug!(session = %self.state.id, step, exit_code, "Recorded execution");
        }
        record
    }

    /// Drop every record; capture state is left as is.
    pub fn clear(&self) {
        self.state.records.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.state.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.records.lock().is_empty()
    }

    /// Snapshot of the recorded executions in order.
    pub fn records(&self) -> Vec<ExecutionRecord> {
        self.state.records.lock().clone()
    }

    /// Render every record followed by a summary of the failed steps.
    pub fn full_report(&self) -> String {
        let records = self.records();
        if records.is_empty() {
            return NO_LOGS_SENTINEL.to_string();
        }

        let banner = "=".repeat(BANNER_WIDTH);
        let mut lines = vec![
            banner.clone(),
            "REPORTE DE DEBUG - MODO DESARROLLADOR".to_string(),
            banner.clone(),
            String::new(),
        ];

        for (i, record) in records.iter().enumerate() {
            lines.push(format!("--- LOG #{} ---", i + 1));
            lines.push(record.render());
            lines.push(String::new());
        }

        let failed: Vec<_> = records.iter().filter(|r| !r.success()).collect();
        if !failed.is_empty() {
            lines.push(banner.clone());
            lines.push("RESUMEN DE ERRORES:".to_string());
            lines.push(banner);
            for record in failed {
                lines.push(format!(
                    "- Paso '{}' fallo con codigo {}",
                    record.step, record.exit_code
                ));
                let stderr = record.stderr.trim();
                if !stderr.is_empty() {
                    let excerpt: String = stderr.chars().take(SUMMARY_STDERR_CHARS).collect();
                    lines.push(format!("  Error: {}", excerpt));
                }
            }
        }

        lines.join("\n")
    }

    /// The full report when capture is on, otherwise `None`.
    pub fn report_if_enabled(&self) -> Option<String> {
        self.is_enabled().then(|| self.full_report())
    }
}
