//! Backend capability contract and the context shared by every strategy.
//!
//! A backend realizes the access point through one external mechanism. All
//! of them answer the same operations with a [`BackendResult`]; none of them
//! returns an error or panics on a failed command.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --create ok--> Running --stop/delete ok--> Idle
//! ```
//!
//! A failed step leaves the state untouched.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use hotspot_runner::{CommandRunner, ProcessRunner, ShellOptions, ShellRunner, TraceSession};
use serde::{Deserialize, Serialize};

use crate::classifier::ErrorClassifier;
use crate::clock::{Clock, SystemClock};
use crate::error::CoreError;
use crate::poller::{PollSettings, Poller};
use crate::privileges::{PrivilegeProbe, SystemPrivileges, NOT_ELEVATED_MESSAGE};
use crate::result::{BackendResult, FailureKind};
use crate::validation::AccessPointConfig;

/// The three interchangeable strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Native tethering manager through the PowerShell WinRT bridge
    Mobile,
    /// Hosted-network CLI invoked directly
    #[serde(alias = "python")]
    Netsh,
    /// Hosted-network CLI invoked through PowerShell
    #[serde(rename = "powershell")]
    PowerShell,
}

impl BackendKind {
    /// Fixed priority order used by the fallback chain.
    pub const PRIORITY: [BackendKind; 3] = [Self::Mobile, Self::Netsh, Self::PowerShell];

    /// Tag used on the command line and in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Netsh => "netsh",
            Self::PowerShell => "powershell",
        }
    }

    /// Human-readable name shown in method headers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mobile => "Mobile Hotspot (Windows API)",
            Self::Netsh => "Python (netsh)",
            Self::PowerShell => "PowerShell (netsh)",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mobile" => Ok(Self::Mobile),
            // "python" is the historical tag of the direct strategy
            "netsh" | "python" => Ok(Self::Netsh),
            "powershell" | "ps" => Ok(Self::PowerShell),
            other => Err(CoreError::UnknownBackend(other.to_string())),
        }
    }
}

/// Per-instance session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BackendState {
    #[default]
    Idle,
    Running { config: AccessPointConfig },
}

impl BackendState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    /// SSID of the active session, if any.
    pub fn ssid(&self) -> Option<&str> {
        match self {
            Self::Running { config } => Some(config.ssid()),
            Self::Idle => None,
        }
    }
}

/// Capability contract implemented by every strategy.
///
/// Every operation takes the trace of the logical operation it belongs to and
/// clears it before running anything.
#[async_trait]
pub trait HotspotBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn state(&self) -> &BackendState;

    async fn check_support(&self, trace: &TraceSession) -> BackendResult;

    async fn create_hotspot(&mut self, ssid: &str, passphrase: &str, trace: &TraceSession) -> BackendResult;

    async fn stop_hotspot(&mut self, trace: &TraceSession) -> BackendResult;

    /// Stop (when running) and disable the access point.
    async fn delete_hotspot(&mut self, trace: &TraceSession) -> BackendResult;

    async fn get_status(&self, trace: &TraceSession) -> BackendResult;

    /// Problems found on the host, one per line; empty when none.
    async fn diagnose(&self, trace: &TraceSession) -> String;
}

/// Collaborators shared by the strategies.
#[derive(Clone)]
pub struct EngineContext {
    pub runner: CommandRunner,
    pub privileges: Arc<dyn PrivilegeProbe>,
    pub clock: Arc<dyn Clock>,
    pub classifier: Arc<ErrorClassifier>,
    pub poll: PollSettings,
}

impl EngineContext {
    pub fn new(
        process: Arc<dyn ProcessRunner>,
        privileges: Arc<dyn PrivilegeProbe>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            runner: CommandRunner::new(process),
            privileges,
            clock,
            classifier: Arc::new(ErrorClassifier::standard()),
            poll: PollSettings::default(),
        }
    }

    /// Context backed by real processes, the OS privilege check and tokio time.
    pub fn system(options: ShellOptions) -> Self {
        Self::new(
            Arc::new(ShellRunner::new(options)),
            Arc::new(SystemPrivileges),
            Arc::new(SystemClock::new()),
        )
    }

    pub fn with_poll(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    pub fn poller(&self) -> Poller {
        Poller::new(self.clock.clone(), self.poll.interval)
    }

    /// Permission failure when the process is not elevated.
    pub(crate) async fn require_elevation(&self) -> Option<BackendResult> {
        if self.privileges.is_elevated().await {
            None
        } else {
            Some(BackendResult::failure(FailureKind::Permission, NOT_ELEVATED_MESSAGE))
        }
    }
}

impl fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineContext")
            .field("runner", &self.runner)
            .field("poll", &self.poll)
            .finish_non_exhaustive()
    }
}

/// Append the trace report to `result` when capture is on.
pub(crate) fn with_report(result: BackendResult, trace: &TraceSession) -> BackendResult {
    result.with_appendix(trace.report_if_enabled())
}
