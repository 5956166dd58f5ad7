//! Structured result returned by every capability operation.

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;

/// Category of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Bad SSID or passphrase; nothing was executed
    Validation,
    /// The process is not elevated; nothing was executed
    Permission,
    /// Adapter or connection profile lacks the needed capability
    UnsupportedHardware,
    /// The interpreter could not be spawned
    ProcessLaunch,
    /// A command exited non-zero or reported an error
    ProcessExecution,
    /// A poll deadline elapsed
    Timeout,
    /// The scripting bridge cannot be used in this environment
    BridgeUnavailable,
    /// Output that could not be classified
    Unknown,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Permission => "permission",
            Self::UnsupportedHardware => "unsupported_hardware",
            Self::ProcessLaunch => "process_launch",
            Self::ProcessExecution => "process_execution",
            Self::Timeout => "timeout",
            Self::BridgeUnavailable => "bridge_unavailable",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Outcome of a capability operation.
///
/// `message` is always ready for display and may embed a trace report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl BackendResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            failure: None,
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            failure: Some(kind),
        }
    }

    /// Check whether this result failed with `kind`.
    pub fn failed_with(&self, kind: FailureKind) -> bool {
        !self.success && self.failure == Some(kind)
    }

    /// Append a trace report (or any trailing block) to the message.
    pub fn with_appendix(mut self, appendix: Option<String>) -> Self {
        if let Some(text) = appendix {
            self.message = append_block(&self.message, &text);
        }
        self
    }

    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Join two blocks of text with a blank line.
pub(crate) fn append_block(message: &str, block: &str) -> String {
    if message.is_empty() {
        block.to_string()
    } else {
        format!("{}\n\n{}", message, block)
    }
}
