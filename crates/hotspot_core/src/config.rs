//! Engine configuration.
//!
//! Loaded from YAML; every field has a default so a partial (or missing)
//! file works. Command-line flags and environment variables are layered on
//! top by the binary.

use std::path::Path;
use std::time::Duration;

use hotspot_runner::ShellOptions;
use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;
use crate::error::{CoreError, CoreResult};
use crate::poller::{PollSettings, DEFAULT_POLL_INTERVAL, START_DEADLINE, STOP_DEADLINE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotspotConfig {
    /// Backend tried first by the fallback chain and used by single operations
    pub backend: BackendKind,
    /// Capture a trace report for every operation
    pub verbose: bool,
    /// Milliseconds between status checks of asynchronous platform calls
    pub poll_interval_ms: u64,
    /// Seconds to wait for tethering to start
    pub start_deadline_secs: u64,
    /// Seconds to wait for tethering to stop
    pub stop_deadline_secs: u64,
    /// Hard limit for any single external command, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,
    pub powershell_program: String,
    /// Overrides the platform shell (`cmd` / `sh`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell_program: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell_flag: Option<String>,
}

impl Default for HotspotConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Mobile,
            verbose: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            start_deadline_secs: START_DEADLINE.as_secs(),
            stop_deadline_secs: STOP_DEADLINE.as_secs(),
            command_timeout_secs: None,
            powershell_program: "powershell".to_string(),
            shell_program: None,
            shell_flag: None,
        }
    }
}

impl HotspotConfig {
    /// Load and validate a configuration file.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate YAML.
    pub fn from_yaml(yaml: &str) -> CoreResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> CoreResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(CoreError::InvalidConfig("poll_interval_ms must be positive".to_string()));
        }
        if self.start_deadline_secs == 0 || self.stop_deadline_secs == 0 {
            return Err(CoreError::InvalidConfig("deadlines must be positive".to_string()));
        }
        if self.powershell_program.trim().is_empty() {
            return Err(CoreError::InvalidConfig("powershell_program is empty".to_string()));
        }
        if self.shell_program.is_some() != self.shell_flag.is_some() {
            return Err(CoreError::InvalidConfig(
                "shell_program and shell_flag must be set together".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms),
            start_deadline: Duration::from_secs(self.start_deadline_secs),
            stop_deadline: Duration::from_secs(self.stop_deadline_secs),
        }
    }

    pub fn shell_options(&self) -> ShellOptions {
        let mut options = ShellOptions::new().powershell_program(self.powershell_program.clone());
        if let (Some(program), Some(flag)) = (&self.shell_program, &self.shell_flag) {
            options = options.shell(program.clone(), flag.clone());
        }
        if let Some(seconds) = self.command_timeout_secs {
            options = options.timeout(seconds);
        }
        options
    }
}
