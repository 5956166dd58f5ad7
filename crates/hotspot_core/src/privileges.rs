//! Elevation check.
//!
//! The probe talks to the OS directly and never through the traced command
//! runner, so a refused operation leaves no execution record behind.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Message returned when an operation needs elevation the process lacks.
pub const NOT_ELEVATED_MESSAGE: &str = "ADVERTENCIA: No estas ejecutando como Administrador.\nAlgunas funciones pueden fallar.\n\nClic derecho > Ejecutar como administrador";

/// Note appended to positive support checks in a non-elevated process.
pub const NOT_ELEVATED_NOTE: &str = "ADVERTENCIA: No estas ejecutando como Administrador.";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrivilegeProbe: Send + Sync {
    /// Whether the current process runs with administrative rights.
    async fn is_elevated(&self) -> bool;
}

/// Probe that asks the host operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPrivileges;

#[async_trait]
impl PrivilegeProbe for SystemPrivileges {
    #[cfg(windows)]
    async fn is_elevated(&self) -> bool {
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        // `net session` only succeeds for administrators.
        let status = Command::new("net")
            .arg("session")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .creation_flags(CREATE_NO_WINDOW)
            .status()
            .await;
        let elevated = status.map(|s| s.success()).unwrap_or(false);
        debug!(elevated, "Checked elevation");
        elevated
    }

    #[cfg(not(windows))]
    async fn is_elevated(&self) -> bool {
        let output = Command::new("id")
            .arg("-u")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await;
        let elevated = output
            .map(|o| String::from_utf8_lossy(&o.stdout).trim() == "0")
            .unwrap_or(false);
        debug!(elevated, "Checked elevation");
        elevated
    }
}

/// Probe with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedPrivileges(pub bool);

#[async_trait]
impl PrivilegeProbe for FixedPrivileges {
    async fn is_elevated(&self) -> bool {
        self.0
    }
}
