//! CLI command definitions.
//!
//! Every operation command builds a [`Session`] from the global options, runs
//! one operation through the background service and prints its message.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hotspot_core::{BackendKind, BackendResult, FailureKind, HotspotConfig, HotspotService, Operation};
use tracing::debug;

pub mod config;
pub mod create;
pub mod inspect;
pub mod lifecycle;
pub mod methods;

/// hotspot - share this machine's internet connection over Wi-Fi
#[derive(Parser)]
#[command(name = "hotspot")]
#[command(version, about = "Create and manage a Wi-Fi hotspot")]
#[command(long_about = r#"
Creates a Wi-Fi access point through one of three methods and falls back to
the next one when a method fails.

METHODS (priority order):
  mobile      → Mobile Hotspot through the Windows tethering API
  netsh       → Hosted network through netsh, invoked directly ("python")
  powershell  → Hosted network through netsh, invoked from PowerShell

EXIT CODES:
  0 - Success
  1 - The operation failed
  2 - Invalid arguments or configuration

Most operations require an elevated (Administrator) prompt.
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Method to use (tried first by `create`)
    #[arg(short, long, global = true, env = "HOTSPOT_BACKEND")]
    pub backend: Option<BackendKind>,

    /// Append the command trace report to every message
    #[arg(short, long, global = true, env = "HOTSPOT_VERBOSE")]
    pub trace: bool,

    /// YAML configuration file
    #[arg(short, long, global = true, env = "HOTSPOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the hotspot, falling back across methods
    Create(create::CreateArgs),

    /// Stop the running hotspot
    Stop,

    /// Stop and disable the hotspot
    Delete,

    /// Show the hotspot status
    Status,

    /// Check whether the selected method works on this machine
    Check,

    /// Look for common adapter and connection problems
    Diagnose,

    /// List the available methods in priority order
    Methods,

    /// Print the effective configuration
    Config,
}

/// A non-successful operation result.
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed ({kind})")]
pub struct OperationFailed {
    pub operation: &'static str,
    pub kind: FailureKind,
}

/// Global options resolved against the configuration file.
#[derive(Debug)]
pub struct Session {
    pub config: HotspotConfig,
    pub json: bool,
}

impl Session {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => HotspotConfig::from_file(path)
                .with_context(|| format!("Invalid configuration file: {}", path.display()))?,
            None => HotspotConfig::default(),
        };
        if let Some(backend) = cli.backend {
            config.backend = backend;
        }
        config.verbose |= cli.trace;
        debug!(backend = %config.backend, verbose = config.verbose, "Session configured");

        Ok(Self {
            config,
            json: cli.json,
        })
    }

    pub fn backend(&self) -> BackendKind {
        self.config.backend
    }

    pub fn service(&self) -> HotspotService {
        HotspotService::from_config(&self.config)
    }

    /// Run one operation and print its result.
    pub async fn run(&self, service: &HotspotService, operation: Operation) -> Result<()> {
        let name = operation.name();
        let result = service.run(self.backend(), operation).await?;
        self.report(name, &result)
    }

    fn report(&self, operation: &'static str, result: &BackendResult) -> Result<()> {
        if self.json {
            println!("{}", result.to_json()?);
        } else if result.success {
            println!("{}", result.message);
        } else {
            eprintln!("{}", result.message);
        }

        if result.success {
            Ok(())
        } else {
            Err(OperationFailed {
                operation,
                kind: result.failure.unwrap_or(FailureKind::Unknown),
            }
            .into())
        }
    }
}
