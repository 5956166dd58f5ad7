//! hotspot CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: The operation failed
//! - 2: Invalid arguments or configuration

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands, OperationFailed, Session};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const OPERATION_FAILED: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "hotspot=debug" } else { "hotspot=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},warn", default_level)));
    // Logs go to stderr so that --json output stays clean
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let session = match Session::from_cli(&cli) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(ExitCodes::INVALID_ARGS);
        }
    };

    let result = match cli.command {
        Commands::Create(args) => commands::create::execute(&session, args).await,
        Commands::Stop => commands::lifecycle::stop(&session).await,
        Commands::Delete => commands::lifecycle::delete(&session).await,
        Commands::Status => commands::inspect::status(&session).await,
        Commands::Check => commands::inspect::check(&session).await,
        Commands::Diagnose => commands::inspect::diagnose(&session).await,
        Commands::Methods => commands::methods::execute(&session),
        Commands::Config => commands::config::execute(&session),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => ExitCode::from(categorize_error(&e)),
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<OperationFailed>() {
        // The result message was already printed
        Some(failed) => {
            error!(operation = failed.operation, kind = %failed.kind, "Operation failed");
            ExitCodes::OPERATION_FAILED
        }
        None => {
            eprintln!("Error: {:#}", e);
            ExitCodes::OPERATION_FAILED
        }
    }
}
