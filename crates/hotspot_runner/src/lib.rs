//! # hotspot_runner
//!
//! Command execution layer for the hotspot engine.
//!
//! Every backend talks to the host through this crate: a command line is
//! handed to an interpreter, its output is captured, and an
//! [`ExecutionRecord`] is forwarded to the operation's [`TraceSession`].
//!
//! # Features
//!
//! - **Interpreters**: host shell and PowerShell, never with a visible console
//! - **Traced execution**: every run, successful or not, produces a record
//! - **Developer report**: ordered rendering of a session plus an error summary
//! - **Mock Runner**: for testing without executing anything
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hotspot_runner::{CommandLine, CommandRunner, ShellRunner, TraceSession};
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = CommandRunner::new(Arc::new(ShellRunner::default()));
//!     let trace = TraceSession::with_capture(true);
//!
//!     let outcome = runner
//!         .run(&CommandLine::shell("netsh wlan show drivers"), "VERIFICAR SOPORTE", &trace)
//!         .await;
//!
//!     println!("success: {}", outcome.success);
//!     println!("{}", trace.full_report());
//! }
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod mock;
pub mod runner;
pub mod shell;
pub mod trace;

pub use command::{CommandOutcome, CommandRunner, LAUNCH_FAILURE_EXIT_CODE};
pub use config::{CommandLine, Interpreter, ShellOptions};
pub use error::{RunnerError, RunnerResult};
pub use mock::{CapturedCall, MockProcessRunner, MockResponse};
pub use runner::{ProcessOutput, ProcessRunner};
pub use shell::ShellRunner;
pub use trace::{push_indented, ExecutionRecord, TraceSession, NO_LOGS_SENTINEL};
