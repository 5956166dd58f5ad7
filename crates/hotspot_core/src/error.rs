//! Error types for the core module.

use thiserror::Error;

use crate::backend::BackendKind;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by engine plumbing.
///
/// Capability operations never surface these: they always answer with a
/// [`crate::BackendResult`]. These cover configuration and wiring.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Backend not registered: {0}")]
    BackendNotRegistered(BackendKind),

    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Operation task failed: {0}")]
    TaskFailed(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
