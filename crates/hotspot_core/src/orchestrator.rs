//! Fallback chaining of `create_hotspot` across backends.
//!
//! Backends are tried one at a time in the priority order rotated to start at
//! the preferred one. Support checks are not consulted: every backend gets its
//! attempt until one succeeds.

use hotspot_runner::TraceSession;
use serde::Serialize;
use tracing::{info, warn};

use crate::backend::BackendKind;
use crate::registry::BackendRegistry;
use crate::result::{BackendResult, FailureKind};

/// Note placed between two consecutive attempts.
pub const ATTEMPT_SEPARATOR: &str = "--- Intentando siguiente metodo...";

/// Priority order rotated so that `preferred` comes first.
pub fn attempt_order(preferred: BackendKind) -> Vec<BackendKind> {
    let start = BackendKind::PRIORITY
        .iter()
        .position(|kind| *kind == preferred)
        .unwrap_or(0);
    let mut order = BackendKind::PRIORITY.to_vec();
    order.rotate_left(start);
    order
}

/// One backend's try.
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub backend: BackendKind,
    pub result: BackendResult,
}

/// Aggregate of a fallback run.
#[derive(Debug, Clone, Serialize)]
pub struct FallbackOutcome {
    /// Overall result; the message lists every attempt under its header
    pub result: BackendResult,
    pub attempts: Vec<Attempt>,
}

impl FallbackOutcome {
    /// Backend that succeeded, if any.
    pub fn winner(&self) -> Option<BackendKind> {
        self.attempts
            .iter()
            .find(|attempt| attempt.result.success)
            .map(|attempt| attempt.backend)
    }
}

/// Drives `create_hotspot` across the registry.
#[derive(Debug, Default)]
pub struct FallbackOrchestrator;

impl FallbackOrchestrator {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_with_fallback(
        &self,
        registry: &mut BackendRegistry,
        preferred: BackendKind,
        ssid: &str,
        passphrase: &str,
        trace: &TraceSession,
    ) -> FallbackOutcome {
        let mut attempts: Vec<Attempt> = Vec::new();

        for kind in attempt_order(preferred) {
            info!(backend = %kind, attempt = attempts.len() + 1, "Trying backend");

            let result = match registry.get_required_mut(kind) {
                Ok(backend) => backend.create_hotspot(ssid, passphrase, trace).await,
                Err(e) => {
                    warn!(backend = %kind, error = %e, "Skipping backend");
                    BackendResult::failure(FailureKind::Unknown, e.to_string())
                }
            };

            let succeeded = result.success;
            attempts.push(Attempt { backend: kind, result });
            if succeeded {
                info!(backend = %kind, "Hotspot created");
                break;
            }
            warn!(backend = %kind, "Backend failed, moving on");
        }

        let result = aggregate(ssid, &attempts);
        FallbackOutcome { result, attempts }
    }
}

fn aggregate(ssid: &str, attempts: &[Attempt]) -> BackendResult {
    let sections: Vec<String> = attempts
        .iter()
        .map(|attempt| format!("[METODO: {}]\n\n{}", attempt.backend.label(), attempt.result.message))
        .collect();
    let message = format!(
        "Creando hotspot '{}' con multiples metodos...\n\n{}",
        ssid,
        sections.join(&format!("\n\n{}\n\n", ATTEMPT_SEPARATOR))
    );

    match attempts.last() {
        Some(last) if last.result.success => BackendResult::success(message),
        Some(last) => BackendResult::failure(last.result.failure.unwrap_or(FailureKind::Unknown), message),
        None => BackendResult::failure(FailureKind::Unknown, message),
    }
}
