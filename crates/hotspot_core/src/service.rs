//! Off-thread execution of logical operations.
//!
//! Each submitted operation runs on its own tokio task with a fresh
//! [`TraceSession`]; the caller gets a [`JoinHandle`] and is never blocked by
//! process waits or polling. The registry sits behind an async mutex so
//! operations never overlap on the same backend instance.

use std::sync::Arc;

use hotspot_runner::TraceSession;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use crate::backend::{BackendKind, EngineContext, HotspotBackend};
use crate::config::HotspotConfig;
use crate::error::{CoreError, CoreResult};
use crate::orchestrator::FallbackOrchestrator;
use crate::registry::BackendRegistry;
use crate::result::{append_block, BackendResult, FailureKind};

const NO_PROBLEMS: &str = "No se detectaron problemas obvios.\n\nSi el hotspot no funciona:\n1. Ejecuta como Administrador\n2. Verifica que el WiFi este encendido\n3. Cierra VPNs y firewalls temporalmente";

/// A logical operation against one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Always goes through the fallback chain, starting at the chosen backend
    Create { ssid: String, passphrase: String },
    Stop,
    Delete,
    Status,
    CheckSupport,
    Diagnose,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Stop => "stop",
            Self::Delete => "delete",
            Self::Status => "status",
            Self::CheckSupport => "check_support",
            Self::Diagnose => "diagnose",
        }
    }
}

/// Wrap raw diagnose output into the text shown to the user.
pub fn render_diagnosis(problems: &str) -> String {
    if problems.trim().is_empty() {
        format!("Diagnostico del sistema:\n\n{}", NO_PROBLEMS)
    } else {
        format!(
            "Diagnostico del sistema:\n\n{}\n\nEjecuta como Administrador para usar el hotspot.",
            problems
        )
    }
}

/// Runs operations in the background against a shared registry.
#[derive(Clone)]
pub struct HotspotService {
    registry: Arc<Mutex<BackendRegistry>>,
    orchestrator: Arc<FallbackOrchestrator>,
    verbose: bool,
}

impl HotspotService {
    pub fn new(registry: BackendRegistry) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
            orchestrator: Arc::new(FallbackOrchestrator::new()),
            verbose: false,
        }
    }

    /// Service over the standard strategies with real processes.
    pub fn from_config(config: &HotspotConfig) -> Self {
        let ctx = EngineContext::system(config.shell_options()).with_poll(config.poll_settings());
        Self::new(BackendRegistry::standard(&ctx)).verbose(config.verbose)
    }

    /// Capture a trace report for every operation.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Start `operation` on a background task.
    pub fn submit(&self, backend: BackendKind, operation: Operation) -> JoinHandle<BackendResult> {
        let service = self.clone();
        tokio::spawn(async move { service.execute(backend, operation).await })
    }

    /// Submit and wait for the result.
    pub async fn run(&self, backend: BackendKind, operation: Operation) -> CoreResult<BackendResult> {
        self.submit(backend, operation)
            .await
            .map_err(|e| CoreError::TaskFailed(e.to_string()))
    }

    async fn execute(&self, backend: BackendKind, operation: Operation) -> BackendResult {
        let trace = TraceSession::with_capture(self.verbose);
        let mut registry = self.registry.lock().await;
        info!(session = %trace.id(), backend = %backend, op = operation.name(), "Operation started");

        match operation {
            Operation::Create { ssid, passphrase } => {
                self.orchestrator
                    .create_with_fallback(&mut *registry, backend, &ssid, &passphrase, &trace)
                    .await
                    .result
            }
            other => match registry.get_required_mut(backend) {
                Ok(target) => dispatch(target, other, &trace).await,
                Err(e) => BackendResult::failure(FailureKind::Unknown, e.to_string()),
            },
        }
    }
}

/// Run a single-backend operation; `Create` here skips the fallback chain.
async fn dispatch(target: &mut dyn HotspotBackend, operation: Operation, trace: &TraceSession) -> BackendResult {
    match operation {
        Operation::Create { ssid, passphrase } => target.create_hotspot(&ssid, &passphrase, trace).await,
        Operation::Stop => target.stop_hotspot(trace).await,
        Operation::Delete => target.delete_hotspot(trace).await,
        Operation::Status => target.get_status(trace).await,
        Operation::CheckSupport => {
            let result = target.check_support(trace).await;
            BackendResult {
                message: format!(
                    "Verificacion de compatibilidad [{}]:\n\n{}",
                    target.kind().label(),
                    result.message
                ),
                ..result
            }
        }
        Operation::Diagnose => {
            let problems = target.diagnose(trace).await;
            let text = render_diagnosis(&problems);
            let text = match trace.report_if_enabled() {
                Some(report) => append_block(&text, &report),
                None => text,
            };
            BackendResult::success(text)
        }
    }
}

impl std::fmt::Debug for HotspotService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotspotService")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}
