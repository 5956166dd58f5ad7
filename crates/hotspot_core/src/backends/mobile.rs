//! Native tethering strategy.
//!
//! Configuration and start/stop are asynchronous platform calls. Each one runs
//! as a bridge process in the background and is awaited through the
//! [`Poller`](crate::poller::Poller): configuration on the raw handle, start and
//! stop until the tethering manager reports the target operational state.

use std::time::Duration;

use async_trait::async_trait;
use hotspot_runner::{CommandLine, Interpreter, TraceSession};
use tracing::{debug, info, warn};

use crate::backend::{with_report, BackendKind, BackendState, EngineContext, HotspotBackend};
use crate::backends::diagnose_network;
use crate::backends::tethering::{
    configure_script, start_script, status_script, stop_script, support_script, BridgeOperation, BridgeReply,
    TargetState, TetheringStateProbe,
};
use crate::poller::{AsyncPollOutcome, RAW_HANDLE_DEADLINE};
use crate::result::{append_block, BackendResult, FailureKind};
use crate::validation::{AccessPointConfig, InputPolicy};

const SHARING_NOTE: &str = "La conexion a internet se compartira automaticamente.";

#[derive(Debug)]
pub struct MobileHotspotBackend {
    ctx: EngineContext,
    state: BackendState,
}

impl MobileHotspotBackend {
    pub fn new(ctx: EngineContext) -> Self {
        Self {
            ctx,
            state: BackendState::Idle,
        }
    }

    /// Run a bridge call and wait for it, optionally until `target` is reached.
    async fn await_bridge(
        &self,
        command: CommandLine,
        step: &'static str,
        target: Option<TargetState>,
        deadline: Duration,
        trace: &TraceSession,
    ) -> Result<(), BackendResult> {
        let poller = self.ctx.poller();
        let mut op = BridgeOperation::spawn(&self.ctx.runner, command, step, trace);

        let outcome = match target {
            Some(target) => {
                let mut probe = TetheringStateProbe::new(&self.ctx.runner, trace, target);
                poller.await_converged(&mut op, &mut probe, deadline).await
            }
            None => poller.await_operation(&mut op, deadline).await,
        };

        match outcome {
            AsyncPollOutcome::Completed(_) => Ok(()),
            AsyncPollOutcome::Canceled => Err(BackendResult::failure(
                FailureKind::ProcessExecution,
                "La operacion fue cancelada por el sistema.",
            )),
            AsyncPollOutcome::TimedOut => Err(BackendResult::failure(
                FailureKind::Timeout,
                format!(
                    "Tiempo de espera agotado ({} s) esperando respuesta del sistema.",
                    deadline.as_secs()
                ),
            )),
            AsyncPollOutcome::Failed(code) => {
                debug!(step, code, "Bridge call failed");
                Err(self.bridge_failure(&op, trace))
            }
        }
    }

    /// Failure built from what a failed bridge process left behind.
    fn bridge_failure(&self, op: &BridgeOperation, trace: &TraceSession) -> BackendResult {
        if let Some(reason) = op.join_error() {
            return BackendResult::failure(FailureKind::Unknown, format!("Error interno: {}", reason));
        }
        let Some(done) = op.completion() else {
            return BackendResult::failure(FailureKind::Unknown, "Sin respuesta del sistema.");
        };
        if done.outcome.launch_failed {
            return unavailable(&done.outcome.output);
        }
        match &done.reply {
            BridgeReply::Unavailable(detail) => unavailable(detail),
            BridgeReply::NoInternet => no_internet(),
            BridgeReply::Error(detail) => {
                let text = self
                    .ctx
                    .classifier
                    .format_error(detail, Some(&done.outcome.record), trace);
                BackendResult::failure(FailureKind::ProcessExecution, text)
            }
            _ => {
                let text = self
                    .ctx
                    .classifier
                    .format_error(&done.outcome.output, Some(&done.outcome.record), trace);
                BackendResult::failure(FailureKind::Unknown, text)
            }
        }
    }

    async fn disable(&mut self, step: &'static str, headline: &str, trace: &TraceSession) -> BackendResult {
        let deadline = self.ctx.poll.stop_deadline;
        match self
            .await_bridge(stop_script(), step, Some(TargetState::Off), deadline, trace)
            .await
        {
            Ok(()) => {
                self.state = BackendState::Idle;
                info!(backend = %BackendKind::Mobile, "Tethering stopped");
                with_report(BackendResult::success(headline), trace)
            }
            Err(failure) => prefixed(failure, "No se pudo detener Mobile Hotspot.", trace),
        }
    }
}

fn unavailable(detail: &str) -> BackendResult {
    let message = format!(
        "Mobile Hotspot no disponible en este entorno.\n\n{}\n\nIntenta usar netsh directo o PowerShell.",
        detail.trim()
    );
    BackendResult::failure(FailureKind::BridgeUnavailable, message)
}

fn no_internet() -> BackendResult {
    BackendResult::failure(
        FailureKind::UnsupportedHardware,
        "No hay conexion a internet.\nConectate primero.",
    )
}

/// Put `headline` in front of a failure and attach the report unless the
/// developer rendering already embedded it.
fn prefixed(failure: BackendResult, headline: &str, trace: &TraceSession) -> BackendResult {
    let embedded = failure.message.contains("REPORTE COMPLETO DE LA SESION");
    let result = BackendResult {
        message: append_block(headline, &failure.message),
        ..failure
    };
    if embedded {
        result
    } else {
        with_report(result, trace)
    }
}

#[async_trait]
impl HotspotBackend for MobileHotspotBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Mobile
    }

    fn state(&self) -> &BackendState {
        &self.state
    }

    async fn check_support(&self, trace: &TraceSession) -> BackendResult {
        trace.clear();

        let outcome = self.ctx.runner.run(&support_script(), "CHECK_SUPPORT", trace).await;
        if outcome.launch_failed {
            return with_report(unavailable(&outcome.output), trace);
        }

        let result = match BridgeReply::parse(outcome.record.stdout()) {
            BridgeReply::Supported(info) => BackendResult::success(format!(
                "Mobile Hotspot: COMPATIBLE\nEstado: {}\nSSID actual: {}\nClientes max: {}",
                info.state, info.current_ssid, info.max_clients
            )),
            BridgeReply::NoInternet => no_internet(),
            BridgeReply::Unavailable(detail) => unavailable(&detail),
            BridgeReply::Error(detail) => BackendResult::failure(
                FailureKind::UnsupportedHardware,
                format!(
                    "Mobile Hotspot no disponible.\n\nERROR: {}\n\nIntenta usar netsh directo o PowerShell.",
                    detail
                ),
            ),
            _ => BackendResult::failure(FailureKind::Unknown, "No se pudo verificar soporte"),
        };
        with_report(result, trace)
    }

    async fn create_hotspot(&mut self, ssid: &str, passphrase: &str, trace: &TraceSession) -> BackendResult {
        trace.clear();

        let config = match AccessPointConfig::new(ssid, passphrase, InputPolicy::LengthOnly) {
            Ok(config) => config,
            Err(e) => return BackendResult::failure(FailureKind::Validation, e.to_string()),
        };
        if let Some(refused) = self.ctx.require_elevation().await {
            return refused;
        }

        let headline = "No se pudo iniciar Mobile Hotspot.";
        let deadline = self.ctx.poll.start_deadline;

        // Configuration has no observable device state, only the raw handle.
        let configured = self
            .await_bridge(
                configure_script(config.ssid(), config.passphrase()),
                "CONFIGURE_HOTSPOT",
                None,
                RAW_HANDLE_DEADLINE.min(deadline),
                trace,
            )
            .await;
        if let Err(failure) = configured {
            let fatal = failure.failure.is_some_and(|kind| {
                matches!(kind, FailureKind::BridgeUnavailable | FailureKind::UnsupportedHardware)
            });
            if fatal {
                return prefixed(failure, headline, trace);
            }
            // The current configuration may still be usable.
            warn!(error = %failure.message, "Access point configuration failed; starting anyway");
        }

        if let Err(failure) = self
            .await_bridge(start_script(), "START_HOTSPOT", Some(TargetState::On), deadline, trace)
            .await
        {
            return prefixed(failure, headline, trace);
        }

        info!(backend = %BackendKind::Mobile, ssid = config.ssid(), "Tethering started");
        let message = format!(
            "Mobile Hotspot '{}' creado exitosamente!\n\n{}",
            config.ssid(),
            SHARING_NOTE
        );
        self.state = BackendState::Running { config };
        with_report(BackendResult::success(message), trace)
    }

    async fn stop_hotspot(&mut self, trace: &TraceSession) -> BackendResult {
        trace.clear();

        if let Some(refused) = self.ctx.require_elevation().await {
            return refused;
        }
        self.disable("STOP_HOTSPOT", "Mobile Hotspot detenido.", trace).await
    }

    /// Tethering has no persisted configuration to remove; deleting stops
    /// tethering once, whatever the believed state.
    async fn delete_hotspot(&mut self, trace: &TraceSession) -> BackendResult {
        trace.clear();

        if let Some(refused) = self.ctx.require_elevation().await {
            return refused;
        }
        self.disable("DISABLE_HOTSPOT", "Mobile Hotspot eliminado.", trace).await
    }

    async fn get_status(&self, trace: &TraceSession) -> BackendResult {
        trace.clear();

        let outcome = self.ctx.runner.run(&status_script(), "GET_STATUS", trace).await;
        if outcome.launch_failed {
            return with_report(unavailable(&outcome.output), trace);
        }

        let result = match BridgeReply::parse(outcome.record.stdout()) {
            BridgeReply::Status(status) => BackendResult::success(status.render()),
            BridgeReply::NoInternet => no_internet(),
            BridgeReply::Unavailable(detail) => unavailable(&detail),
            BridgeReply::Error(detail) => {
                BackendResult::failure(FailureKind::ProcessExecution, format!("ERROR: {}", detail))
            }
            _ => BackendResult::failure(FailureKind::Unknown, outcome.output),
        };
        with_report(result, trace)
    }

    async fn diagnose(&self, trace: &TraceSession) -> String {
        trace.clear();
        diagnose_network(&self.ctx, Interpreter::Shell, trace).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hotspot_runner::{MockProcessRunner, MockResponse};

    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::poller::START_DEADLINE;
    use crate::privileges::FixedPrivileges;

    fn backend(mock: &MockProcessRunner, clock: &Arc<ManualClock>) -> MobileHotspotBackend {
        MobileHotspotBackend::new(EngineContext::new(
            Arc::new(mock.clone()),
            Arc::new(FixedPrivileges(true)),
            clock.clone(),
        ))
    }

    fn working_bridge() -> MockProcessRunner {
        bridge_with_configure(MockResponse::success("SUCCESS: Configuracion aplicada"))
    }

    fn bridge_with_configure(configure: MockResponse) -> MockProcessRunner {
        MockProcessRunner::new()
            .respond_to("hotspot-bridge: configure", configure)
            .respond_to("hotspot-bridge: start", MockResponse::success("SUCCESS: Hotspot iniciado"))
            .respond_to("hotspot-bridge: stop", MockResponse::success("SUCCESS: Hotspot detenido"))
            .respond_to_sequence(
                "hotspot-bridge: state",
                vec![MockResponse::success("State: InTransition"), MockResponse::success("State: On")],
            )
    }

    #[tokio::test]
    async fn test_create_waits_for_operational_state() {
        let mock = working_bridge();
        let clock = Arc::new(ManualClock::new());
        let mut backend = backend(&mock, &clock);

        let result = backend
            .create_hotspot("Office5G", "longenoughpass", &TraceSession::new())
            .await;

        assert!(result.success, "{}", result.message);
        assert!(result.message.contains("se compartira automaticamente"));
        assert_eq!(backend.state().ssid(), Some("Office5G"));
        assert_eq!(mock.get_matching_calls("hotspot-bridge: state").len(), 2);
    }

    #[tokio::test]
    async fn test_short_passphrase_runs_nothing() {
        let mock = working_bridge();
        let clock = Arc::new(ManualClock::new());
        let mut backend = backend(&mock, &clock);
        let trace = TraceSession::with_capture(true);

        let result = backend.create_hotspot("Office5G", "short", &trace).await;

        assert!(result.failed_with(FailureKind::Validation));
        assert_eq!(mock.call_count(), 0);
        assert!(trace.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_bridge_is_specific() {
        let mock = MockProcessRunner::new().respond_to(
            "hotspot-bridge",
            MockResponse::success("BRIDGE_UNAVAILABLE: Unable to find type [Windows.Networking.Connectivity.NetworkInformation]"),
        );
        let clock = Arc::new(ManualClock::new());
        let mut backend = backend(&mock, &clock);

        let result = backend
            .create_hotspot("Office5G", "longenoughpass", &TraceSession::new())
            .await;

        assert!(result.failed_with(FailureKind::BridgeUnavailable));
        assert!(result.message.starts_with("No se pudo iniciar Mobile Hotspot."));
        assert!(!mock.was_called("hotspot-bridge: start"));
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_bridge_unavailable() {
        let mock = MockProcessRunner::new().simulate_launch_failure("program not found");
        let clock = Arc::new(ManualClock::new());
        let backend = backend(&mock, &clock);

        let result = backend.check_support(&TraceSession::new()).await;

        assert!(result.failed_with(FailureKind::BridgeUnavailable));
    }

    #[tokio::test]
    async fn test_configuration_error_does_not_stop_start() {
        let mock = bridge_with_configure(MockResponse::success(
            "ERROR: Exception calling ConfigureAccessPointAsync",
        ));
        let clock = Arc::new(ManualClock::new());
        let mut backend = backend(&mock, &clock);

        let result = backend
            .create_hotspot("Office5G", "longenoughpass", &TraceSession::new())
            .await;

        assert!(result.success, "{}", result.message);
    }

    #[tokio::test]
    async fn test_start_error_is_reported() {
        let mock = MockProcessRunner::new()
            .respond_to("hotspot-bridge: configure", MockResponse::success("SUCCESS: Configuracion aplicada"))
            .respond_to("hotspot-bridge: start", MockResponse::success("ERROR: WiFiDeviceOff - "));
        let clock = Arc::new(ManualClock::new());
        let mut backend = backend(&mock, &clock);

        let result = backend
            .create_hotspot("Office5G", "longenoughpass", &TraceSession::new())
            .await;

        assert!(result.failed_with(FailureKind::ProcessExecution));
        assert!(result.message.contains("Error: WiFiDeviceOff"));
        assert_eq!(backend.state(), &BackendState::Idle);
    }

    #[tokio::test]
    async fn test_hung_start_times_out() {
        let mock = MockProcessRunner::new()
            .respond_to("hotspot-bridge: configure", MockResponse::success("SUCCESS: Configuracion aplicada"))
            .respond_to("hotspot-bridge: start", MockResponse::success("SUCCESS").with_delay(3_600_000));
        let clock = Arc::new(ManualClock::new());
        let mut backend = backend(&mock, &clock);

        let result = backend
            .create_hotspot("Office5G", "longenoughpass", &TraceSession::new())
            .await;

        assert!(result.failed_with(FailureKind::Timeout));
        assert!(clock.now() >= Duration::from_secs(45));
    }

    #[tokio::test]
    async fn test_hung_configure_gives_up_at_raw_handle_deadline() {
        let mock = bridge_with_configure(MockResponse::success("SUCCESS").with_delay(3_600_000));
        let clock = Arc::new(ManualClock::new());
        let mut backend = backend(&mock, &clock);

        let result = backend
            .create_hotspot("Office5G", "longenoughpass", &TraceSession::new())
            .await;

        assert!(result.success, "{}", result.message);
        assert!(mock.was_called("hotspot-bridge: start"));
        assert!(clock.now() >= RAW_HANDLE_DEADLINE);
        assert!(clock.now() < Duration::from_secs(35));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_state_query_does_not_block_create() {
        let mock = MockProcessRunner::new()
            .respond_to("hotspot-bridge: configure", MockResponse::success("SUCCESS: Configuracion aplicada"))
            .respond_to("hotspot-bridge: start", MockResponse::success("SUCCESS: Hotspot iniciado"))
            .respond_to("hotspot-bridge: state", MockResponse::success("State: On").with_delay(3_600_000));
        let clock = Arc::new(ManualClock::new());
        let mut backend = backend(&mock, &clock);
        let started = tokio::time::Instant::now();

        let result = backend
            .create_hotspot("Office5G", "longenoughpass", &TraceSession::new())
            .await;

        assert!(result.success, "{}", result.message);
        assert!(started.elapsed() <= START_DEADLINE);
        assert!(backend.state().is_running());
    }

    #[tokio::test]
    async fn test_ssid_length_bounds_apply() {
        let mock = working_bridge();
        let clock = Arc::new(ManualClock::new());
        let mut backend = backend(&mock, &clock);

        for ssid in [String::new(), "x".repeat(33)] {
            let result = backend.create_hotspot(&ssid, "longenoughpass", &TraceSession::new()).await;
            assert!(result.failed_with(FailureKind::Validation), "{}", result.message);
        }
        let result = backend
            .create_hotspot("Office5G", &"p".repeat(64), &TraceSession::new())
            .await;
        assert!(result.failed_with(FailureKind::Validation));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_stop_and_delete() {
        let mock = MockProcessRunner::new()
            .respond_to("hotspot-bridge: stop", MockResponse::success("SUCCESS: Hotspot detenido"))
            .respond_to("hotspot-bridge: state", MockResponse::success("State: Off"));
        let clock = Arc::new(ManualClock::new());
        let mut backend = backend(&mock, &clock);

        let stopped = backend.stop_hotspot(&TraceSession::new()).await;
        assert!(stopped.success, "{}", stopped.message);
        assert_eq!(stopped.message, "Mobile Hotspot detenido.");

        mock.clear_calls();
        let deleted = backend.delete_hotspot(&TraceSession::new()).await;
        assert!(deleted.success);
        assert_eq!(mock.get_matching_calls("hotspot-bridge: stop").len(), 1);
    }

    #[tokio::test]
    async fn test_support_report() {
        let mock = MockProcessRunner::new().respond_to(
            "hotspot-bridge: support",
            MockResponse::success("SUPPORTED\nState: Off\nMaxClients: 8\nCurrentSSID: DESKTOP-42"),
        );
        let clock = Arc::new(ManualClock::new());
        let backend = backend(&mock, &clock);

        let result = backend.check_support(&TraceSession::new()).await;

        assert!(result.success);
        assert_eq!(
            result.message,
            "Mobile Hotspot: COMPATIBLE\nEstado: Off\nSSID actual: DESKTOP-42\nClientes max: 8"
        );
    }

    #[tokio::test]
    async fn test_no_internet() {
        let mock = MockProcessRunner::new().respond_to("hotspot-bridge: status", MockResponse::success("NO_INTERNET"));
        let clock = Arc::new(ManualClock::new());
        let backend = backend(&mock, &clock);

        let result = backend.get_status(&TraceSession::new()).await;

        assert!(result.failed_with(FailureKind::UnsupportedHardware));
        assert!(result.message.starts_with("No hay conexion a internet."));
    }
}
