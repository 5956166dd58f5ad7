//! Hosted-network strategies.
//!
//! Both variants drive the legacy `netsh wlan` hosted-network CLI. The direct
//! variant runs it through the platform shell and enforces a shell-safe SSID
//! and an alphanumeric passphrase; the scripted variant goes through
//! PowerShell with single-quoted values and only checks lengths.

use std::marker::PhantomData;

use async_trait::async_trait;
use hotspot_runner::{CommandLine, CommandOutcome, Interpreter, TraceSession};
use tracing::{debug, info, warn};

use crate::backend::{with_report, BackendKind, BackendState, EngineContext, HotspotBackend};
use crate::backends::tethering::quote;
use crate::backends::{diagnose_network, DRIVERS_COMMAND};
use crate::classifier::GenericKind;
use crate::privileges::NOT_ELEVATED_NOTE;
use crate::result::{append_block, BackendResult, FailureKind};
use crate::validation::{AccessPointConfig, InputPolicy};

const SUPPORT_TOKEN: &str = "hosted network supported";
const SUPPORT_LOOKAHEAD_CHARS: usize = 30;

const START_COMMAND: &str = "netsh wlan start hostednetwork";
const STOP_COMMAND: &str = "netsh wlan stop hostednetwork";
const DISALLOW_COMMAND: &str = "netsh wlan set hostednetwork mode=disallow";
const STATUS_COMMAND: &str = "netsh wlan show hostednetwork";

const SHARING_NOTE: &str = "NOTA: Para compartir internet:\n1. Centro de redes > Cambiar configuracion del adaptador\n2. Propiedades del adaptador con internet > Compartir\n3. Selecciona 'Conexion de area local*'";

/// Whether the driver listing advertises hosted-network support.
///
/// `None` when the listing does not mention it at all. Otherwise `yes` must
/// appear within the 30 characters following the token.
pub fn hosted_network_supported(drivers_output: &str) -> Option<bool> {
    let lower = drivers_output.to_lowercase();
    let start = lower.find(SUPPORT_TOKEN)? + SUPPORT_TOKEN.len();
    let window: String = lower[start..].chars().take(SUPPORT_LOOKAHEAD_CHARS).collect();
    Some(window.contains("yes"))
}

/// Adapter name from an `Interface name` / `Nombre de interfaz` line.
pub fn adapter_name(drivers_output: &str) -> Option<String> {
    drivers_output
        .lines()
        .find(|line| line.contains("Interface name") || line.contains("Nombre de interfaz"))
        .and_then(|line| line.rsplit(':').next())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Static differences between the two hosted-network variants.
pub trait HostedFlavor: Send + Sync + 'static {
    const KIND: BackendKind;
    const INTERPRETER: Interpreter;
    const POLICY: InputPolicy;

    /// Quote a value as one argument for this interpreter.
    fn quote(value: &str) -> String;
}

/// Platform shell, strict passphrase charset.
#[derive(Debug)]
pub struct Direct;

impl HostedFlavor for Direct {
    const KIND: BackendKind = BackendKind::Netsh;
    const INTERPRETER: Interpreter = Interpreter::Shell;
    const POLICY: InputPolicy = InputPolicy::Strict;

    /// Strict validation keeps shell metacharacters out of the value.
    fn quote(value: &str) -> String {
        format!("\"{}\"", value)
    }
}

/// PowerShell, length checks only.
#[derive(Debug)]
pub struct Scripted;

impl HostedFlavor for Scripted {
    const KIND: BackendKind = BackendKind::PowerShell;
    const INTERPRETER: Interpreter = Interpreter::PowerShell;
    const POLICY: InputPolicy = InputPolicy::LengthOnly;

    fn quote(value: &str) -> String {
        quote(value)
    }
}

pub type NetshBackend = HostedNetworkBackend<Direct>;
pub type PowerShellBackend = HostedNetworkBackend<Scripted>;

/// Outcome of the pre-flight support check run by `create_hotspot`.
enum Support {
    Supported,
    Unsupported(BackendResult),
}

#[derive(Debug)]
pub struct HostedNetworkBackend<F: HostedFlavor> {
    ctx: EngineContext,
    state: BackendState,
    flavor: PhantomData<F>,
}

impl<F: HostedFlavor> HostedNetworkBackend<F> {
    pub fn new(ctx: EngineContext) -> Self {
        Self {
            ctx,
            state: BackendState::Idle,
            flavor: PhantomData,
        }
    }

    fn command(text: impl Into<String>) -> CommandLine {
        CommandLine::new(F::INTERPRETER, text)
    }

    fn execution_failure(&self, headline: &str, outcome: &CommandOutcome, trace: &TraceSession) -> BackendResult {
        let kind = if outcome.launch_failed {
            FailureKind::ProcessLaunch
        } else {
            FailureKind::ProcessExecution
        };
        let detail = self
            .ctx
            .classifier
            .format_error(&outcome.output, Some(&outcome.record), trace);
        BackendResult::failure(kind, append_block(headline, &detail))
    }

    /// Message for an adapter without hosted-network support.
    fn unsupported(&self, drivers_output: &str) -> BackendResult {
        let adapter = adapter_name(drivers_output).unwrap_or_else(|| "Desconocido".to_string());
        let diagnosis = self.ctx.classifier.generic(GenericKind::NotSupported);
        let message = format!(
            "Adaptador: {}\nHosted Network: NO SOPORTADO\n\n{}",
            adapter,
            diagnosis.render()
        );
        BackendResult::failure(FailureKind::UnsupportedHardware, message)
    }

    async fn preflight(&self, trace: &TraceSession) -> Support {
        let outcome = self
            .ctx
            .runner
            .run(&Self::command(DRIVERS_COMMAND), "VERIFICAR SOPORTE", trace)
            .await;
        if !outcome.success {
            let kind = if outcome.launch_failed {
                FailureKind::ProcessLaunch
            } else {
                FailureKind::ProcessExecution
            };
            return Support::Unsupported(BackendResult::failure(kind, "No se pudo verificar compatibilidad"));
        }

        match hosted_network_supported(&outcome.output) {
            Some(true) => Support::Supported,
            _ => Support::Unsupported(self.unsupported(&outcome.output)),
        }
    }

    async fn run_stop(&mut self, trace: &TraceSession) -> BackendResult {
        let outcome = self
            .ctx
            .runner
            .run(&Self::command(STOP_COMMAND), "DETENER HOTSPOT", trace)
            .await;
        if outcome.success {
            self.state = BackendState::Idle;
            info!(backend = %F::KIND, "Hosted network stopped");
            BackendResult::success("Hotspot detenido exitosamente.")
        } else {
            self.execution_failure("No se pudo detener el hotspot.", &outcome, trace)
        }
    }
}

#[async_trait]
impl<F: HostedFlavor> HotspotBackend for HostedNetworkBackend<F> {
    fn kind(&self) -> BackendKind {
        F::KIND
    }

    fn state(&self) -> &BackendState {
        &self.state
    }

    async fn check_support(&self, trace: &TraceSession) -> BackendResult {
        trace.clear();

        let outcome = self
            .ctx
            .runner
            .run(&Self::command(DRIVERS_COMMAND), "VERIFICAR COMPATIBILIDAD", trace)
            .await;
        if !outcome.success {
            return self.execution_failure("No se pudo verificar la compatibilidad.", &outcome, trace);
        }

        let result = match hosted_network_supported(&outcome.output) {
            Some(true) => {
                let mut message = match adapter_name(&outcome.output) {
                    Some(adapter) => format!("Tu adaptador WiFi ({}) es COMPATIBLE con Hosted Network.", adapter),
                    None => "Tu adaptador WiFi es COMPATIBLE con Hosted Network.".to_string(),
                };
                if !self.ctx.privileges.is_elevated().await {
                    message = append_block(&message, NOT_ELEVATED_NOTE);
                }
                BackendResult::success(message)
            }
            Some(false) => self.unsupported(&outcome.output),
            None => BackendResult::failure(FailureKind::Unknown, "No se pudo determinar la compatibilidad."),
        };
        with_report(result, trace)
    }

    async fn create_hotspot(&mut self, ssid: &str, passphrase: &str, trace: &TraceSession) -> BackendResult {
        trace.clear();

        let config = match AccessPointConfig::new(ssid, passphrase, F::POLICY) {
            Ok(config) => config,
            Err(e) => {
                debug!(backend = %F::KIND, error = %e, "Rejected access point settings");
                return BackendResult::failure(FailureKind::Validation, e.to_string());
            }
        };
        if let Some(refused) = self.ctx.require_elevation().await {
            return refused;
        }

        if let Support::Unsupported(result) = self.preflight(trace).await {
            warn!(backend = %F::KIND, "Adapter does not support hosted network");
            return with_report(result, trace);
        }

        let set_command = format!(
            "netsh wlan set hostednetwork mode=allow ssid={} key={}",
            F::quote(config.ssid()),
            F::quote(config.passphrase())
        );
        let outcome = self
            .ctx
            .runner
            .run(&Self::command(set_command), "CONFIGURAR HOTSPOT", trace)
            .await;
        if !outcome.success {
            return self.execution_failure("Error al configurar el hotspot.", &outcome, trace);
        }

        let outcome = self
            .ctx
            .runner
            .run(&Self::command(START_COMMAND), "INICIAR HOTSPOT", trace)
            .await;
        if !outcome.success {
            return self.execution_failure("No se pudo iniciar el hotspot.", &outcome, trace);
        }

        info!(backend = %F::KIND, ssid = config.ssid(), "Hosted network started");
        let message = format!("Hotspot '{}' creado exitosamente.\n\n{}", config.ssid(), SHARING_NOTE);
        self.state = BackendState::Running { config };
        with_report(BackendResult::success(message), trace)
    }

    async fn stop_hotspot(&mut self, trace: &TraceSession) -> BackendResult {
        trace.clear();

        if let Some(refused) = self.ctx.require_elevation().await {
            return refused;
        }

        let result = self.run_stop(trace).await;
        if result.success {
            with_report(result, trace)
        } else {
            result
        }
    }

    async fn delete_hotspot(&mut self, trace: &TraceSession) -> BackendResult {
        trace.clear();

        if let Some(refused) = self.ctx.require_elevation().await {
            return refused;
        }

        if self.state.is_running() {
            let stopped = self.run_stop(trace).await;
            if !stopped.success {
                return stopped;
            }
        }

        let outcome = self
            .ctx
            .runner
            .run(&Self::command(DISALLOW_COMMAND), "ELIMINAR HOTSPOT", trace)
            .await;
        if !outcome.success {
            return self.execution_failure("No se pudo eliminar el hotspot.", &outcome, trace);
        }

        self.state = BackendState::Idle;
        info!(backend = %F::KIND, "Hosted network disabled");
        with_report(BackendResult::success("Hotspot eliminado exitosamente."), trace)
    }

    async fn get_status(&self, trace: &TraceSession) -> BackendResult {
        trace.clear();

        let outcome = self
            .ctx
            .runner
            .run(&Self::command(STATUS_COMMAND), "OBTENER ESTADO", trace)
            .await;
        if !outcome.success {
            return self.execution_failure("No se pudo obtener el estado.", &outcome, trace);
        }
        with_report(BackendResult::success(outcome.output), trace)
    }

    async fn diagnose(&self, trace: &TraceSession) -> String {
        trace.clear();
        diagnose_network(&self.ctx, F::INTERPRETER, trace).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hotspot_runner::{MockProcessRunner, MockResponse};

    use super::*;
    use crate::clock::ManualClock;
    use crate::privileges::FixedPrivileges;

    const SUPPORTED_DRIVERS: &str = "Interface name: Wi-Fi\n\n    Driver                    : Intel(R) Wi-Fi 6 AX201\n    Hosted network supported  : Yes\n";
    const UNSUPPORTED_DRIVERS: &str = "Interface name: Wi-Fi\n\n    Driver                    : Realtek 8821CE\n    Hosted network supported  : No\n";

    fn context(mock: &MockProcessRunner, elevated: bool) -> EngineContext {
        EngineContext::new(
            Arc::new(mock.clone()),
            Arc::new(FixedPrivileges(elevated)),
            Arc::new(ManualClock::new()),
        )
    }

    fn healthy_mock() -> MockProcessRunner {
        MockProcessRunner::new().respond_to(DRIVERS_COMMAND, MockResponse::success(SUPPORTED_DRIVERS))
    }

    #[test]
    fn test_support_token_lookahead() {
        assert_eq!(hosted_network_supported(SUPPORTED_DRIVERS), Some(true));
        assert_eq!(hosted_network_supported(UNSUPPORTED_DRIVERS), Some(false));
        assert_eq!(hosted_network_supported("Radio types supported: 802.11n"), None);

        // "yes" further than 30 characters away does not count
        let far = format!("Hosted network supported{}yes", " ".repeat(40));
        assert_eq!(hosted_network_supported(&far), Some(false));
    }

    #[test]
    fn test_adapter_name() {
        assert_eq!(adapter_name(SUPPORTED_DRIVERS).as_deref(), Some("Wi-Fi"));
        assert_eq!(adapter_name("Nombre de interfaz: Wi-Fi 2").as_deref(), Some("Wi-Fi 2"));
        assert_eq!(adapter_name("Driver: x"), None);
    }

    #[tokio::test]
    async fn test_direct_rejects_symbols_before_running_anything() {
        let mock = healthy_mock();
        let mut backend = NetshBackend::new(context(&mock, true));
        let trace = TraceSession::with_capture(true);

        let result = backend.create_hotspot("Office5G", "pass word!", &trace).await;

        assert!(result.failed_with(FailureKind::Validation));
        assert_eq!(result.message, "La contrasena solo puede contener letras y numeros");
        assert_eq!(mock.call_count(), 0);
        assert!(trace.is_empty());
    }

    #[tokio::test]
    async fn test_scripted_accepts_symbols() {
        let mock = healthy_mock();
        let mut backend = PowerShellBackend::new(context(&mock, true));

        let result = backend
            .create_hotspot("Office5G", "pass word!", &TraceSession::new())
            .await;

        assert!(result.success, "{}", result.message);
        assert!(mock.get_calls().iter().all(|c| c.interpreter == Interpreter::PowerShell));
    }

    #[tokio::test]
    async fn test_scripted_values_are_single_quoted() {
        let mock = healthy_mock();
        let mut backend = PowerShellBackend::new(context(&mock, true));

        let result = backend
            .create_hotspot("Cafe \"Free\" O'Neil", "my$ecretpass", &TraceSession::new())
            .await;

        assert!(result.success, "{}", result.message);
        let set = mock.get_matching_calls("mode=allow");
        assert_eq!(set.len(), 1);
        assert_eq!(
            set[0].command,
            "netsh wlan set hostednetwork mode=allow ssid='Cafe \"Free\" O''Neil' key='my$ecretpass'"
        );
    }

    #[tokio::test]
    async fn test_direct_rejects_shell_metacharacters_in_ssid() {
        let mock = healthy_mock();
        let mut backend = NetshBackend::new(context(&mock, true));
        let trace = TraceSession::with_capture(true);

        let result = backend
            .create_hotspot("a\" & whoami & \"", "longenoughpass", &trace)
            .await;

        assert!(result.failed_with(FailureKind::Validation));
        assert!(result.message.starts_with("El SSID no puede contener"));
        assert_eq!(mock.call_count(), 0);
        assert!(trace.is_empty());
    }

    #[tokio::test]
    async fn test_length_bounds_apply_to_both_variants() {
        let mock = healthy_mock();
        let mut direct = NetshBackend::new(context(&mock, true));
        let mut scripted = PowerShellBackend::new(context(&mock, true));
        let trace = TraceSession::new();

        for backend in [&mut direct as &mut dyn HotspotBackend, &mut scripted] {
            let empty_ssid = backend.create_hotspot("", "longenoughpass", &trace).await;
            assert!(empty_ssid.failed_with(FailureKind::Validation));
            assert_eq!(empty_ssid.message, "El SSID debe tener entre 1 y 32 caracteres");

            let long_pass = backend.create_hotspot("Office5G", &"a".repeat(64), &trace).await;
            assert!(long_pass.failed_with(FailureKind::Validation));
            assert_eq!(long_pass.message, "La contrasena no puede exceder 63 caracteres");
        }

        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_not_elevated_is_refused_without_commands() {
        let mock = healthy_mock();
        let mut backend = NetshBackend::new(context(&mock, false));
        let trace = TraceSession::with_capture(true);

        let result = backend.create_hotspot("Office5G", "longenoughpass", &trace).await;

        assert!(result.failed_with(FailureKind::Permission));
        assert_eq!(mock.call_count(), 0);
        assert!(trace.is_empty());
    }

    #[tokio::test]
    async fn test_create_runs_set_then_start() {
        let mock = healthy_mock();
        let mut backend = NetshBackend::new(context(&mock, true));

        let result = backend
            .create_hotspot("Office5G", "longenoughpass", &TraceSession::new())
            .await;

        assert!(result.success);
        assert!(result.message.starts_with("Hotspot 'Office5G' creado exitosamente."));
        assert!(result.message.contains("NOTA: Para compartir internet"));
        assert_eq!(backend.state().ssid(), Some("Office5G"));

        let commands: Vec<String> = mock.get_calls().into_iter().map(|c| c.command).collect();
        assert_eq!(
            commands,
            vec![
                DRIVERS_COMMAND.to_string(),
                "netsh wlan set hostednetwork mode=allow ssid=\"Office5G\" key=\"longenoughpass\"".to_string(),
                START_COMMAND.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_start_failure_keeps_state_and_classifies() {
        let mock = healthy_mock().respond_to(
            START_COMMAND,
            MockResponse::failure(1, "The group or resource is not in the correct state to perform the requested operation."),
        );
        let mut backend = NetshBackend::new(context(&mock, true));

        let result = backend
            .create_hotspot("Office5G", "longenoughpass", &TraceSession::new())
            .await;

        assert!(result.failed_with(FailureKind::ProcessExecution));
        assert!(result.message.starts_with("No se pudo iniciar el hotspot.\n\n"));
        assert!(result.message.contains("El adaptador de red no esta en el estado correcto."));
        assert_eq!(backend.state(), &BackendState::Idle);
    }

    #[tokio::test]
    async fn test_developer_failure_embeds_report() {
        let mock = healthy_mock().respond_to(START_COMMAND, MockResponse::failure(1, "Access is denied."));
        let mut backend = NetshBackend::new(context(&mock, true));
        let trace = TraceSession::with_capture(true);

        let result = backend.create_hotspot("Office5G", "longenoughpass", &trace).await;

        assert!(result.message.contains("PASO DONDE FALLO: INICIAR HOTSPOT"));
        assert_eq!(result.message.matches("--- LOG #").count(), 3);
    }

    #[tokio::test]
    async fn test_unsupported_adapter() {
        let mock = MockProcessRunner::new().respond_to(DRIVERS_COMMAND, MockResponse::success(UNSUPPORTED_DRIVERS));
        let mut backend = NetshBackend::new(context(&mock, true));

        let result = backend
            .create_hotspot("Office5G", "longenoughpass", &TraceSession::new())
            .await;

        assert!(result.failed_with(FailureKind::UnsupportedHardware));
        assert!(result.message.to_lowercase().contains("adaptador no compatible"));
        assert!(result.message.contains("Adaptador: Wi-Fi"));
        assert!(!mock.was_called("mode=allow"));
    }

    #[tokio::test]
    async fn test_stop_then_delete_round_trip() {
        let mock = healthy_mock();
        let mut backend = PowerShellBackend::new(context(&mock, true));
        let trace = TraceSession::new();

        backend.create_hotspot("Office5G", "longenoughpass", &trace).await;
        assert!(backend.state().is_running());

        let stopped = backend.stop_hotspot(&trace).await;
        assert!(stopped.success);
        assert_eq!(stopped.message, "Hotspot detenido exitosamente.");
        assert!(!backend.state().is_running());

        mock.clear_calls();
        let deleted = backend.delete_hotspot(&trace).await;
        assert!(deleted.success);
        assert_eq!(deleted.message, "Hotspot eliminado exitosamente.");
        assert!(!mock.was_called(STOP_COMMAND));
        assert!(mock.was_called(DISALLOW_COMMAND));
    }

    #[tokio::test]
    async fn test_delete_while_running_stops_first() {
        let mock = healthy_mock();
        let mut backend = NetshBackend::new(context(&mock, true));
        let trace = TraceSession::new();
        backend.create_hotspot("Office5G", "longenoughpass", &trace).await;
        mock.clear_calls();

        let deleted = backend.delete_hotspot(&trace).await;

        assert!(deleted.success);
        let commands: Vec<String> = mock.get_calls().into_iter().map(|c| c.command).collect();
        assert_eq!(commands, vec![STOP_COMMAND.to_string(), DISALLOW_COMMAND.to_string()]);
        assert_eq!(backend.state(), &BackendState::Idle);
    }

    #[tokio::test]
    async fn test_failed_implicit_stop_keeps_running() {
        let mock = healthy_mock().respond_to(STOP_COMMAND, MockResponse::failure(1, "The device is not ready."));
        let mut backend = NetshBackend::new(context(&mock, true));
        let trace = TraceSession::new();
        backend.create_hotspot("Office5G", "longenoughpass", &trace).await;

        let deleted = backend.delete_hotspot(&trace).await;

        assert!(!deleted.success);
        assert!(deleted.message.contains("El dispositivo de red no esta listo."));
        assert!(backend.state().is_running());
        assert!(!mock.was_called(DISALLOW_COMMAND));
    }

    #[tokio::test]
    async fn test_check_support_notes_missing_elevation() {
        let mock = healthy_mock();
        let backend = NetshBackend::new(context(&mock, false));

        let result = backend.check_support(&TraceSession::new()).await;

        assert!(result.success);
        assert_eq!(
            result.message,
            "Tu adaptador WiFi (Wi-Fi) es COMPATIBLE con Hosted Network.\n\nADVERTENCIA: No estas ejecutando como Administrador."
        );
    }

    #[tokio::test]
    async fn test_check_support_without_token() {
        let mock = MockProcessRunner::new().respond_to(DRIVERS_COMMAND, MockResponse::success("There is no wireless interface on the system."));
        let backend = NetshBackend::new(context(&mock, true));

        let result = backend.check_support(&TraceSession::new()).await;

        assert!(result.failed_with(FailureKind::Unknown));
    }

    #[tokio::test]
    async fn test_status_returns_listing_with_report() {
        let mock = MockProcessRunner::new().respond_to(STATUS_COMMAND, MockResponse::success("Status : Started\n"));
        let backend = PowerShellBackend::new(context(&mock, true));
        let trace = TraceSession::with_capture(true);

        let result = backend.get_status(&trace).await;

        assert!(result.success);
        assert!(result.message.starts_with("Status : Started\n\n"));
        assert!(result.message.contains("OBTENER ESTADO"));
    }

    #[tokio::test]
    async fn test_launch_failure_is_process_launch() {
        let mock = MockProcessRunner::new().simulate_launch_failure("powershell not found");
        let backend = PowerShellBackend::new(context(&mock, true));

        let result = backend.get_status(&TraceSession::new()).await;

        assert!(result.failed_with(FailureKind::ProcessLaunch));
    }
}
