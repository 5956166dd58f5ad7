//! Backend strategy implementations.

mod hosted;
mod mobile;
mod tethering;

pub use hosted::{
    adapter_name, hosted_network_supported, Direct, HostedFlavor, HostedNetworkBackend, NetshBackend,
    PowerShellBackend, Scripted,
};
pub use mobile::MobileHotspotBackend;
pub use tethering::{BridgeReply, SupportInfo, TetheringStatus};

use hotspot_runner::{CommandLine, Interpreter, TraceSession};

use crate::backend::EngineContext;

const DRIVERS_COMMAND: &str = "netsh wlan show drivers";
const INTERFACES_COMMAND: &str = "netsh wlan show interfaces";

/// Inspect adapter drivers and interfaces for common problems.
///
/// Returns one `- ` line per problem under a "Problemas detectados:" header,
/// or an empty string. Command failures are not problems in themselves.
pub(crate) async fn diagnose_network(
    ctx: &EngineContext,
    interpreter: Interpreter,
    trace: &TraceSession,
) -> String {
    let mut issues = Vec::new();

    let drivers = ctx
        .runner
        .run(&CommandLine::new(interpreter, DRIVERS_COMMAND), "DIAGNOSTICO DRIVERS", trace)
        .await;
    if !drivers.launch_failed {
        let output = drivers.record.stdout().to_lowercase();
        if hosted_network_supported(&output) == Some(false) {
            issues.push("- Tu adaptador NO soporta Hosted Network");
        }
        if output.contains("not found") || output.contains("no wireless") {
            issues.push("- No se detecto adaptador WiFi");
        }
    }

    let interfaces = ctx
        .runner
        .run(&CommandLine::new(interpreter, INTERFACES_COMMAND), "DIAGNOSTICO INTERFACES", trace)
        .await;
    if !interfaces.launch_failed {
        let output = interfaces.record.stdout().to_lowercase();
        if output.contains("disconnected") || output.contains("sin conexion") {
            issues.push("- El WiFi esta desconectado");
        }
        if output.contains("hardware off") || output.contains("apagado") {
            issues.push("- El WiFi esta apagado");
        }
    }

    if issues.is_empty() {
        String::new()
    } else {
        format!("Problemas detectados:\n{}", issues.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hotspot_runner::{MockProcessRunner, MockResponse};

    use super::*;
    use crate::clock::ManualClock;
    use crate::privileges::FixedPrivileges;

    fn context(mock: &MockProcessRunner) -> EngineContext {
        EngineContext::new(
            Arc::new(mock.clone()),
            Arc::new(FixedPrivileges(true)),
            Arc::new(ManualClock::new()),
        )
    }

    #[tokio::test]
    async fn test_diagnose_reports_every_problem() {
        let mock = MockProcessRunner::new()
            .respond_to(
                DRIVERS_COMMAND,
                MockResponse::success("Hosted network supported  : No\n"),
            )
            .respond_to(
                INTERFACES_COMMAND,
                MockResponse::success("State : disconnected\nRadio status : Hardware Off"),
            );

        let report = diagnose_network(&context(&mock), Interpreter::Shell, &TraceSession::new()).await;

        assert_eq!(
            report,
            "Problemas detectados:\n- Tu adaptador NO soporta Hosted Network\n- El WiFi esta desconectado\n- El WiFi esta apagado"
        );
    }

    #[tokio::test]
    async fn test_diagnose_healthy_host_is_empty() {
        let mock = MockProcessRunner::new()
            .respond_to(DRIVERS_COMMAND, MockResponse::success("Hosted network supported  : Yes"))
            .respond_to(INTERFACES_COMMAND, MockResponse::success("State : connected"));
        let trace = TraceSession::with_capture(true);

        let report = diagnose_network(&context(&mock), Interpreter::Shell, &trace).await;

        assert!(report.is_empty());
        assert_eq!(trace.len(), 2);
    }

    #[tokio::test]
    async fn test_diagnose_ignores_launch_failures() {
        let mock = MockProcessRunner::new().simulate_launch_failure("not found");

        let report = diagnose_network(&context(&mock), Interpreter::PowerShell, &TraceSession::new()).await;

        assert!(report.is_empty());
    }
}
