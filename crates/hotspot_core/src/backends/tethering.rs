//! PowerShell bridge to the native tethering manager.
//!
//! Each script loads the WinRT projections, performs one tethering call and
//! reports through line markers on stdout:
//!
//! - `SUCCESS: <detail>` / `ERROR: <detail>`
//! - `NO_INTERNET` when there is no connection profile to share
//! - `SUPPORTED` followed by `State:`, `MaxClients:` and `CurrentSSID:` lines
//! - `STATUS` followed by `SSID:`, `State:`, `Clients:` and `MaxClients:` lines
//! - `CANCELED` when the platform call was canceled
//! - `BRIDGE_UNAVAILABLE: <detail>` when the projections cannot be loaded

use async_trait::async_trait;
use hotspot_runner::{CommandLine, CommandOutcome, CommandRunner, TraceSession};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::poller::{AsyncOperation, ConvergenceProbe, OperationStatus};

const PRELUDE: &str = r#"
try {
    [Windows.Networking.Connectivity.NetworkInformation,Windows.Networking.Connectivity,ContentType=WindowsRuntime] > $null
    [Windows.Networking.NetworkOperators.NetworkOperatorTetheringManager,Windows.Networking.NetworkOperators,ContentType=WindowsRuntime] > $null
    Add-Type -AssemblyName System.Runtime.WindowsRuntime
} catch {
    Write-Output "BRIDGE_UNAVAILABLE: $($_.Exception.Message)"
    exit 0
}

$asTaskGeneric = (
    [System.WindowsRuntimeSystemExtensions].GetMethods() | Where-Object {
        $_.Name -eq 'AsTask' -and
        $_.GetParameters().Count -eq 1 -and
        $_.GetParameters()[0].ParameterType.Name -eq 'IAsyncOperation`1'
    }
)[0]

Function Await-Task($asyncOp, $resultType) {
    $asTask = $asTaskGeneric.MakeGenericMethod($resultType)
    $netTask = $asTask.Invoke($null, @($asyncOp))
    try { $netTask.Wait(-1) > $null } catch { }
    if ($netTask.IsCanceled) {
        [Console]::Out.WriteLine("CANCELED")
        exit 0
    }
    if ($netTask.IsFaulted) { throw $netTask.Exception.InnerException }
    return $netTask.Result
}

Function Get-Tethering {
    $connection = [Windows.Networking.Connectivity.NetworkInformation]::GetInternetConnectionProfile()
    if ($connection -eq $null) {
        Write-Output "NO_INTERNET"
        exit 0
    }
    return [Windows.Networking.NetworkOperators.NetworkOperatorTetheringManager]::CreateFromConnectionProfile($connection)
}
"#;

const SUPPORT_BODY: &str = r#"# hotspot-bridge: support
$tethering = Get-Tethering
$config = $tethering.GetCurrentAccessPointConfiguration()
Write-Output "SUPPORTED"
Write-Output "State: $($tethering.TetheringOperationalState)"
Write-Output "MaxClients: $($tethering.MaxClientCount)"
Write-Output "CurrentSSID: $($config.Ssid)"
"#;

const CONFIGURE_BODY: &str = r#"# hotspot-bridge: configure
$tethering = Get-Tethering
$config = $tethering.GetCurrentAccessPointConfiguration()
$config.Ssid = {ssid}
$config.Passphrase = {passphrase}
$op = $tethering.ConfigureAccessPointAsync($config)
$null = Await-Task $op ([Windows.Networking.NetworkOperators.NetworkOperatorTetheringAccessPointConfiguration])
Write-Output "SUCCESS: Configuracion aplicada"
"#;

const START_BODY: &str = r#"# hotspot-bridge: start
$tethering = Get-Tethering
$op = $tethering.StartTetheringAsync()
$result = Await-Task $op ([Windows.Networking.NetworkOperators.NetworkOperatorTetheringOperationResult])
if ($result.Status -eq [Windows.Networking.NetworkOperators.TetheringOperationStatus]::Success) {
    Write-Output "SUCCESS: Hotspot iniciado"
} else {
    Write-Output "ERROR: $($result.Status) - $($result.AdditionalErrorMessage)"
}
"#;

const STOP_BODY: &str = r#"# hotspot-bridge: stop
$tethering = Get-Tethering
$op = $tethering.StopTetheringAsync()
$result = Await-Task $op ([Windows.Networking.NetworkOperators.NetworkOperatorTetheringOperationResult])
if ($result.Status -eq [Windows.Networking.NetworkOperators.TetheringOperationStatus]::Success) {
    Write-Output "SUCCESS: Hotspot detenido"
} else {
    Write-Output "ERROR: $($result.Status) - $($result.AdditionalErrorMessage)"
}
"#;

const STATUS_BODY: &str = r#"# hotspot-bridge: status
$tethering = Get-Tethering
$config = $tethering.GetCurrentAccessPointConfiguration()
Write-Output "STATUS"
Write-Output "SSID: $($config.Ssid)"
Write-Output "State: $($tethering.TetheringOperationalState)"
Write-Output "Clients: $($tethering.ClientCount)"
Write-Output "MaxClients: $($tethering.MaxClientCount)"
"#;

const STATE_BODY: &str = r#"# hotspot-bridge: state
$tethering = Get-Tethering
Write-Output "State: $($tethering.TetheringOperationalState)"
"#;

/// Wrap a script body with the projection prelude and the error guard.
fn bridge_script(body: &str) -> CommandLine {
    let indented: Vec<String> = body.lines().map(|line| format!("    {}", line)).collect();
    CommandLine::powershell(format!(
        "{}\ntry {{\n{}\n}} catch {{\n    Write-Output \"ERROR: $($_.Exception.Message)\"\n}}\n",
        PRELUDE,
        indented.join("\n")
    ))
}

/// PowerShell single-quoted literal.
pub(crate) fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub(crate) fn support_script() -> CommandLine {
    bridge_script(SUPPORT_BODY)
}

pub(crate) fn configure_script(ssid: &str, passphrase: &str) -> CommandLine {
    bridge_script(
        &CONFIGURE_BODY
            .replace("{ssid}", &quote(ssid))
            .replace("{passphrase}", &quote(passphrase)),
    )
}

pub(crate) fn start_script() -> CommandLine {
    bridge_script(START_BODY)
}

pub(crate) fn stop_script() -> CommandLine {
    bridge_script(STOP_BODY)
}

pub(crate) fn status_script() -> CommandLine {
    bridge_script(STATUS_BODY)
}

pub(crate) fn state_script() -> CommandLine {
    bridge_script(STATE_BODY)
}

/// Fields of a positive support check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportInfo {
    pub state: String,
    pub max_clients: String,
    pub current_ssid: String,
}

/// Live tethering status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TetheringStatus {
    pub ssid: String,
    pub state: String,
    pub clients: String,
    pub max_clients: String,
}

impl TetheringStatus {
    pub fn render(&self) -> String {
        format!(
            "Estado Mobile Hotspot:\n======================\nSSID: {}\nEstado: {}\nClientes: {} / {}",
            self.ssid, self.state, self.clients, self.max_clients
        )
    }
}

/// Parsed bridge output. The first marker line wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeReply {
    Success(String),
    Error(String),
    NoInternet,
    Canceled,
    Unavailable(String),
    Supported(SupportInfo),
    Status(TetheringStatus),
    /// No marker at all
    Unrecognized(String),
}

fn field(output: &str, prefix: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(prefix))
        .map(|value| value.trim().to_string())
}

impl BridgeReply {
    pub fn parse(output: &str) -> Self {
        for line in output.lines().map(str::trim) {
            if let Some(detail) = line.strip_prefix("BRIDGE_UNAVAILABLE:") {
                return Self::Unavailable(detail.trim().to_string());
            }
            if let Some(detail) = line.strip_prefix("SUCCESS:") {
                return Self::Success(detail.trim().to_string());
            }
            if let Some(detail) = line.strip_prefix("ERROR:") {
                return Self::Error(detail.trim().to_string());
            }
            match line {
                "NO_INTERNET" => return Self::NoInternet,
                "CANCELED" => return Self::Canceled,
                "SUPPORTED" => {
                    return Self::Supported(SupportInfo {
                        state: field(output, "State:").unwrap_or_else(|| "Unknown".to_string()),
                        max_clients: field(output, "MaxClients:").unwrap_or_else(|| "?".to_string()),
                        current_ssid: field(output, "CurrentSSID:").unwrap_or_default(),
                    })
                }
                "STATUS" => {
                    return Self::Status(TetheringStatus {
                        ssid: field(output, "SSID:").unwrap_or_default(),
                        state: field(output, "State:").unwrap_or_else(|| "Unknown".to_string()),
                        clients: field(output, "Clients:").unwrap_or_else(|| "0".to_string()),
                        max_clients: field(output, "MaxClients:").unwrap_or_else(|| "?".to_string()),
                    })
                }
                _ => {}
            }
        }
        Self::Unrecognized(output.trim().to_string())
    }
}

/// What a finished bridge process produced.
#[derive(Debug, Clone)]
pub(crate) struct BridgeCompletion {
    pub outcome: CommandOutcome,
    pub reply: BridgeReply,
}

impl BridgeCompletion {
    fn new(outcome: CommandOutcome) -> Self {
        let reply = BridgeReply::parse(outcome.record.stdout());
        Self { outcome, reply }
    }
}

/// A bridge script running in the background, seen as a pollable handle.
///
/// The process is pending until it exits; a `SUCCESS:` reply completes the
/// operation, `CANCELED` cancels it and anything else fails it. Dropping the
/// handle aborts the task, which kills the child process.
pub(crate) struct BridgeOperation {
    task: JoinHandle<CommandOutcome>,
    completion: Option<BridgeCompletion>,
    join_error: Option<String>,
}

impl BridgeOperation {
    pub fn spawn(runner: &CommandRunner, command: CommandLine, step: &'static str, trace: &TraceSession) -> Self {
        let runner = runner.clone();
        let trace = trace.clone();
        let task = tokio::spawn(async move { runner.run(&command, step, &trace).await });
        Self {
            task,
            completion: None,
            join_error: None,
        }
    }

    /// Output of the finished process, if it finished.
    pub fn completion(&self) -> Option<&BridgeCompletion> {
        self.completion.as_ref()
    }

    /// Reason the background task itself died, if it did.
    pub fn join_error(&self) -> Option<&str> {
        self.join_error.as_deref()
    }

    async fn settle(&mut self) {
        if self.completion.is_some() || self.join_error.is_some() || !self.task.is_finished() {
            return;
        }
        match (&mut self.task).await {
            Ok(outcome) => self.completion = Some(BridgeCompletion::new(outcome)),
            Err(e) => self.join_error = Some(e.to_string()),
        }
    }
}

#[async_trait]
impl AsyncOperation for BridgeOperation {
    type Output = BridgeReply;

    async fn status(&mut self) -> OperationStatus {
        self.settle().await;
        if self.join_error.is_some() {
            return OperationStatus::Failed;
        }
        match &self.completion {
            None => OperationStatus::Pending,
            Some(done) if done.outcome.launch_failed => OperationStatus::Failed,
            Some(done) => match done.reply {
                BridgeReply::Success(_) => OperationStatus::Completed,
                BridgeReply::Canceled => OperationStatus::Canceled,
                _ => OperationStatus::Failed,
            },
        }
    }

    async fn result(&mut self) -> BridgeReply {
        self.completion
            .as_ref()
            .map(|done| done.reply.clone())
            .unwrap_or_else(|| BridgeReply::Unrecognized(String::new()))
    }

    async fn error_code(&mut self) -> i64 {
        match &self.completion {
            Some(done) if done.outcome.record.exit_code() != 0 => done.outcome.record.exit_code(),
            _ => 1,
        }
    }
}

impl Drop for BridgeOperation {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Operational state the tethering manager should reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TargetState {
    On,
    Off,
}

impl TargetState {
    fn as_str(&self) -> &'static str {
        match self {
            Self::On => "On",
            Self::Off => "Off",
        }
    }
}

/// Asks the tethering manager for its operational state.
pub(crate) struct TetheringStateProbe {
    runner: CommandRunner,
    trace: TraceSession,
    target: TargetState,
}

impl TetheringStateProbe {
    pub fn new(runner: &CommandRunner, trace: &TraceSession, target: TargetState) -> Self {
        Self {
            runner: runner.clone(),
            trace: trace.clone(),
            target,
        }
    }
}

#[async_trait]
impl ConvergenceProbe for TetheringStateProbe {
    async fn has_converged(&mut self) -> bool {
        let outcome = self.runner.run(&state_script(), "TETHERING_STATE", &self.trace).await;
        let state = field(outcome.record.stdout(), "State:");
        debug!(?state, target = self.target.as_str(), "Polled tethering state");
        state.is_some_and(|s| s.eq_ignore_ascii_case(self.target.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use hotspot_runner::{MockProcessRunner, MockResponse};

    use super::*;

    #[test]
    fn test_parse_supported_reply() {
        let reply = BridgeReply::parse("SUPPORTED\nState: Off\nMaxClients: 8\nCurrentSSID: DESKTOP-42\n");
        assert_eq!(
            reply,
            BridgeReply::Supported(SupportInfo {
                state: "Off".to_string(),
                max_clients: "8".to_string(),
                current_ssid: "DESKTOP-42".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_markers() {
        assert_eq!(BridgeReply::parse("NO_INTERNET"), BridgeReply::NoInternet);
        assert_eq!(
            BridgeReply::parse("ERROR: WiFiDeviceOff - "),
            BridgeReply::Error("WiFiDeviceOff -".to_string())
        );
        assert_eq!(
            BridgeReply::parse("noise\nSUCCESS: Hotspot iniciado\n"),
            BridgeReply::Success("Hotspot iniciado".to_string())
        );
        assert!(matches!(
            BridgeReply::parse("BRIDGE_UNAVAILABLE: Unable to find type"),
            BridgeReply::Unavailable(_)
        ));
        assert_eq!(
            BridgeReply::parse("random text"),
            BridgeReply::Unrecognized("random text".to_string())
        );
    }

    #[test]
    fn test_parse_status_reply() {
        let reply = BridgeReply::parse("STATUS\nSSID: Office5G\nState: On\nClients: 2\nMaxClients: 8");
        let BridgeReply::Status(status) = reply else {
            panic!("expected status");
        };
        assert_eq!(status.render(), "Estado Mobile Hotspot:\n======================\nSSID: Office5G\nEstado: On\nClientes: 2 / 8");
    }

    #[test]
    fn test_scripts_quote_values() {
        let script = configure_script("Bob's AP", "longenoughpass");
        assert!(script.text.contains("$config.Ssid = 'Bob''s AP'"));
        assert!(script.text.contains("# hotspot-bridge: configure"));
        assert!(script.text.contains("BRIDGE_UNAVAILABLE"));
    }

    fn runner(mock: &MockProcessRunner) -> CommandRunner {
        CommandRunner::new(Arc::new(mock.clone()))
    }

    async fn poll_until_settled(op: &mut BridgeOperation) -> OperationStatus {
        loop {
            let status = op.status().await;
            if status != OperationStatus::Pending {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn test_operation_completes_on_success_marker() {
        let mock = MockProcessRunner::new()
            .respond_to("hotspot-bridge: start", MockResponse::success("SUCCESS: Hotspot iniciado").with_delay(20));
        let trace = TraceSession::with_capture(true);
        let mut op = BridgeOperation::spawn(&runner(&mock), start_script(), "START_HOTSPOT", &trace);

        assert_eq!(op.status().await, OperationStatus::Pending);
        assert_eq!(poll_until_settled(&mut op).await, OperationStatus::Completed);
        assert_eq!(op.result().await, BridgeReply::Success("Hotspot iniciado".to_string()));
        assert_eq!(trace.records()[0].step(), "START_HOTSPOT");
    }

    #[tokio::test]
    async fn test_operation_fails_on_error_marker() {
        let mock = MockProcessRunner::new()
            .respond_to("hotspot-bridge: stop", MockResponse::success("ERROR: OperationInProgress - "));
        let mut op = BridgeOperation::spawn(&runner(&mock), stop_script(), "STOP_HOTSPOT", &TraceSession::new());

        assert_eq!(poll_until_settled(&mut op).await, OperationStatus::Failed);
        assert_eq!(op.error_code().await, 1);
        assert!(matches!(op.completion().map(|c| &c.reply), Some(BridgeReply::Error(_))));
    }

    #[tokio::test]
    async fn test_operation_reports_cancellation() {
        let mock = MockProcessRunner::new().respond_to("hotspot-bridge: start", MockResponse::success("CANCELED"));
        let mut op = BridgeOperation::spawn(&runner(&mock), start_script(), "START_HOTSPOT", &TraceSession::new());

        assert_eq!(poll_until_settled(&mut op).await, OperationStatus::Canceled);
    }

    #[tokio::test]
    async fn test_probe_reads_operational_state() {
        let mock = MockProcessRunner::new()
            .respond_to_sequence(
                "hotspot-bridge: state",
                vec![MockResponse::success("State: InTransition"), MockResponse::success("State: On")],
            );
        let mut probe = TetheringStateProbe::new(&runner(&mock), &TraceSession::new(), TargetState::On);

        assert!(!probe.has_converged().await);
        assert!(probe.has_converged().await);
    }
}
