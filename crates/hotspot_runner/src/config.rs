//! Command line and interpreter configuration types.

use serde::{Deserialize, Serialize};

/// Command interpreter used to evaluate a command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpreter {
    /// The host shell (`cmd /C` on Windows, `sh -c` elsewhere).
    Shell,
    /// PowerShell, receiving the command text through `-Command`.
    PowerShell,
}

impl Interpreter {
    /// Short name used in logs and trace output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Shell => "shell",
            Self::PowerShell => "powershell",
        }
    }
}

impl std::fmt::Display for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A literal command line bound to the interpreter that evaluates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLine {
    pub interpreter: Interpreter,
    pub text: String,
}

impl CommandLine {
    /// A command line evaluated by the host shell.
    pub fn shell(text: impl Into<String>) -> Self {
        Self {
            interpreter: Interpreter::Shell,
            text: text.into(),
        }
    }

    /// A command line (or whole script) evaluated by PowerShell.
    pub fn powershell(text: impl Into<String>) -> Self {
        Self {
            interpreter: Interpreter::PowerShell,
            text: text.into(),
        }
    }

    pub fn new(interpreter: Interpreter, text: impl Into<String>) -> Self {
        Self {
            interpreter,
            text: text.into(),
        }
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Options for the process-backed runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellOptions {
    /// Program used for [`Interpreter::Shell`]
    pub shell_program: String,
    /// Flag that makes the shell evaluate the next argument
    pub shell_flag: String,
    /// Program used for [`Interpreter::PowerShell`]
    pub powershell_program: String,
    /// Hard limit for a single process in seconds (0 = wait indefinitely)
    pub timeout_seconds: u64,
}

impl Default for ShellOptions {
    fn default() -> Self {
        let (shell_program, shell_flag) = if cfg!(windows) {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };
        Self {
            shell_program: shell_program.to_string(),
            shell_flag: shell_flag.to_string(),
            powershell_program: "powershell".to_string(),
            timeout_seconds: 0,
        }
    }
}

impl ShellOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn powershell_program(mut self, program: impl Into<String>) -> Self {
        self.powershell_program = program.into();
        self
    }

    pub fn shell(mut self, program: impl Into<String>, flag: impl Into<String>) -> Self {
        self.shell_program = program.into();
        self.shell_flag = flag.into();
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Program and leading arguments for an interpreter.
    pub fn invocation(&self, interpreter: Interpreter) -> (&str, Vec<&str>) {
        match interpreter {
            Interpreter::Shell => (self.shell_program.as_str(), vec![self.shell_flag.as_str()]),
            Interpreter::PowerShell => (
                self.powershell_program.as_str(),
                vec!["-NoProfile", "-NonInteractive", "-Command"],
            ),
        }
    }
}
