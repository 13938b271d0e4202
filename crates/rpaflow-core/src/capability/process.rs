//! Process execution port.

use futures_util::future::BoxFuture;
use rpaflow_types::error::ActionError;

/// Interpreter a command string is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shell {
    /// `powershell -Command <script>`.
    PowerShell,
    /// The platform command shell (`cmd /C` on Windows, `sh -c` elsewhere).
    System,
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

pub trait ProcessRunner: Send + Sync {
    /// Run `command` through `shell` and wait for it, capturing output.
    ///
    /// A non-zero exit is reported in [`ProcessOutput::code`], not as an error.
    fn run<'a>(
        &'a self,
        shell: Shell,
        command: &'a str,
    ) -> BoxFuture<'a, Result<ProcessOutput, ActionError>>;

    /// Start `program` detached from the engine with its stdio discarded.
    fn spawn_detached(&self, program: &str, args: &[String]) -> Result<(), ActionError>;
}
