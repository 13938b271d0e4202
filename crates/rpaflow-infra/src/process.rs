//! `ProcessRunner` capability backed by `tokio::process`.

use std::process::Stdio;

use futures_util::future::{BoxFuture, FutureExt};
use rpaflow_core::capability::{ProcessOutput, ProcessRunner, Shell};
use rpaflow_types::config::ProcessSettings;
use rpaflow_types::error::ActionError;

/// Runs shell commands and starts applications on the host.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner {
    settings: ProcessSettings,
}

impl TokioProcessRunner {
    pub fn new(settings: ProcessSettings) -> Self {
        Self { settings }
    }

    /// Program and leading arguments for `shell`; the command string goes last.
    fn invocation(&self, shell: Shell) -> (String, Vec<&'static str>) {
        match shell {
            Shell::PowerShell => (
                self.settings.powershell.clone(),
                vec!["-NoProfile", "-Command"],
            ),
            Shell::System if !self.settings.shell.is_empty() => {
                let program = self.settings.shell.clone();
                let flag = if is_cmd_exe(&program) { "/C" } else { "-c" };
                (program, vec![flag])
            }
            Shell::System if cfg!(windows) => ("cmd".to_string(), vec!["/C"]),
            Shell::System => ("sh".to_string(), vec!["-c"]),
        }
    }

    async fn execute(&self, shell: Shell, command: &str) -> Result<ProcessOutput, ActionError> {
        let (program, args) = self.invocation(shell);
        tracing::debug!(program = %program, ?shell, "running command");

        let output = tokio::process::Command::new(&program)
            .args(&args)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ActionError::Process(format!("failed to start {program}: {e}")))?;

        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

fn is_cmd_exe(program: &str) -> bool {
    let name = program
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(program)
        .to_ascii_lowercase();
    name == "cmd" || name == "cmd.exe"
}

impl ProcessRunner for TokioProcessRunner {
    fn run<'a>(
        &'a self,
        shell: Shell,
        command: &'a str,
    ) -> BoxFuture<'a, Result<ProcessOutput, ActionError>> {
        self.execute(shell, command).boxed()
    }

    fn spawn_detached(&self, program: &str, args: &[String]) -> Result<(), ActionError> {
        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ActionError::Process(format!("failed to start {program}: {e}")))?;
        tracing::debug!(program, pid = child.id(), "application started");
        Ok(())
    }
}
