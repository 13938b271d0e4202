//! Shell and application handlers.

use rpaflow_types::action::{ActionKind, RunApplicationParams, ShellParams};
use rpaflow_types::error::ActionError;
use serde_json::{Value, json};

use super::{ActionContext, LOG_PREVIEW_CHARS, preview, require};
use crate::capability::Shell;

pub(super) async fn powershell(
    ctx: &ActionContext<'_>,
    params: ShellParams,
) -> Result<Value, ActionError> {
    require(ActionKind::PowershellRun, "command", &params.command)?;
    ctx.info(format!(
        "PowerShell: {}",
        preview(&params.command, LOG_PREVIEW_CHARS)
    ));
    run(ctx, Shell::PowerShell, params).await
}

pub(super) async fn cmd(ctx: &ActionContext<'_>, params: ShellParams) -> Result<Value, ActionError> {
    require(ActionKind::CmdRun, "command", &params.command)?;
    ctx.info(format!(
        "Command: {}",
        preview(&params.command, LOG_PREVIEW_CHARS)
    ));
    run(ctx, Shell::System, params).await
}

async fn run(
    ctx: &ActionContext<'_>,
    shell: Shell,
    params: ShellParams,
) -> Result<Value, ActionError> {
    let output = ctx
        .session
        .capabilities()
        .process
        .run(shell, &params.command)
        .await?;

    let stdout = output.stdout.trim().to_string();
    let stderr = output.stderr.trim().to_string();

    if !output.success() {
        let code = output
            .code
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        return Err(ActionError::Process(format!(
            "command exited with {code}: {stderr}"
        )));
    }

    if let Some(name) = params.save_as.as_deref().filter(|n| !n.is_empty()) {
        ctx.session.set_variable(name, Value::String(stdout.clone()));
    }
    Ok(json!({ "stdout": stdout, "stderr": stderr }))
}

pub(super) fn run_application(
    ctx: &ActionContext<'_>,
    params: RunApplicationParams,
) -> Result<Value, ActionError> {
    require(ActionKind::RunApplication, "path", &params.path)?;
    ctx.info(format!("Starting application: {}", params.path));
    ctx.session
        .capabilities()
        .process
        .spawn_detached(&params.path, &params.args)?;
    Ok(json!({ "started": params.path }))
}
