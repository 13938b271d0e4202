//! Message box and log actions.

use rpaflow_types::action::{LogParams, MessageBoxParams};
use rpaflow_types::error::ActionError;
use rpaflow_types::event::ExecutorEvent;
use rpaflow_types::execution::{ExecutionStatus, Severity};
use serde_json::{Value, json};

use super::ActionContext;

/// Ask the channel to show a message box and wait for acknowledgement.
///
/// An expired wait is not a failure: the step succeeds with `timedOut`.
pub(super) async fn message_box(
    ctx: &ActionContext<'_>,
    params: MessageBoxParams,
) -> Result<Value, ActionError> {
    let execution_id = ctx.execution.id();
    let acknowledged = ctx.message_boxes.register(execution_id);

    // Stop transitions before it acknowledges, so a stop that ran before
    // `register` is visible here.
    if ctx.execution.status() == ExecutionStatus::Stopped {
        ctx.message_boxes.discard(execution_id);
        tracing::debug!(execution_id = %execution_id, "message box skipped, execution stopped");
        return Ok(json!({ "acknowledged": true }));
    }

    ctx.execution.publish(ExecutorEvent::MessageBox {
        execution_id,
        title: params.title,
        message: params.message.unwrap_or_default(),
        kind: params.kind,
    });

    let timeout = ctx.settings.message_box_timeout();
    match tokio::time::timeout(timeout, acknowledged).await {
        Ok(_) => Ok(json!({ "acknowledged": true })),
        Err(_) => {
            ctx.message_boxes.discard(execution_id);
            tracing::info!(
                execution_id = %execution_id,
                timeout_secs = timeout.as_secs(),
                "message box timed out"
            );
            Ok(json!({ "acknowledged": true, "timedOut": true }))
        }
    }
}

pub(super) fn log(
    ctx: &ActionContext<'_>,
    severity: Severity,
    params: LogParams,
) -> Result<Value, ActionError> {
    ctx.log(severity, params.message);
    let level = match severity {
        Severity::Warning => "warning",
        Severity::Error => "error",
        Severity::Info | Severity::Success => "info",
    };
    Ok(json!({ "logged": level }))
}
