//! Execution HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/v1/executions                  - List executions (history)
//! - POST   /api/v1/executions                  - Submit a workflow run
//! - GET    /api/v1/executions/{id}             - Execution status
//! - DELETE /api/v1/executions/{id}             - Evict a finished execution
//! - GET    /api/v1/executions/{id}/logs        - Execution log
//! - POST   /api/v1/executions/{id}/pause       - Pause
//! - POST   /api/v1/executions/{id}/resume      - Resume
//! - POST   /api/v1/executions/{id}/stop        - Stop
//! - POST   /api/v1/executions/{id}/acknowledge - Close the pending message box

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use rpaflow_core::RunRequest;
use rpaflow_core::workflow::validate_definition;
use rpaflow_types::execution::{ExecutionSnapshot, LogEntry};
use rpaflow_types::workflow::WorkflowDefinition;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for submitting a run.
#[derive(Debug, Deserialize)]
pub struct RunBody {
    pub workflow: WorkflowDefinition,
    /// Overrides for the workflow's variable defaults.
    #[serde(default)]
    pub variables: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitted {
    pub execution_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Acknowledged {
    pub execution_id: Uuid,
    /// Whether a message box was waiting.
    pub pending: bool,
}

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid execution id: {s}")))
}

fn execution_href(id: Uuid) -> String {
    format!("/api/v1/executions/{id}")
}

/// GET /api/v1/executions
pub async fn list_executions(
    State(state): State<AppState>,
) -> ApiResponse<Vec<ExecutionSnapshot>> {
    let start = Instant::now();
    ApiResponse::timed(state.engine.history(), start).with_link("self", "/api/v1/executions")
}

/// POST /api/v1/executions
pub async fn submit_execution(
    State(state): State<AppState>,
    Json(body): Json<RunBody>,
) -> Result<ApiResponse<Submitted>, AppError> {
    let start = Instant::now();
    validate_definition(&body.workflow)?;

    let ticket = state
        .engine
        .submit(RunRequest::new(body.workflow).with_variables(body.variables));
    tracing::info!(execution_id = %ticket.execution_id, "run submitted via REST");

    let href = execution_href(ticket.execution_id);
    Ok(ApiResponse::timed(
        Submitted {
            execution_id: ticket.execution_id,
        },
        start,
    )
    .with_link("self", &href)
    .with_link("logs", &format!("{href}/logs")))
}

/// GET /api/v1/executions/{id}
pub async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<ExecutionSnapshot>, AppError> {
    let start = Instant::now();
    let id = parse_uuid(&id)?;
    let snapshot = state.engine.status(id)?;
    let href = execution_href(id);
    Ok(ApiResponse::timed(snapshot, start)
        .with_link("self", &href)
        .with_link("logs", &format!("{href}/logs")))
}

/// GET /api/v1/executions/{id}/logs
pub async fn get_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Vec<LogEntry>>, AppError> {
    let start = Instant::now();
    let id = parse_uuid(&id)?;
    let logs = state.engine.logs(id)?;
    Ok(ApiResponse::timed(logs, start).with_link("execution", &execution_href(id)))
}

/// POST /api/v1/executions/{id}/pause
pub async fn pause_execution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<ExecutionSnapshot>, AppError> {
    let start = Instant::now();
    let snapshot = state.engine.pause(parse_uuid(&id)?)?;
    Ok(ApiResponse::timed(snapshot, start))
}

/// POST /api/v1/executions/{id}/resume
pub async fn resume_execution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<ExecutionSnapshot>, AppError> {
    let start = Instant::now();
    let snapshot = state.engine.resume(parse_uuid(&id)?)?;
    Ok(ApiResponse::timed(snapshot, start))
}

/// POST /api/v1/executions/{id}/stop
pub async fn stop_execution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<ExecutionSnapshot>, AppError> {
    let start = Instant::now();
    let snapshot = state.engine.stop(parse_uuid(&id)?)?;
    Ok(ApiResponse::timed(snapshot, start))
}

/// POST /api/v1/executions/{id}/acknowledge
pub async fn acknowledge_message_box(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Acknowledged>, AppError> {
    let start = Instant::now();
    let execution_id = parse_uuid(&id)?;
    let pending = state.engine.acknowledge_message_box(execution_id)?;
    Ok(ApiResponse::timed(
        Acknowledged {
            execution_id,
            pending,
        },
        start,
    ))
}

/// DELETE /api/v1/executions/{id}
pub async fn evict_execution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<ExecutionSnapshot>, AppError> {
    let start = Instant::now();
    let snapshot = state.engine.evict(parse_uuid(&id)?).await?;
    Ok(ApiResponse::timed(snapshot, start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_ids_are_validation_errors() {
        assert!(matches!(parse_uuid("exec_123"), Err(AppError::Validation(_))));
        let id = Uuid::now_v7();
        assert_eq!(parse_uuid(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn run_body_accepts_missing_overrides() {
        let body: RunBody = serde_json::from_str(
            r#"{"workflow": {"name": "Empty", "actions": []}}"#,
        )
        .unwrap();
        assert!(body.variables.is_empty());
        assert_eq!(body.workflow.name, "Empty");
    }
}
