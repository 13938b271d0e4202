//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use rpaflow_core::EngineError;
use rpaflow_core::workflow::DefinitionError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Control or query on the execution table.
    Engine(EngineError),
    /// Workflow document rejected.
    Definition(DefinitionError),
    /// Malformed request.
    Validation(String),
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        AppError::Engine(e)
    }
}

impl From<DefinitionError> for AppError {
    fn from(e: DefinitionError) -> Self {
        AppError::Definition(e)
    }
}

impl AppError {
    /// Status code, machine-readable code, and message for this error.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Engine(e @ EngineError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "EXECUTION_NOT_FOUND", e.to_string())
            }
            AppError::Engine(e @ EngineError::InvalidTransition { .. }) => {
                (StatusCode::CONFLICT, "INVALID_TRANSITION", e.to_string())
            }
            AppError::Engine(e @ EngineError::StillActive(_)) => {
                (StatusCode::CONFLICT, "EXECUTION_ACTIVE", e.to_string())
            }
            AppError::Definition(DefinitionError::Io(e)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", e.to_string())
            }
            AppError::Definition(e) => {
                (StatusCode::BAD_REQUEST, "INVALID_WORKFLOW", e.to_string())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
