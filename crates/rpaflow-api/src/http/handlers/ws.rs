//! WebSocket event channel for running and controlling workflows.
//!
//! `/ws` upgrades an HTTP connection to a WebSocket. Once connected, the
//! handler:
//!
//! - **Forwards events:** subscribes to the engine's event bus and pushes
//!   every [`ExecutorEvent`] to the client as a `{"event", "data"}` frame.
//! - **Receives requests:** parses incoming text frames as [`ClientFrame`]
//!   (run, pause, resume, stop, message-box acknowledgement, and the status,
//!   logs, and history queries) and answers queries on the same socket.
//!
//! Disconnecting does **not** stop running executions; a client can
//! reconnect and query them by id.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use uuid::Uuid;

use rpaflow_core::workflow::validate_definition;
use rpaflow_core::{Engine, EngineError, RunRequest};
use rpaflow_types::event::ExecutorEvent;
use rpaflow_types::execution::{ExecutionSnapshot, LogEntry};
use rpaflow_types::workflow::WorkflowDefinition;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// Request sent by a WebSocket client.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data")]
enum ClientFrame {
    #[serde(rename = "executor:run")]
    Run(RunPayload),
    #[serde(rename = "executor:pause")]
    Pause(ExecutionRef),
    #[serde(rename = "executor:resume")]
    Resume(ExecutionRef),
    #[serde(rename = "executor:stop")]
    Stop(ExecutionRef),
    #[serde(rename = "executor:message-box-closed")]
    MessageBoxClosed(ExecutionRef),
    #[serde(rename = "executor:status")]
    Status(ExecutionRef),
    #[serde(rename = "executor:get-logs")]
    GetLogs(ExecutionRef),
    #[serde(rename = "executor:history")]
    History,
}

#[derive(Debug, Deserialize)]
struct RunPayload {
    workflow: WorkflowDefinition,
    #[serde(default)]
    variables: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionRef {
    execution_id: Uuid,
}

/// Query answers sent back to the requesting client only.
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
enum Reply {
    #[serde(rename = "executor:status")]
    Status(ExecutionSnapshot),
    #[serde(rename = "executor:logs")]
    Logs {
        execution_id: Uuid,
        logs: Vec<LogEntry>,
    },
    #[serde(rename = "executor:history")]
    History { executions: Vec<ExecutionSnapshot> },
}

/// Error frame for a request that could not be served.
fn request_error(message: impl Into<String>) -> Value {
    serde_json::to_value(ExecutorEvent::Error {
        execution_id: None,
        message: message.into(),
        step: None,
    })
    .unwrap_or(Value::Null)
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// GET /ws -- Upgrade to the executor event channel.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Multiplex bus events and client frames on one task with `tokio::select!`.
async fn handle_ws_connection(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut event_rx = state.engine.subscribe();

    loop {
        tokio::select! {
            event_result = event_rx.recv() => {
                match event_result {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(json) => {
                            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => tracing::warn!("Failed to serialize ExecutorEvent: {err}"),
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "WebSocket subscriber lagged, skipping {n} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg_result = ws_receiver.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = process_frame(&state.engine, &text).await {
                            if ws_sender.send(Message::Text(reply.to_string().into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!("WebSocket receive error: {err}");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::debug!("WebSocket connection closed");
}

/// Apply one client frame to the engine, returning the reply frame if any.
///
/// Control requests are answered through the event stream; only queries and
/// failed requests produce a direct reply.
async fn process_frame(engine: &Arc<Engine>, text: &str) -> Option<Value> {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::warn!(raw = %text, error = %err, "Ignoring malformed WebSocket frame");
            return Some(request_error(format!("malformed request: {err}")));
        }
    };

    let result: Result<Option<Reply>, String> = match frame {
        ClientFrame::Run(payload) => match validate_definition(&payload.workflow) {
            Ok(()) => {
                let ticket = engine.submit(
                    RunRequest::new(payload.workflow).with_variables(payload.variables),
                );
                tracing::info!(execution_id = %ticket.execution_id, "run submitted via WebSocket");
                Ok(None)
            }
            Err(e) => Err(e.to_string()),
        },
        ClientFrame::Pause(r) => engine.pause(r.execution_id).map(|_| None).map_err(describe),
        ClientFrame::Resume(r) => engine.resume(r.execution_id).map(|_| None).map_err(describe),
        ClientFrame::Stop(r) => engine.stop(r.execution_id).map(|_| None).map_err(describe),
        ClientFrame::MessageBoxClosed(r) => engine
            .acknowledge_message_box(r.execution_id)
            .map(|pending| {
                if !pending {
                    tracing::debug!(execution_id = %r.execution_id, "no message box pending");
                }
                None
            })
            .map_err(describe),
        ClientFrame::Status(r) => engine
            .status(r.execution_id)
            .map(|s| Some(Reply::Status(s)))
            .map_err(describe),
        ClientFrame::GetLogs(r) => engine
            .logs(r.execution_id)
            .map(|logs| {
                Some(Reply::Logs {
                    execution_id: r.execution_id,
                    logs,
                })
            })
            .map_err(describe),
        ClientFrame::History => Ok(Some(Reply::History {
            executions: engine.history(),
        })),
    };

    match result {
        Ok(Some(reply)) => serde_json::to_value(reply).ok(),
        Ok(None) => None,
        Err(message) => Some(request_error(message)),
    }
}

fn describe(err: EngineError) -> String {
    tracing::debug!(error = %err, "WebSocket request rejected");
    err.to_string()
}
