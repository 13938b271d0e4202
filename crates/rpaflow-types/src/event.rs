//! Event types for the rpaflow executor event bus.
//!
//! `ExecutorEvent` is the unified event type broadcast while workflows run.
//! All variants are Clone + Send + Sync for use with tokio broadcast channels.
//! The serialized form is the channel frame itself:
//! `{"event": "executor:<name>", "data": {...}}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::execution::LogEntry;

/// Type and label of the step being entered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub label: String,
}

/// Events emitted during workflow execution, in strict per-execution order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ExecutorEvent {
    /// The run loop has started.
    #[serde(rename = "executor:started")]
    Started {
        execution_id: Uuid,
        workflow_name: String,
        total_steps: usize,
    },

    /// A step is about to run. `step` is 1-based.
    #[serde(rename = "executor:step")]
    Step {
        execution_id: Uuid,
        step: usize,
        total_steps: usize,
        action: StepAction,
    },

    /// A log entry was appended to the execution log.
    #[serde(rename = "executor:log")]
    Log { execution_id: Uuid, log: LogEntry },

    /// The run loop is parked before `step`.
    #[serde(rename = "executor:paused")]
    Paused { execution_id: Uuid, step: usize },

    /// The run ended on a stop request after `step` steps were entered.
    #[serde(rename = "executor:stopped")]
    Stopped { execution_id: Uuid, step: usize },

    #[serde(rename = "executor:completed")]
    Completed {
        execution_id: Uuid,
        /// Wall time in milliseconds.
        duration: u64,
        steps_executed: usize,
        variables: Map<String, Value>,
    },

    /// A run aborted, or a request could not be served.
    ///
    /// `execution_id` is absent when the error refers to a request rather
    /// than a run (e.g. a control signal for an unknown execution).
    #[serde(rename = "executor:error")]
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        execution_id: Option<Uuid>,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<usize>,
    },

    /// A message box must be shown; the run waits for acknowledgement.
    #[serde(rename = "executor:message-box")]
    MessageBox {
        execution_id: Uuid,
        title: String,
        message: String,
        #[serde(rename = "type")]
        kind: String,
    },
}

impl ExecutorEvent {
    /// The execution this event belongs to, if any.
    pub fn execution_id(&self) -> Option<Uuid> {
        match self {
            ExecutorEvent::Started { execution_id, .. }
            | ExecutorEvent::Step { execution_id, .. }
            | ExecutorEvent::Log { execution_id, .. }
            | ExecutorEvent::Paused { execution_id, .. }
            | ExecutorEvent::Stopped { execution_id, .. }
            | ExecutorEvent::Completed { execution_id, .. }
            | ExecutorEvent::MessageBox { execution_id, .. } => Some(*execution_id),

            ExecutorEvent::Error { execution_id, .. } => *execution_id,
        }
    }

    /// Whether this event ends its execution's event stream.
    pub fn is_terminal(&self) -> bool {
        match self {
            ExecutorEvent::Stopped { .. } | ExecutorEvent::Completed { .. } => true,
            ExecutorEvent::Error { execution_id, .. } => execution_id.is_some(),
            _ => false,
        }
    }

    /// Channel name of this event, e.g. `executor:step`.
    pub fn name(&self) -> &'static str {
        match self {
            ExecutorEvent::Started { .. } => "executor:started",
            ExecutorEvent::Step { .. } => "executor:step",
            ExecutorEvent::Log { .. } => "executor:log",
            ExecutorEvent::Paused { .. } => "executor:paused",
            ExecutorEvent::Stopped { .. } => "executor:stopped",
            ExecutorEvent::Completed { .. } => "executor:completed",
            ExecutorEvent::Error { .. } => "executor:error",
            ExecutorEvent::MessageBox { .. } => "executor:message-box",
        }
    }
}
