//! Workflow execution engine.
//!
//! [`Engine`] owns the live-execution table, the session registry, the event
//! bus, and the pending message boxes. Each submitted workflow gets its own
//! [`Execution`] record and [`ExecutionSession`] and is driven by one
//! orchestrator task; distinct executions run concurrently.
//!
//! - `execution` -- live execution record with the status watch channel
//! - `session` -- per-run variables and browser, plus the session registry
//! - `lifecycle` -- termination reasons and the browser cleanup policy
//! - `message_box` -- pending message-box acknowledgements
//! - `orchestrator` -- the run loop

pub mod execution;
pub mod lifecycle;
pub mod message_box;
mod orchestrator;
pub mod session;

use std::sync::Arc;

use dashmap::DashMap;
use rpaflow_types::config::ExecutorSettings;
use rpaflow_types::event::ExecutorEvent;
use rpaflow_types::execution::{ExecutionSnapshot, ExecutionStatus, LogEntry};
use rpaflow_types::workflow::WorkflowDefinition;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::action::ActionRegistry;
use crate::capability::Capabilities;
use crate::event::EventBus;

pub use execution::Execution;
pub use lifecycle::TerminationReason;
pub use message_box::MessageBoxRegistry;
pub use session::{ExecutionSession, SessionRegistry};

use orchestrator::Orchestrator;

// ---------------------------------------------------------------------------
// Requests and errors
// ---------------------------------------------------------------------------

/// A workflow submission.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub workflow: WorkflowDefinition,
    /// Initial values merged over the workflow's own variable defaults.
    pub variables: Map<String, Value>,
}

impl RunRequest {
    pub fn new(workflow: WorkflowDefinition) -> Self {
        Self {
            workflow,
            variables: Map::new(),
        }
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }
}

/// Handle to a submitted run.
#[derive(Debug)]
pub struct RunTicket {
    pub execution_id: Uuid,
    /// Resolves to the final snapshot once the run is terminal.
    pub handle: JoinHandle<ExecutionSnapshot>,
}

/// Errors from engine control and query operations.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("execution not found: {0}")]
    NotFound(Uuid),

    #[error("cannot {action} execution {id}: it is {status}")]
    InvalidTransition {
        id: Uuid,
        action: &'static str,
        status: ExecutionStatus,
    },

    #[error("execution {0} is still active")]
    StillActive(Uuid),
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Engine {
    capabilities: Capabilities,
    settings: ExecutorSettings,
    bus: EventBus,
    registry: ActionRegistry,
    sessions: SessionRegistry,
    executions: DashMap<Uuid, Arc<Execution>>,
    message_boxes: MessageBoxRegistry,
}

impl Engine {
    pub fn new(capabilities: Capabilities, settings: ExecutorSettings) -> Self {
        let bus = EventBus::new(settings.event_capacity);
        Self {
            capabilities,
            settings,
            bus,
            registry: ActionRegistry::new(),
            sessions: SessionRegistry::new(),
            executions: DashMap::new(),
            message_boxes: MessageBoxRegistry::new(),
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExecutorEvent> {
        self.bus.subscribe()
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    // -----------------------------------------------------------------------
    // Running
    // -----------------------------------------------------------------------

    /// Register the execution and start its run loop on a new task.
    ///
    /// The execution is queryable and controllable as soon as this returns.
    pub fn submit(self: &Arc<Self>, request: RunRequest) -> RunTicket {
        let (execution, session) = self.prepare(&request);
        let execution_id = execution.id();
        let engine = Arc::clone(self);
        let handle = tokio::spawn(async move {
            engine
                .drive(&execution, &session, &request.workflow)
                .await
        });
        RunTicket {
            execution_id,
            handle,
        }
    }

    /// Run a workflow on the current task and return its final snapshot.
    pub async fn run(&self, request: RunRequest) -> ExecutionSnapshot {
        let (execution, session) = self.prepare(&request);
        self.drive(&execution, &session, &request.workflow).await
    }

    fn prepare(&self, request: &RunRequest) -> (Arc<Execution>, Arc<ExecutionSession>) {
        let session = self.sessions.open_session(self.capabilities.clone());
        for variable in &request.workflow.variables {
            session.set_variable(&variable.name, variable.initial_value());
        }
        for (name, value) in &request.variables {
            session.set_variable(name, value.clone());
        }

        let execution = Arc::new(Execution::new(
            Uuid::now_v7(),
            session.id(),
            &request.workflow,
            self.bus.clone(),
        ));
        self.executions
            .insert(execution.id(), Arc::clone(&execution));
        tracing::debug!(
            execution_id = %execution.id(),
            session_id = %session.id(),
            "execution registered"
        );
        (execution, session)
    }

    async fn drive(
        &self,
        execution: &Execution,
        session: &ExecutionSession,
        workflow: &WorkflowDefinition,
    ) -> ExecutionSnapshot {
        let orchestrator = Orchestrator {
            execution,
            session,
            registry: &self.registry,
            message_boxes: &self.message_boxes,
            settings: &self.settings,
        };
        orchestrator.run(workflow).await;
        self.message_boxes.discard(execution.id());
        execution.snapshot()
    }

    // -----------------------------------------------------------------------
    // Control
    // -----------------------------------------------------------------------

    /// Request a pause; honoured before the next step starts.
    pub fn pause(&self, execution_id: Uuid) -> Result<ExecutionSnapshot, EngineError> {
        self.control(execution_id, ExecutionStatus::Paused, "pause")
    }

    pub fn resume(&self, execution_id: Uuid) -> Result<ExecutionSnapshot, EngineError> {
        self.control(execution_id, ExecutionStatus::Running, "resume")
    }

    /// Request a stop; honoured at the next step boundary.
    ///
    /// A message box the run is waiting on is acknowledged so the boundary
    /// is reached.
    pub fn stop(&self, execution_id: Uuid) -> Result<ExecutionSnapshot, EngineError> {
        let snapshot = self.control(execution_id, ExecutionStatus::Stopped, "stop")?;
        self.message_boxes.acknowledge(execution_id);
        Ok(snapshot)
    }

    fn control(
        &self,
        execution_id: Uuid,
        next: ExecutionStatus,
        action: &'static str,
    ) -> Result<ExecutionSnapshot, EngineError> {
        let execution = self.execution(execution_id)?;
        if !execution.transition(next) {
            return Err(EngineError::InvalidTransition {
                id: execution_id,
                action,
                status: execution.status(),
            });
        }
        tracing::info!(execution_id = %execution_id, action, "control signal accepted");
        Ok(execution.snapshot())
    }

    /// Acknowledge the message box `execution_id` is waiting on.
    ///
    /// Returns whether a box was pending.
    pub fn acknowledge_message_box(&self, execution_id: Uuid) -> Result<bool, EngineError> {
        self.execution(execution_id)?;
        Ok(self.message_boxes.acknowledge(execution_id))
    }

    /// Ask every live execution to stop. Returns how many accepted.
    pub fn stop_all(&self) -> usize {
        let live: Vec<Uuid> = self
            .executions
            .iter()
            .filter(|e| !e.value().status().is_terminal())
            .map(|e| *e.key())
            .collect();
        live.into_iter()
            .filter(|id| self.stop(*id).is_ok())
            .count()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn status(&self, execution_id: Uuid) -> Result<ExecutionSnapshot, EngineError> {
        Ok(self.execution(execution_id)?.snapshot())
    }

    pub fn logs(&self, execution_id: Uuid) -> Result<Vec<LogEntry>, EngineError> {
        Ok(self.execution(execution_id)?.logs())
    }

    /// Every execution in the live table, oldest first.
    pub fn history(&self) -> Vec<ExecutionSnapshot> {
        let mut snapshots: Vec<ExecutionSnapshot> =
            self.executions.iter().map(|e| e.value().snapshot()).collect();
        snapshots.sort_by(|a, b| {
            a.started_at
                .cmp(&b.started_at)
                .then(a.execution_id.cmp(&b.execution_id))
        });
        snapshots
    }

    /// The session backing an execution.
    pub fn session(&self, execution_id: Uuid) -> Result<Arc<ExecutionSession>, EngineError> {
        let execution = self.execution(execution_id)?;
        self.sessions
            .get(execution.session_id())
            .map_err(|_| EngineError::NotFound(execution_id))
    }

    /// Remove a finished execution and release its session.
    ///
    /// A browser kept open after completion is closed here.
    pub async fn evict(&self, execution_id: Uuid) -> Result<ExecutionSnapshot, EngineError> {
        let execution = self.execution(execution_id)?;
        if !execution.status().is_terminal() {
            return Err(EngineError::StillActive(execution_id));
        }
        self.executions.remove(&execution_id);

        if let Some(session) = self.sessions.remove(execution.session_id()) {
            match session.close_browser().await {
                Ok(true) => {
                    tracing::debug!(execution_id = %execution_id, "closed kept browser on evict")
                }
                Ok(false) => {}
                Err(e) => tracing::warn!(
                    execution_id = %execution_id,
                    error = %e,
                    "failed to close browser on evict"
                ),
            }
        }
        tracing::info!(execution_id = %execution_id, "execution evicted");
        Ok(execution.snapshot())
    }

    fn execution(&self, execution_id: Uuid) -> Result<Arc<Execution>, EngineError> {
        self.executions
            .get(&execution_id)
            .map(|e| Arc::clone(e.value()))
            .ok_or(EngineError::NotFound(execution_id))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("executions", &self.executions.len())
            .field("sessions", &self.sessions.len())
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
