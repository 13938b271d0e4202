//! Live execution record.
//!
//! An [`Execution`] is mutated by its own run loop, except for the status
//! field which control signals also drive. Status lives in a
//! `tokio::sync::watch` channel so the run loop can park on it while paused.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use rpaflow_types::event::ExecutorEvent;
use rpaflow_types::execution::{ExecutionSnapshot, ExecutionStatus, LogEntry, Severity};
use rpaflow_types::workflow::WorkflowDefinition;
use serde_json::Value;
use tokio::sync::watch;
use uuid::Uuid;

use crate::event::EventBus;

pub struct Execution {
    id: Uuid,
    session_id: Uuid,
    workflow_id: String,
    workflow_name: String,
    total_steps: usize,
    status: watch::Sender<ExecutionStatus>,
    current_step: AtomicUsize,
    log: Mutex<Vec<LogEntry>>,
    started_at: DateTime<Utc>,
    ended_at: Mutex<Option<DateTime<Utc>>>,
    error: Mutex<Option<String>>,
    bus: EventBus,
}

impl Execution {
    pub fn new(id: Uuid, session_id: Uuid, workflow: &WorkflowDefinition, bus: EventBus) -> Self {
        let (status, _) = watch::channel(ExecutionStatus::Running);
        Self {
            id,
            session_id,
            workflow_id: workflow.id.clone(),
            workflow_name: workflow.display_name().to_string(),
            total_steps: workflow.actions.len(),
            status,
            current_step: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
            started_at: Utc::now(),
            ended_at: Mutex::new(None),
            error: Mutex::new(None),
            bus,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn workflow_name(&self) -> &str {
        &self.workflow_name
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn current_step(&self) -> usize {
        self.current_step.load(Ordering::Acquire)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    pub fn status(&self) -> ExecutionStatus {
        *self.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<ExecutionStatus> {
        self.status.subscribe()
    }

    /// Apply `next` if the transition table allows it. Returns whether it did.
    pub fn transition(&self, next: ExecutionStatus) -> bool {
        self.status.send_if_modified(|current| {
            if current.can_transition_to(next) {
                *current = next;
                true
            } else {
                false
            }
        })
    }

    /// Record the run loop's own terminal outcome.
    ///
    /// A pending pause does not block the loop from concluding, so `Paused`
    /// may move straight to `Completed` or `Error` here. Already-terminal
    /// executions are left untouched.
    pub(crate) fn conclude(&self, outcome: ExecutionStatus, error: Option<String>) -> bool {
        let applied = self.status.send_if_modified(|current| {
            if current.is_terminal() {
                false
            } else {
                *current = outcome;
                true
            }
        });
        if applied {
            self.stamp_end();
            if error.is_some() {
                *lock(&self.error) = error;
            }
        }
        applied
    }

    /// Record the end time once. Later calls keep the first stamp.
    pub(crate) fn stamp_end(&self) {
        lock(&self.ended_at).get_or_insert_with(Utc::now);
    }

    /// Mark step `number` (1-based) as entered. The counter never decreases.
    pub(crate) fn enter_step(&self, number: usize) {
        self.current_step.fetch_max(number, Ordering::AcqRel);
    }

    // -----------------------------------------------------------------------
    // Log and events
    // -----------------------------------------------------------------------

    /// Append to the log and publish the entry.
    pub fn append_log(&self, entry: LogEntry) {
        lock(&self.log).push(entry.clone());
        self.bus.publish(ExecutorEvent::Log {
            execution_id: self.id,
            log: entry,
        });
    }

    pub fn log(&self, step: Option<usize>, severity: Severity, message: impl Into<String>) {
        self.append_log(LogEntry::new(step, severity, message));
    }

    pub fn log_result(
        &self,
        step: Option<usize>,
        severity: Severity,
        message: impl Into<String>,
        result: Value,
    ) {
        self.append_log(LogEntry::new(step, severity, message).with_result(result));
    }

    pub fn publish(&self, event: ExecutorEvent) {
        self.bus.publish(event);
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        lock(&self.log).clone()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Milliseconds from start to end, or to now while still live.
    pub fn duration_ms(&self) -> u64 {
        let end = lock(&self.ended_at).unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds().max(0) as u64
    }

    pub fn snapshot(&self) -> ExecutionSnapshot {
        ExecutionSnapshot {
            execution_id: self.id,
            workflow_id: self.workflow_id.clone(),
            workflow_name: self.workflow_name.clone(),
            status: self.status(),
            current_step: self.current_step(),
            total_steps: self.total_steps,
            started_at: self.started_at,
            ended_at: *lock(&self.ended_at),
            duration: self.duration_ms(),
            error: lock(&self.error).clone(),
        }
    }
}

impl std::fmt::Debug for Execution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Execution")
            .field("id", &self.id)
            .field("workflow_name", &self.workflow_name)
            .field("status", &self.status())
            .field("current_step", &self.current_step())
            .field("total_steps", &self.total_steps)
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
