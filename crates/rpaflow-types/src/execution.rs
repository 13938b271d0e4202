//! Execution state, log entries, and status snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Status of a workflow execution.
///
/// Allowed transitions: `running -> {paused, stopped, completed, error}`,
/// `paused -> {running, stopped}`. The remaining states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Paused,
    Stopped,
    Completed,
    Error,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Stopped | ExecutionStatus::Completed | ExecutionStatus::Error
        )
    }

    pub fn can_transition_to(&self, next: ExecutionStatus) -> bool {
        use ExecutionStatus::*;
        matches!(
            (self, next),
            (Running, Paused | Stopped | Completed | Error) | (Paused, Running | Stopped)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Running => "running",
            ExecutionStatus::Paused => "paused",
            ExecutionStatus::Stopped => "stopped",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// One entry of an execution's append-only log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    /// 1-based step index, absent for run-level entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
    #[serde(rename = "type")]
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl LogEntry {
    pub fn new(step: Option<usize>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            step,
            severity,
            message: message.into(),
            result: None,
        }
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }
}

/// Point-in-time view of an execution, returned by status and history queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSnapshot {
    pub execution_id: Uuid,
    pub workflow_id: String,
    pub workflow_name: String,
    pub status: ExecutionStatus,
    /// Number of steps entered so far (1-based index of the latest step).
    pub current_step: usize,
    pub total_steps: usize,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Elapsed milliseconds, up to now for live runs.
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transitions() {
        use ExecutionStatus::*;
        assert!(Running.can_transition_to(Paused));
        assert!(Running.can_transition_to(Completed));
        assert!(Paused.can_transition_to(Running));
        assert!(Paused.can_transition_to(Stopped));
        assert!(!Paused.can_transition_to(Completed));
        assert!(!Running.can_transition_to(Running));
        for terminal in [Stopped, Completed, Error] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(Running));
            assert!(!terminal.can_transition_to(Paused));
        }
        assert!(!Running.is_terminal());
        assert!(!Paused.is_terminal());
    }

    #[test]
    fn test_log_entry_serializes_severity_as_type() {
        let entry = LogEntry::new(Some(2), Severity::Success, "Completed: click")
            .with_result(json!({"clicked": "#ok"}));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "success");
        assert_eq!(value["step"], 2);
        assert_eq!(value["result"]["clicked"], "#ok");
    }

    #[test]
    fn test_run_level_entry_omits_step() {
        let entry = LogEntry::new(None, Severity::Info, "Workflow started");
        let value = serde_json::to_value(&entry).unwrap();
        assert!(value.get("step").is_none());
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::Completed).unwrap(),
            "\"completed\""
        );
        let s: ExecutionStatus = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(s, ExecutionStatus::Paused);
    }
}
