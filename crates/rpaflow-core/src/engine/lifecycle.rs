//! Resource lifecycle policy.
//!
//! Whether a run's browser is closed depends on why the run ended: a
//! completed run keeps it open for inspection, every abnormal end closes it.

use std::fmt;

use rpaflow_types::execution::Severity;
use serde::{Deserialize, Serialize};

use super::execution::Execution;
use super::session::ExecutionSession;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    WorkflowCompleted,
    UserStopped,
    Stopped,
    Error,
}

impl TerminationReason {
    pub fn close_browsers(&self) -> bool {
        !matches!(self, TerminationReason::WorkflowCompleted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::WorkflowCompleted => "workflow_completed",
            TerminationReason::UserStopped => "user_stopped",
            TerminationReason::Stopped => "stopped",
            TerminationReason::Error => "error",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a cleanup pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub reason: TerminationReason,
    pub browser_closed: bool,
}

/// Apply the cleanup policy for `reason` to the run's session.
///
/// `close_browsers` is passed explicitly by the caller; the usual value is
/// [`TerminationReason::close_browsers`]. A browser that fails to close is
/// still released and the failure is logged, never propagated.
pub async fn cleanup(
    execution: &Execution,
    session: &ExecutionSession,
    reason: TerminationReason,
    close_browsers: bool,
) -> CleanupOutcome {
    execution.log(
        None,
        Severity::Info,
        format!("Cleaning up resources (reason: {reason}, close browsers: {close_browsers})"),
    );

    let mut browser_closed = false;
    if close_browsers {
        match session.close_browser().await {
            Ok(true) => {
                browser_closed = true;
                execution.log(None, Severity::Info, "Browser closed");
            }
            Ok(false) => {}
            Err(e) => {
                browser_closed = true;
                tracing::warn!(
                    execution_id = %execution.id(),
                    session_id = %session.id(),
                    error = %e,
                    "error closing browser during cleanup"
                );
                execution.log(None, Severity::Warning, format!("Error closing browser: {e}"));
            }
        }
    }

    tracing::debug!(
        execution_id = %execution.id(),
        reason = reason.as_str(),
        browser_closed,
        "cleanup finished"
    );

    CleanupOutcome {
        reason,
        browser_closed,
    }
}
