//! The run loop.
//!
//! Steps run strictly in index order on a single task. Control signals only
//! flip the execution status; the loop observes them at step boundaries:
//!
//! 1. `paused` -> emit `paused`, park on the status watch until it changes.
//! 2. `stopped` -> forced cleanup, emit `stopped`, return.
//! 3. otherwise enter the step, emit `step`, run the handler, log the outcome.
//!
//! A failing step without `continueOnError` ends the run in `error` with
//! forced cleanup. After the last step the same boundary check runs once more,
//! then the run completes and the browser is left open.

use rpaflow_types::action::ActionKind;
use rpaflow_types::config::ExecutorSettings;
use rpaflow_types::event::{ExecutorEvent, StepAction};
use rpaflow_types::execution::{ExecutionStatus, Severity};
use rpaflow_types::workflow::{ActionStep, WorkflowDefinition};
use serde_json::json;

use super::execution::Execution;
use super::lifecycle::{self, TerminationReason};
use super::message_box::MessageBoxRegistry;
use super::session::ExecutionSession;
use crate::action::{ActionContext, ActionRegistry};

/// What a step boundary decided.
enum Boundary {
    Continue,
    Stopped,
}

pub(crate) struct Orchestrator<'a> {
    pub execution: &'a Execution,
    pub session: &'a ExecutionSession,
    pub registry: &'a ActionRegistry,
    pub message_boxes: &'a MessageBoxRegistry,
    pub settings: &'a ExecutorSettings,
}

impl Orchestrator<'_> {
    /// Drive the workflow to a terminal status and return it.
    pub async fn run(&self, workflow: &WorkflowDefinition) -> ExecutionStatus {
        let execution_id = self.execution.id();
        let total_steps = workflow.actions.len();

        tracing::info!(
            execution_id = %execution_id,
            workflow = self.execution.workflow_name(),
            total_steps,
            "starting workflow execution"
        );
        self.execution.publish(ExecutorEvent::Started {
            execution_id,
            workflow_name: self.execution.workflow_name().to_string(),
            total_steps,
        });
        self.execution.log(
            None,
            Severity::Info,
            format!("Starting workflow: {}", self.execution.workflow_name()),
        );

        for (index, step) in workflow.actions.iter().enumerate() {
            if let Boundary::Stopped = self.boundary().await {
                return self.finish_stopped().await;
            }
            let number = index + 1;
            if let Err(message) = self.run_step(number, total_steps, step).await {
                return self.finish_error(number, message).await;
            }
        }

        if let Boundary::Stopped = self.boundary().await {
            return self.finish_stopped().await;
        }
        self.finish_completed().await
    }

    /// Honour a pending pause or stop before entering the next step.
    async fn boundary(&self) -> Boundary {
        if self.execution.status() == ExecutionStatus::Paused {
            let step = self.execution.current_step();
            tracing::info!(execution_id = %self.execution.id(), step, "execution paused");
            self.execution.publish(ExecutorEvent::Paused {
                execution_id: self.execution.id(),
                step,
            });
            self.execution.log(None, Severity::Info, "Execution paused");

            let mut status = self.execution.watch_status();
            // The sender lives in the execution we borrow, so the channel cannot close here.
            let _ = status
                .wait_for(|s| *s != ExecutionStatus::Paused)
                .await;

            if self.execution.status() == ExecutionStatus::Running {
                tracing::info!(execution_id = %self.execution.id(), step, "execution resumed");
                self.execution.log(None, Severity::Info, "Execution resumed");
            }
        }

        if self.execution.status() == ExecutionStatus::Stopped {
            Boundary::Stopped
        } else {
            Boundary::Continue
        }
    }

    /// Run one step. `Err` carries the message of a run-aborting failure.
    async fn run_step(
        &self,
        number: usize,
        total_steps: usize,
        step: &ActionStep,
    ) -> Result<(), String> {
        let label = step.display_label();
        self.execution.enter_step(number);
        self.execution.publish(ExecutorEvent::Step {
            execution_id: self.execution.id(),
            step: number,
            total_steps,
            action: StepAction {
                action_type: step.action_type.clone(),
                label: label.to_string(),
            },
        });
        self.execution
            .log(Some(number), Severity::Info, format!("Executing: {label}"));

        let Some(kind) = self.registry.resolve(&step.action_type) else {
            self.skip_unknown(number, step);
            return Ok(());
        };

        let ctx = ActionContext {
            execution: self.execution,
            session: self.session,
            message_boxes: self.message_boxes,
            settings: self.settings,
            step: number,
        };
        match self.registry.execute(kind, &step.parameters, &ctx).await {
            Ok(result) => {
                tracing::debug!(
                    execution_id = %self.execution.id(),
                    step = number,
                    action = kind.as_str(),
                    "step completed"
                );
                self.execution.log_result(
                    Some(number),
                    Severity::Success,
                    format!("Completed: {label}"),
                    result,
                );
                Ok(())
            }
            Err(e) => self.step_failed(number, kind, step, e.to_string()),
        }
    }

    fn skip_unknown(&self, number: usize, step: &ActionStep) {
        tracing::warn!(
            execution_id = %self.execution.id(),
            step = number,
            action = step.action_type.as_str(),
            "unknown action type, skipping"
        );
        self.execution.log(
            Some(number),
            Severity::Warning,
            format!("Unknown action type: {}", step.action_type),
        );
        self.execution.log_result(
            Some(number),
            Severity::Success,
            format!("Completed: {}", step.display_label()),
            json!({ "skipped": true }),
        );
    }

    fn step_failed(
        &self,
        number: usize,
        kind: ActionKind,
        step: &ActionStep,
        message: String,
    ) -> Result<(), String> {
        let label = step.display_label();
        let continue_on_error = step.continue_on_error();
        tracing::warn!(
            execution_id = %self.execution.id(),
            step = number,
            action = kind.as_str(),
            continue_on_error,
            error = %message,
            "step failed"
        );
        self.execution.log(
            Some(number),
            Severity::Error,
            format!("Error in {label}: {message}"),
        );
        if continue_on_error {
            self.execution.log(
                Some(number),
                Severity::Warning,
                "Continuing despite the error (continueOnError)",
            );
            Ok(())
        } else {
            Err(message)
        }
    }

    // -----------------------------------------------------------------------
    // Terminal paths
    // -----------------------------------------------------------------------

    async fn finish_completed(&self) -> ExecutionStatus {
        // Only a stop signal can make the status terminal behind the loop's back.
        if !self.execution.conclude(ExecutionStatus::Completed, None) {
            return self.finish_stopped().await;
        }
        let reason = TerminationReason::WorkflowCompleted;
        lifecycle::cleanup(self.execution, self.session, reason, reason.close_browsers()).await;

        let duration = self.execution.duration_ms();
        let steps_executed = self.execution.current_step();
        tracing::info!(
            execution_id = %self.execution.id(),
            duration_ms = duration,
            steps_executed,
            "workflow completed"
        );
        self.execution.log(
            None,
            Severity::Success,
            format!("Workflow completed in {duration}ms"),
        );
        self.execution.publish(ExecutorEvent::Completed {
            execution_id: self.execution.id(),
            duration,
            steps_executed,
            variables: self.session.variables(),
        });
        ExecutionStatus::Completed
    }

    async fn finish_stopped(&self) -> ExecutionStatus {
        let step = self.execution.current_step();
        self.execution.stamp_end();
        let reason = TerminationReason::UserStopped;
        lifecycle::cleanup(self.execution, self.session, reason, reason.close_browsers()).await;

        tracing::info!(execution_id = %self.execution.id(), step, "workflow stopped");
        self.execution
            .log(None, Severity::Warning, "Execution stopped by user");
        self.execution.publish(ExecutorEvent::Stopped {
            execution_id: self.execution.id(),
            step,
        });
        ExecutionStatus::Stopped
    }

    async fn finish_error(&self, step: usize, message: String) -> ExecutionStatus {
        if !self
            .execution
            .conclude(ExecutionStatus::Error, Some(message.clone()))
        {
            return self.finish_stopped().await;
        }
        let reason = TerminationReason::Error;
        lifecycle::cleanup(self.execution, self.session, reason, reason.close_browsers()).await;

        tracing::error!(
            execution_id = %self.execution.id(),
            step,
            error = %message,
            "workflow failed"
        );
        self.execution.publish(ExecutorEvent::Error {
            execution_id: Some(self.execution.id()),
            message,
            step: Some(step),
        });
        ExecutionStatus::Error
    }
}
