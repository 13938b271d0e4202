//! Action registry and handlers.
//!
//! `ActionRegistry` resolves a step's type key to an [`ActionKind`], decodes
//! the step's parameters into the typed [`Action`] payload, and dispatches to
//! the handler for that action. Handlers receive an [`ActionContext`] giving
//! them the session, the execution log, and the message-box registry, and
//! return a JSON result or fail with an [`ActionError`].
//!
//! Handler groups:
//! - `browser` -- open/navigate/click/type/extract/screenshot/scroll/waits/close
//! - `http` -- GET/POST/PUT/DELETE
//! - `process` -- PowerShell, system shell, detached applications
//! - `file` -- read/write/copy/move/delete/exists
//! - `variable` -- set/get
//! - `timing` -- wait
//! - `message` -- message box and log actions
//! - `flow` -- `if_condition` / `for_loop` markers

mod browser;
mod file;
mod flow;
mod http;
mod message;
mod process;
mod timing;
mod variable;

use rpaflow_types::action::{Action, ActionKind};
use rpaflow_types::config::ExecutorSettings;
use rpaflow_types::error::ActionError;
use rpaflow_types::execution::Severity;
use serde_json::{Map, Value};

use crate::engine::execution::Execution;
use crate::engine::message_box::MessageBoxRegistry;
use crate::engine::session::ExecutionSession;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Visibility wait before typing into a field.
pub const INPUT_VISIBILITY_TIMEOUT_MS: u64 = 10_000;

/// Characters of typed text echoed in the step result.
pub const TYPED_PREVIEW_CHARS: usize = 50;

/// Characters of file content echoed in the step result.
pub const FILE_PREVIEW_CHARS: usize = 500;

/// Characters of a command or value echoed in log messages.
pub const LOG_PREVIEW_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// ActionContext
// ---------------------------------------------------------------------------

/// Everything a handler may touch while running one step.
pub struct ActionContext<'a> {
    pub execution: &'a Execution,
    pub session: &'a ExecutionSession,
    pub message_boxes: &'a MessageBoxRegistry,
    pub settings: &'a ExecutorSettings,
    /// 1-based index of the running step.
    pub step: usize,
}

impl ActionContext<'_> {
    /// Append a step-scoped entry to the execution log.
    pub fn log(&self, severity: Severity, message: impl Into<String>) {
        self.execution.log(Some(self.step), severity, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Severity::Info, message);
    }
}

// ---------------------------------------------------------------------------
// ActionRegistry
// ---------------------------------------------------------------------------

/// Resolves type keys and runs actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionRegistry;

impl ActionRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a type key or alias. `None` means the type is unknown.
    pub fn resolve(&self, action_type: &str) -> Option<ActionKind> {
        ActionKind::resolve(action_type)
    }

    /// Decode `parameters` for `kind` and run the handler.
    pub async fn execute(
        &self,
        kind: ActionKind,
        parameters: &Map<String, Value>,
        ctx: &ActionContext<'_>,
    ) -> Result<Value, ActionError> {
        let action = Action::decode(kind, parameters)?;
        tracing::debug!(
            execution_id = %ctx.execution.id(),
            step = ctx.step,
            action = kind.as_str(),
            category = ?kind.category(),
            "dispatching action"
        );
        dispatch(action, ctx).await
    }
}

async fn dispatch(action: Action, ctx: &ActionContext<'_>) -> Result<Value, ActionError> {
    match action {
        Action::OpenBrowser(p) => browser::open_browser(ctx, p).await,
        Action::Navigate(p) => browser::navigate(ctx, p).await,
        Action::Click(p) => browser::click(ctx, p).await,
        Action::Type(p) => browser::type_text(ctx, p).await,
        Action::Extract(p) => browser::extract(ctx, p).await,
        Action::Screenshot(p) => browser::screenshot(ctx, p).await,
        Action::Scroll(p) => browser::scroll(ctx, p).await,
        Action::CloseBrowser => browser::close_browser(ctx).await,
        Action::WaitElement(p) => browser::wait_element(ctx, p).await,
        Action::WaitPageLoad(p) => browser::wait_page_load(ctx, p).await,
        Action::Http { method, params } => http::request(ctx, method, params).await,
        Action::PowerShell(p) => process::powershell(ctx, p).await,
        Action::Cmd(p) => process::cmd(ctx, p).await,
        Action::RunApplication(p) => process::run_application(ctx, p),
        Action::FileRead(p) => file::read(ctx, p).await,
        Action::FileWrite(p) => file::write(ctx, p).await,
        Action::FileCopy(p) => file::copy(ctx, p).await,
        Action::FileMove(p) => file::rename(ctx, p).await,
        Action::FileDelete(p) => file::delete(ctx, p).await,
        Action::FileExists(p) => file::exists(ctx, p).await,
        Action::SetVariable(p) => variable::set(ctx, p),
        Action::GetVariable(p) => variable::get(ctx, p),
        Action::Wait(p) => timing::wait(ctx, p).await,
        Action::MessageBox(p) => message::message_box(ctx, p).await,
        Action::Log { severity, params } => message::log(ctx, severity, params),
        Action::IfCondition(p) => flow::if_condition(p),
        Action::ForLoop(p) => flow::for_loop(p),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reject an empty required string parameter.
fn require(action: ActionKind, field: &str, value: &str) -> Result<(), ActionError> {
    if value.trim().is_empty() {
        Err(ActionError::invalid(
            action.as_str(),
            format!("`{field}` must not be empty"),
        ))
    } else {
        Ok(())
    }
}

/// First `max` characters of `text`, with `...` appended when cut.
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_keeps_short_text() {
        assert_eq!(preview("hello", 50), "hello");
        let exact = "a".repeat(50);
        assert_eq!(preview(&exact, 50), exact);
    }

    #[test]
    fn preview_cuts_long_text_on_char_boundaries() {
        let long = "é".repeat(60);
        let cut = preview(&long, 50);
        assert_eq!(cut.chars().count(), 53);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn require_rejects_blank_values() {
        assert!(require(ActionKind::Click, "selector", "#ok").is_ok());
        let err = require(ActionKind::Click, "selector", "  ").unwrap_err();
        assert!(err.to_string().contains("selector"));
    }

    #[test]
    fn registry_resolves_aliases() {
        let registry = ActionRegistry::new();
        assert_eq!(registry.resolve("browser_open"), Some(ActionKind::OpenBrowser));
        assert_eq!(registry.resolve("nope"), None);
    }
}
