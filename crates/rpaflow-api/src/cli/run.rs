//! `rpaflow run`: execute a workflow file on a local engine.
//!
//! Events for the run are rendered as a progress bar plus styled log lines,
//! or printed as JSON lines with `--json`. Ctrl+C requests a stop; the run
//! then ends at the next step boundary and its browser is closed.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};
use tokio::io::AsyncBufReadExt;
use tokio::sync::broadcast;
use uuid::Uuid;

use rpaflow_core::workflow::load_workflow_file;
use rpaflow_core::{Engine, RunRequest};
use rpaflow_types::event::ExecutorEvent;
use rpaflow_types::execution::{ExecutionSnapshot, ExecutionStatus, LogEntry, Severity};

use crate::state::AppState;

/// Parse `NAME=VALUE` overrides. Values are read as JSON when they parse,
/// otherwise kept as strings.
pub fn parse_vars(vars: &[String]) -> Result<Map<String, Value>> {
    let mut map = Map::new();
    for raw in vars {
        let Some((name, value)) = raw.split_once('=') else {
            bail!("invalid --var '{raw}': expected NAME=VALUE");
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("invalid --var '{raw}': empty variable name");
        }
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        map.insert(name.to_string(), value);
    }
    Ok(map)
}

/// Run the workflow at `file` to completion.
///
/// Fails when the workflow ends in error, so the process exit code reflects it.
pub async fn run_workflow(state: &AppState, file: &Path, vars: &[String], json: bool) -> Result<()> {
    let workflow = load_workflow_file(file)
        .with_context(|| format!("Failed to load workflow {}", file.display()))?;
    let variables = parse_vars(vars)?;
    let total = workflow.actions.len();
    let name = workflow.display_name().to_string();

    let engine = Arc::clone(&state.engine);
    let mut events = engine.subscribe();
    let ticket = engine.submit(RunRequest::new(workflow).with_variables(variables));
    let execution_id = ticket.execution_id;
    tracing::debug!(%execution_id, file = %file.display(), "workflow submitted");

    let progress = if json {
        ProgressBar::hidden()
    } else {
        println!();
        println!(
            "  {} Running '{}' ({} steps)",
            style("▶").cyan().bold(),
            style(&name).cyan(),
            total
        );
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        bar
    };

    let mut final_variables: Option<Map<String, Value>> = None;
    let mut stop_requested = false;

    loop {
        tokio::select! {
            received = events.recv() => {
                let event = match received {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "event receiver lagged");
                        if engine.status(execution_id).is_ok_and(|s| s.status.is_terminal()) {
                            break;
                        }
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if event.execution_id() != Some(execution_id) {
                    continue;
                }

                if json {
                    println!("{}", serde_json::to_string(&event)?);
                } else {
                    render_event(&progress, &event);
                }

                match &event {
                    ExecutorEvent::MessageBox { .. } => spawn_acknowledger(&engine, execution_id, json),
                    ExecutorEvent::Completed { variables, .. } => final_variables = Some(variables.clone()),
                    _ => {}
                }
                if event.is_terminal() {
                    break;
                }
            }

            signal = tokio::signal::ctrl_c(), if !stop_requested => {
                stop_requested = true;
                if let Err(e) = signal {
                    tracing::warn!("failed to listen for Ctrl+C: {e}");
                    continue;
                }
                match engine.stop(execution_id) {
                    Ok(_) => progress.println(format!(
                        "  {} Stop requested, finishing current step...",
                        style("■").yellow()
                    )),
                    Err(e) => tracing::debug!(error = %e, "stop request ignored"),
                }
            }
        }
    }

    progress.finish_and_clear();
    let snapshot = ticket.handle.await.context("run task failed")?;

    if json {
        println!("{}", serde_json::to_string(&snapshot)?);
    } else {
        print_summary(&snapshot, final_variables.as_ref());
    }

    if snapshot.status == ExecutionStatus::Error {
        bail!(
            "workflow '{name}' failed: {}",
            snapshot.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

/// Acknowledge a message box once the user presses Enter. In JSON mode the
/// box is acknowledged immediately.
fn spawn_acknowledger(engine: &Arc<Engine>, execution_id: Uuid, json: bool) {
    let engine = Arc::clone(engine);
    tokio::spawn(async move {
        if !json {
            let mut line = String::new();
            let mut stdin = tokio::io::BufReader::new(tokio::io::stdin());
            if let Err(e) = stdin.read_line(&mut line).await {
                tracing::warn!("failed to read stdin: {e}");
            }
        }
        if let Err(e) = engine.acknowledge_message_box(execution_id) {
            tracing::debug!(error = %e, "message box acknowledgement ignored");
        }
    });
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_event(progress: &ProgressBar, event: &ExecutorEvent) {
    match event {
        ExecutorEvent::Step { step, action, .. } => {
            progress.set_position(step.saturating_sub(1) as u64);
            progress.set_message(format!("{} ({})", action.label, action.action_type));
        }
        ExecutorEvent::Log { log, .. } => {
            if log.severity == Severity::Success {
                if let Some(step) = log.step {
                    progress.set_position(step as u64);
                }
            }
            progress.println(format_log(log));
        }
        ExecutorEvent::Paused { step, .. } => {
            progress.set_message(format!("paused after step {step}"));
        }
        ExecutorEvent::MessageBox {
            title,
            message,
            kind,
            ..
        } => {
            progress.println(format!(
                "\n  {} {} [{}]\n  {}\n  {}",
                style("◆").magenta().bold(),
                style(title).bold(),
                kind,
                message,
                style("Press Enter to continue").dim()
            ));
        }
        _ => {}
    }
}

fn format_log(log: &LogEntry) -> String {
    let marker = match log.severity {
        Severity::Info => style("·").dim(),
        Severity::Success => style("✓").green(),
        Severity::Warning => style("!").yellow(),
        Severity::Error => style("✗").red(),
    };
    let step = log
        .step
        .map(|s| format!("{s:>3} "))
        .unwrap_or_else(|| "    ".to_string());
    format!("  {marker} {}{}", style(step).dim(), log.message)
}

fn status_cell(status: ExecutionStatus) -> Cell {
    let color = match status {
        ExecutionStatus::Completed => Color::Green,
        ExecutionStatus::Running | ExecutionStatus::Paused => Color::Cyan,
        ExecutionStatus::Stopped => Color::Yellow,
        ExecutionStatus::Error => Color::Red,
    };
    Cell::new(status.as_str()).fg(color)
}

fn print_summary(snapshot: &ExecutionSnapshot, variables: Option<&Map<String, Value>>) {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Execution").fg(Color::Cyan),
            Cell::new("Status"),
            Cell::new("Steps"),
            Cell::new("Duration"),
        ]);
    table.add_row(vec![
        Cell::new(snapshot.execution_id),
        status_cell(snapshot.status),
        Cell::new(format!("{}/{}", snapshot.current_step, snapshot.total_steps)),
        Cell::new(format!("{:.1}s", snapshot.duration as f64 / 1000.0)),
    ]);

    println!();
    println!("{table}");

    if let Some(error) = &snapshot.error {
        println!("  {} {}", style("Error:").red().bold(), error);
    }

    if let Some(vars) = variables.filter(|v| !v.is_empty()) {
        let mut vars_table = Table::new();
        vars_table
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![Cell::new("Variable").fg(Color::Cyan), Cell::new("Value")]);
        for (name, value) in vars {
            vars_table.add_row(vec![Cell::new(name), Cell::new(value)]);
        }
        println!("{vars_table}");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vars_parse_as_json_with_string_fallback() {
        let vars = parse_vars(&[
            "n=5".to_string(),
            "name=bob".to_string(),
            "flags=[1,2]".to_string(),
            "empty=".to_string(),
            "url=http://x/?a=b".to_string(),
        ])
        .unwrap();
        assert_eq!(vars["n"], json!(5));
        assert_eq!(vars["name"], json!("bob"));
        assert_eq!(vars["flags"], json!([1, 2]));
        assert_eq!(vars["empty"], json!(""));
        assert_eq!(vars["url"], json!("http://x/?a=b"));
    }

    #[test]
    fn vars_without_name_are_rejected() {
        assert!(parse_vars(&["novalue".to_string()]).is_err());
        assert!(parse_vars(&["=5".to_string()]).is_err());
    }

    #[test]
    fn log_lines_include_step_and_message() {
        let line = format_log(&LogEntry::new(Some(3), Severity::Success, "Completed: click"));
        assert!(line.contains("3"));
        assert!(line.contains("Completed: click"));
        let line = format_log(&LogEntry::new(None, Severity::Info, "Workflow started"));
        assert!(line.contains("Workflow started"));
    }
}
