//! `rpaflow validate`: load a workflow file and check every step's parameters.

use std::path::Path;

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde::Serialize;

use rpaflow_core::workflow::load_workflow_file;
use rpaflow_types::action::{Action, ActionKind};
use rpaflow_types::workflow::{ActionStep, WorkflowDefinition};

/// Outcome of checking one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepCheck {
    Ok { category: String },
    /// Unknown type; the engine skips it with a warning.
    Unknown,
    Invalid { message: String },
}

#[derive(Debug, Serialize)]
struct StepReport<'a> {
    step: usize,
    #[serde(rename = "type")]
    action_type: &'a str,
    label: &'a str,
    #[serde(flatten)]
    check: StepCheck,
}

pub fn check_step(step: &ActionStep) -> StepCheck {
    let Some(kind) = ActionKind::resolve(&step.action_type) else {
        return StepCheck::Unknown;
    };
    match Action::decode(kind, &step.parameters) {
        Ok(_) => StepCheck::Ok {
            category: serde_json::to_value(kind.category())
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
        },
        Err(e) => StepCheck::Invalid {
            message: e.to_string(),
        },
    }
}

/// Validate the workflow at `file`, failing when any step has invalid parameters.
pub fn validate_workflow(file: &Path, json: bool) -> Result<()> {
    let workflow = load_workflow_file(file)
        .with_context(|| format!("Failed to load workflow {}", file.display()))?;

    let reports: Vec<StepReport<'_>> = workflow
        .actions
        .iter()
        .enumerate()
        .map(|(i, step)| StepReport {
            step: i + 1,
            action_type: &step.action_type,
            label: step.display_label(),
            check: check_step(step),
        })
        .collect();
    let invalid = reports
        .iter()
        .filter(|r| matches!(r.check, StepCheck::Invalid { .. }))
        .count();

    if json {
        let out = serde_json::json!({
            "id": workflow.id,
            "name": workflow.name,
            "variables": workflow.variables.len(),
            "steps": reports,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_report(&workflow, &reports);
    }

    if invalid > 0 {
        bail!("{invalid} step(s) have invalid parameters");
    }
    Ok(())
}

fn print_report(workflow: &WorkflowDefinition, reports: &[StepReport<'_>]) {
    println!();
    println!(
        "  {} Workflow '{}'",
        style("*").green().bold(),
        style(workflow.display_name()).cyan()
    );
    println!("  Steps: {}", workflow.actions.len());
    println!("  Variables: {}", workflow.variables.len());

    if reports.is_empty() {
        println!();
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#"),
            Cell::new("Type").fg(Color::Cyan),
            Cell::new("Label"),
            Cell::new("Check"),
        ]);

    for report in reports {
        let check = match &report.check {
            StepCheck::Ok { category } => Cell::new(format!("ok ({category})")).fg(Color::Green),
            StepCheck::Unknown => Cell::new("unknown, will be skipped").fg(Color::Yellow),
            StepCheck::Invalid { message } => Cell::new(message).fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(report.step),
            Cell::new(report.action_type),
            Cell::new(report.label),
            check,
        ]);
    }

    println!();
    println!("{table}");
    println!();
}
