//! Workflow definition parsing, validation, and filesystem loading.
//!
//! Workflows arrive as JSON (the editor's export format) or YAML. Validation
//! is deliberately shallow: unknown action types load fine and are skipped at
//! run time, so only the variable table is checked here.

use std::collections::HashSet;
use std::path::Path;

use rpaflow_types::workflow::WorkflowDefinition;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DefinitionError {
    /// JSON/YAML parse failure.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a JSON document into a validated `WorkflowDefinition`.
pub fn parse_workflow_json(json: &str) -> Result<WorkflowDefinition, DefinitionError> {
    let def: WorkflowDefinition =
        serde_json::from_str(json).map_err(|e| DefinitionError::Parse(e.to_string()))?;
    validate_definition(&def)?;
    Ok(def)
}

/// Parse a YAML document into a validated `WorkflowDefinition`.
pub fn parse_workflow_yaml(yaml: &str) -> Result<WorkflowDefinition, DefinitionError> {
    let def: WorkflowDefinition =
        serde_yaml_ng::from_str(yaml).map_err(|e| DefinitionError::Parse(e.to_string()))?;
    validate_definition(&def)?;
    Ok(def)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check the variable table: names must be non-empty and unique.
pub fn validate_definition(def: &WorkflowDefinition) -> Result<(), DefinitionError> {
    let mut seen = HashSet::new();
    for variable in &def.variables {
        if variable.name.trim().is_empty() {
            return Err(DefinitionError::Validation(
                "variable name must not be empty".to_string(),
            ));
        }
        if !seen.insert(variable.name.as_str()) {
            return Err(DefinitionError::Validation(format!(
                "duplicate variable: '{}'",
                variable.name
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Filesystem operations
// ---------------------------------------------------------------------------

/// Load a workflow file.
///
/// `.json` files are parsed as JSON and `.yaml`/`.yml` as YAML. Any other
/// extension tries JSON first, then YAML.
pub fn load_workflow_file(path: &Path) -> Result<WorkflowDefinition, DefinitionError> {
    let content = std::fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let def = match ext.as_deref() {
        Some("json") => parse_workflow_json(&content)?,
        Some("yaml" | "yml") => parse_workflow_yaml(&content)?,
        _ => match parse_workflow_json(&content) {
            Ok(def) => def,
            Err(DefinitionError::Parse(_)) => parse_workflow_yaml(&content)?,
            Err(e) => return Err(e),
        },
    };
    tracing::debug!(?path, steps = def.actions.len(), "loaded workflow file");
    Ok(def)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const JSON: &str = r##"{
        "id": "wf-login",
        "name": "Login",
        "actions": [
            {"id": "a1", "type": "open_browser", "properties": {"headless": true}},
            {"id": "a2", "type": "navigate", "label": "Go", "properties": {"url": "https://example.com"}},
            {"id": "a3", "type": "some_future_action", "properties": {}}
        ],
        "variables": [{"name": "user", "defaultValue": "admin"}]
    }"##;

    const YAML: &str = r#"
id: wf-report
name: Report
steps:
  - type: http_get
    params:
      url: https://api.test/report
      saveAs: report
  - type: file_write
    params:
      path: out.json
      content: done
variables:
  - name: retries
    value: 3
"#;

    #[test]
    fn test_parse_json_keeps_unknown_types() {
        let def = parse_workflow_json(JSON).unwrap();
        assert_eq!(def.name, "Login");
        assert_eq!(def.actions.len(), 3);
        assert_eq!(def.actions[2].action_type, "some_future_action");
        assert_eq!(def.actions[1].display_label(), "Go");
    }

    #[test]
    fn test_parse_yaml() {
        let def = parse_workflow_yaml(YAML).unwrap();
        assert_eq!(def.id, "wf-report");
        assert_eq!(def.actions.len(), 2);
        assert_eq!(def.actions[0].parameters["saveAs"], "report");
        assert_eq!(def.variables[0].initial_value(), serde_json::json!(3));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = parse_workflow_json("{not json").unwrap_err();
        assert!(matches!(err, DefinitionError::Parse(_)));
    }

    #[test]
    fn test_validation_rejects_duplicate_variables() {
        let json = r#"{"name": "dup", "actions": [], "variables": [{"name": "a"}, {"name": "a"}]}"#;
        let err = parse_workflow_json(json).unwrap_err();
        assert!(err.to_string().contains("duplicate variable"), "got: {err}");
    }

    #[test]
    fn test_validation_rejects_blank_variable_name() {
        let json = r#"{"name": "blank", "variables": [{"name": " "}]}"#;
        let err = parse_workflow_json(json).unwrap_err();
        assert!(matches!(err, DefinitionError::Validation(_)));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("login.json");
        let yaml_path = dir.path().join("report.yml");
        std::fs::write(&json_path, JSON).unwrap();
        std::fs::write(&yaml_path, YAML).unwrap();

        assert_eq!(load_workflow_file(&json_path).unwrap().id, "wf-login");
        assert_eq!(load_workflow_file(&yaml_path).unwrap().id, "wf-report");
    }

    #[test]
    fn test_unknown_extension_falls_back_to_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.workflow");
        std::fs::write(&path, YAML).unwrap();
        assert_eq!(load_workflow_file(&path).unwrap().actions.len(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = load_workflow_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, DefinitionError::Io(_)));
    }
}
