//! Workflow definition types.
//!
//! A workflow is an ordered list of [`ActionStep`]s plus optional named
//! variables with default values. Steps keep their parameters as an open JSON
//! map; the typed payload is decoded later by the engine (see
//! [`crate::action::Action`]) so that an unknown action type never prevents a
//! workflow from loading.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Workflow Definition
// ---------------------------------------------------------------------------

/// A workflow submitted for execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    /// Caller-assigned workflow ID.
    #[serde(default)]
    pub id: String,
    /// Human-readable workflow name.
    #[serde(default)]
    pub name: String,
    /// Ordered steps. Executed strictly in index order.
    #[serde(default, alias = "steps")]
    pub actions: Vec<ActionStep>,
    /// Named variables with their initial values.
    #[serde(default)]
    pub variables: Vec<VariableDef>,
}

impl WorkflowDefinition {
    /// Name used in events and logs; falls back to the ID when unnamed.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// A named workflow variable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VariableDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl VariableDef {
    /// The value the variable holds when a run starts.
    ///
    /// `value` wins when present and non-null, then `defaultValue`, then null.
    pub fn initial_value(&self) -> Value {
        match (&self.value, &self.default_value) {
            (Some(v), _) if !v.is_null() => v.clone(),
            (_, Some(d)) => d.clone(),
            _ => Value::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// Action Step
// ---------------------------------------------------------------------------

/// One step of a workflow: a type key plus an open parameter map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStep {
    #[serde(default)]
    pub id: String,
    /// Action type key (e.g. `"click"`, `"http_get"`).
    #[serde(rename = "type", alias = "action", default)]
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, alias = "properties", alias = "params")]
    pub parameters: Map<String, Value>,
}

impl ActionStep {
    /// Create a step with the given type and parameters.
    pub fn new(action_type: impl Into<String>, parameters: Value) -> Self {
        let parameters = match parameters {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: String::new(),
            action_type: action_type.into(),
            label: None,
            parameters,
        }
    }

    /// Attach a human-readable label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label shown in events: the explicit label, else the type key.
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(self.action_type.as_str())
    }

    /// Whether a failure of this step should be tolerated by the run loop.
    pub fn continue_on_error(&self) -> bool {
        self.parameters
            .get("continueOnError")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
