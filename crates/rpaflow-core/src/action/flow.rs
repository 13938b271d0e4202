//! Flow-control markers.
//!
//! The run loop is flat: `if_condition` and `for_loop` do not branch or
//! repeat anything. They record their parameter so a workflow that carries
//! them still runs, and a compiler that expands them ahead of submission can
//! be added without touching the loop.

use rpaflow_types::action::FlowMarkerParams;
use rpaflow_types::error::ActionError;
use serde_json::{Value, json};

pub(super) fn if_condition(params: FlowMarkerParams) -> Result<Value, ActionError> {
    Ok(json!({ "condition": params.condition.unwrap_or(Value::Null) }))
}

pub(super) fn for_loop(params: FlowMarkerParams) -> Result<Value, ActionError> {
    Ok(json!({ "iterations": params.iterations.unwrap_or(Value::Null) }))
}
