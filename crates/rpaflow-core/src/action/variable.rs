//! Variable store handlers. Values are stored and returned verbatim.

use rpaflow_types::action::{ActionKind, GetVariableParams, SetVariableParams};
use rpaflow_types::error::ActionError;
use serde_json::{Value, json};

use super::{ActionContext, LOG_PREVIEW_CHARS, preview, require};

pub(super) fn set(ctx: &ActionContext<'_>, params: SetVariableParams) -> Result<Value, ActionError> {
    require(ActionKind::SetVariable, "name", &params.name)?;
    ctx.session.set_variable(&params.name, params.value.clone());
    ctx.info(format!(
        "Variable {} = {}",
        params.name,
        preview(&params.value.to_string(), LOG_PREVIEW_CHARS)
    ));
    Ok(json!({ "variable": params.name, "value": params.value }))
}

pub(super) fn get(ctx: &ActionContext<'_>, params: GetVariableParams) -> Result<Value, ActionError> {
    require(ActionKind::GetVariable, "name", &params.name)?;
    let value = ctx.session.get_variable(&params.name).unwrap_or(Value::Null);
    Ok(json!({ "variable": params.name, "value": value }))
}
