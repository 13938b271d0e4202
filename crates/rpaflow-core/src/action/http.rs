//! HTTP action handlers.

use rpaflow_types::action::{ActionKind, HttpMethod, HttpParams};
use rpaflow_types::error::ActionError;
use serde_json::{Value, json};

use super::{ActionContext, require};
use crate::capability::HttpRequest;

const JSON_CONTENT_TYPE: &str = "application/json";

pub(super) async fn request(
    ctx: &ActionContext<'_>,
    method: HttpMethod,
    params: HttpParams,
) -> Result<Value, ActionError> {
    require(kind(method), "url", &params.url)?;
    ctx.info(format!("HTTP {}: {}", method.as_str(), params.url));

    let mut headers = params.headers;
    let body = if method.has_body() {
        if !headers.keys().any(|k| k.eq_ignore_ascii_case("content-type")) {
            headers.insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());
        }
        params.body
    } else {
        None
    };

    let response = ctx
        .session
        .capabilities()
        .http
        .send(HttpRequest {
            method,
            url: params.url,
            headers,
            body,
        })
        .await?;

    if method == HttpMethod::Delete {
        return Ok(json!({ "status": response.status }));
    }

    let data = response.data();
    if let Some(name) = params.save_as.as_deref().filter(|n| !n.is_empty()) {
        ctx.session.set_variable(name, data.clone());
    }
    Ok(json!({ "status": response.status, "data": data }))
}

fn kind(method: HttpMethod) -> ActionKind {
    match method {
        HttpMethod::Get => ActionKind::HttpGet,
        HttpMethod::Post => ActionKind::HttpPost,
        HttpMethod::Put => ActionKind::HttpPut,
        HttpMethod::Delete => ActionKind::HttpDelete,
    }
}
