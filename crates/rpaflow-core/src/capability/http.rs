//! HTTP client port.

use std::collections::HashMap;

use futures_util::future::BoxFuture;
use rpaflow_types::action::HttpMethod;
use rpaflow_types::error::ActionError;
use serde_json::Value;

/// An outgoing request. `body` is sent as serialized JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

/// A received response. Non-2xx statuses are ordinary responses.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// The body parsed as JSON, or the raw text when it is not JSON.
    pub fn data(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|_| Value::String(self.body.clone()))
    }
}

pub trait HttpClient: Send + Sync {
    /// Send a request. Transport failures are errors; HTTP error statuses are not.
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, ActionError>>;
}
