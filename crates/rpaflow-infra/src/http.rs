//! `HttpClient` capability backed by reqwest.

use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use rpaflow_core::capability::{HttpClient, HttpRequest, HttpResponse};
use rpaflow_types::action::HttpMethod;
use rpaflow_types::config::HttpSettings;
use rpaflow_types::error::ActionError;

/// HTTP client for the `http_*` actions.
///
/// Non-2xx responses are returned as ordinary responses; only transport
/// failures become errors.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(settings: &HttpSettings) -> Result<Self, ActionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| ActionError::Http(format!("failed to build client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ActionError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| ActionError::Http(format!("failed to encode body: {e}")))?;
            builder = builder.body(bytes);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ActionError::Http(format!("{} {}: {e}", request.method.as_str(), request.url)))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ActionError::Http(format!("failed to read response body: {e}")))?;

        tracing::debug!(
            method = request.method.as_str(),
            url = %request.url,
            status,
            bytes = body.len(),
            "http request finished"
        );
        Ok(HttpResponse { status, body })
    }
}

impl HttpClient for ReqwestHttpClient {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, ActionError>> {
        self.execute(request).boxed()
    }
}
