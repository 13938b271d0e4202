//! Per-run resource holder and the registry that hands sessions out.
//!
//! An [`ExecutionSession`] owns the run's variables and at most one browser
//! page. Sessions are scoped to the [`SessionRegistry`] of one engine; nothing
//! here is process-wide.

use std::sync::Arc;

use dashmap::DashMap;
use rpaflow_types::action::OpenBrowserParams;
use rpaflow_types::error::{ActionError, ResourceError};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::capability::{BrowserPage, Capabilities};

// ---------------------------------------------------------------------------
// ExecutionSession
// ---------------------------------------------------------------------------

pub struct ExecutionSession {
    id: Uuid,
    variables: DashMap<String, Value>,
    browser: Mutex<Option<Arc<dyn BrowserPage>>>,
    capabilities: Capabilities,
}

impl ExecutionSession {
    pub fn new(id: Uuid, capabilities: Capabilities) -> Self {
        Self {
            id,
            variables: DashMap::new(),
            browser: Mutex::new(None),
            capabilities,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    // -- variables --

    pub fn set_variable(&self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn get_variable(&self, name: &str) -> Option<Value> {
        self.variables.get(name).map(|v| v.value().clone())
    }

    /// All variables, ordered by name.
    pub fn variables(&self) -> Map<String, Value> {
        let mut entries: Vec<(String, Value)> = self
            .variables
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().collect()
    }

    // -- browser --

    /// Launch a browser and bind its page to this session.
    ///
    /// A previously bound browser is replaced and closed. Returns the new
    /// browser's identifier.
    pub async fn open_browser(&self, options: &OpenBrowserParams) -> Result<String, ActionError> {
        let page = self.capabilities.browser.launch(options).await?;
        let browser_id = page.id().to_string();
        let previous = self.browser.lock().await.replace(page);
        if let Some(previous) = previous {
            tracing::debug!(session_id = %self.id, browser_id = previous.id(), "replacing open browser");
            if let Err(e) = previous.close().await {
                tracing::warn!(session_id = %self.id, error = %e, "failed to close replaced browser");
            }
        }
        Ok(browser_id)
    }

    /// The bound page, or [`ResourceError::BrowserNotOpen`].
    pub async fn page(&self) -> Result<Arc<dyn BrowserPage>, ResourceError> {
        self.browser
            .lock()
            .await
            .clone()
            .ok_or(ResourceError::BrowserNotOpen)
    }

    pub async fn has_browser(&self) -> bool {
        self.browser.lock().await.is_some()
    }

    /// Unbind and close the browser. Returns whether one was open.
    ///
    /// The binding is released even when closing fails.
    pub async fn close_browser(&self) -> Result<bool, ActionError> {
        let page = self.browser.lock().await.take();
        match page {
            Some(page) => {
                page.close().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl std::fmt::Debug for ExecutionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionSession")
            .field("id", &self.id)
            .field("variables", &self.variables.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// SessionRegistry
// ---------------------------------------------------------------------------

/// Sessions keyed by id.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, Arc<ExecutionSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session and return its id.
    pub fn create_session(&self, capabilities: Capabilities) -> Uuid {
        self.open_session(capabilities).id()
    }

    /// Create an empty session and return it.
    pub fn open_session(&self, capabilities: Capabilities) -> Arc<ExecutionSession> {
        let id = Uuid::now_v7();
        let session = Arc::new(ExecutionSession::new(id, capabilities));
        self.sessions.insert(id, Arc::clone(&session));
        session
    }

    pub fn get(&self, session_id: Uuid) -> Result<Arc<ExecutionSession>, ResourceError> {
        self.sessions
            .get(&session_id)
            .map(|s| Arc::clone(s.value()))
            .ok_or_else(|| ResourceError::SessionNotFound(session_id.to_string()))
    }

    /// Launch a browser for the given session.
    pub async fn open_browser(
        &self,
        session_id: Uuid,
        options: &OpenBrowserParams,
    ) -> Result<String, ActionError> {
        let session = self.get(session_id)?;
        session.open_browser(options).await
    }

    /// Drop a session from the registry, returning it for final cleanup.
    pub fn remove(&self, session_id: Uuid) -> Option<Arc<ExecutionSession>> {
        self.sessions.remove(&session_id).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;
    use serde_json::json;

    #[tokio::test]
    async fn variables_round_trip_without_coercion() {
        let harness = TestHarness::new();
        let session = ExecutionSession::new(Uuid::now_v7(), harness.capabilities());
        session.set_variable("n", json!(5));
        session.set_variable("s", json!("5"));
        session.set_variable("list", json!([1, {"a": null}]));

        assert_eq!(session.get_variable("n"), Some(json!(5)));
        assert_eq!(session.get_variable("s"), Some(json!("5")));
        assert_eq!(session.get_variable("list"), Some(json!([1, {"a": null}])));
        assert_eq!(session.get_variable("missing"), None);

        let keys: Vec<String> = session.variables().keys().cloned().collect();
        assert_eq!(keys, vec!["list", "n", "s"]);
    }

    #[tokio::test]
    async fn page_requires_an_open_browser() {
        let harness = TestHarness::new();
        let session = ExecutionSession::new(Uuid::now_v7(), harness.capabilities());
        assert_eq!(session.page().await.err(), Some(ResourceError::BrowserNotOpen));
        assert!(!session.close_browser().await.unwrap());
    }

    #[tokio::test]
    async fn opening_again_replaces_and_closes_the_previous_browser() {
        let harness = TestHarness::new();
        let session = ExecutionSession::new(Uuid::now_v7(), harness.capabilities());
        let first = session.open_browser(&OpenBrowserParams::default()).await.unwrap();
        let second = session.open_browser(&OpenBrowserParams::default()).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(harness.browser.launches(), 2);
        assert_eq!(harness.browser.closed(), vec![first]);
        assert_eq!(session.page().await.unwrap().id(), second);
    }

    #[tokio::test]
    async fn close_browser_unbinds_the_page() {
        let harness = TestHarness::new();
        let session = ExecutionSession::new(Uuid::now_v7(), harness.capabilities());
        session.open_browser(&OpenBrowserParams::default()).await.unwrap();
        assert!(session.has_browser().await);
        assert!(session.close_browser().await.unwrap());
        assert!(!session.has_browser().await);
        assert_eq!(harness.browser.closed().len(), 1);
    }

    #[tokio::test]
    async fn registry_creates_and_resolves_sessions() {
        let harness = TestHarness::new();
        let registry = SessionRegistry::new();
        let id = registry.create_session(harness.capabilities());
        assert_eq!(registry.len(), 1);

        registry
            .open_browser(id, &OpenBrowserParams::default())
            .await
            .unwrap();
        assert!(registry.get(id).unwrap().has_browser().await);

        let unknown = Uuid::now_v7();
        assert!(matches!(
            registry.get(unknown),
            Err(ResourceError::SessionNotFound(_))
        ));
        assert!(registry.remove(id).is_some());
        assert!(registry.is_empty());
    }
}
