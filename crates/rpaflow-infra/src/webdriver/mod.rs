//! `BrowserDriver` capability over the W3C WebDriver protocol.
//!
//! Talks to an already running chromedriver, msedgedriver, or geckodriver.
//! Each launched browser is one WebDriver session; the page id is the
//! session id. Waits poll the driver at the configured interval, and no
//! navigation or wait outlives its step timeout.

pub mod protocol;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures_util::future::{BoxFuture, FutureExt};
use rpaflow_core::capability::{BrowserDriver, BrowserPage, ClickOptions};
use rpaflow_types::action::{BrowserEngine, ElementState, LoadState, MouseButton, OpenBrowserParams};
use rpaflow_types::config::BrowserSettings;
use rpaflow_types::error::ActionError;
use serde_json::{Value, json};
use tokio::time::Instant;

use protocol::WireError;

type BrowserResult<T> = Result<T, ActionError>;

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Failure of a single WebDriver command.
enum CommandError {
    Wire(WireError),
    Transport(String),
}

impl From<CommandError> for ActionError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Wire(e) => ActionError::Browser(e.to_string()),
            CommandError::Transport(e) => ActionError::Browser(e),
        }
    }
}

/// Send one command and unwrap the response's `value`.
async fn command(
    client: &reqwest::Client,
    method: reqwest::Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value, CommandError> {
    let mut request = client.request(method.clone(), url);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request
        .send()
        .await
        .map_err(|e| CommandError::Transport(format!("{method} {url}: {e}")))?;
    let status = response.status();
    let payload: Value = response
        .json()
        .await
        .map_err(|e| CommandError::Transport(format!("invalid WebDriver response: {e}")))?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if let Some(err) = WireError::from_value(&value) {
        return Err(CommandError::Wire(err));
    }
    if !status.is_success() {
        return Err(CommandError::Transport(format!("{method} {url}: HTTP {status}")));
    }
    Ok(value)
}

fn timed_out(operation: String, timeout: Duration) -> ActionError {
    ActionError::Timeout {
        operation,
        timeout_ms: timeout.as_millis() as u64,
    }
}

/// Await `command` unless `deadline` passes first.
async fn by_deadline<T>(
    deadline: Instant,
    timeout: Duration,
    operation: impl FnOnce() -> String,
    command: impl Future<Output = BrowserResult<T>>,
) -> BrowserResult<T> {
    tokio::time::timeout_at(deadline, command)
        .await
        .map_err(|_| timed_out(operation(), timeout))?
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Launches browsers through WebDriver servers.
#[derive(Debug, Clone)]
pub struct WebDriverBrowser {
    client: reqwest::Client,
    settings: BrowserSettings,
}

impl WebDriverBrowser {
    pub fn new(settings: BrowserSettings) -> Result<Self, ActionError> {
        let client = reqwest::Client::builder()
            .timeout(settings.command_timeout())
            .build()
            .map_err(|e| ActionError::Browser(format!("failed to build WebDriver client: {e}")))?;
        Ok(Self { client, settings })
    }

    async fn open(&self, options: &OpenBrowserParams) -> BrowserResult<Arc<dyn BrowserPage>> {
        let driver_url = self.settings.driver_url(options.browser).trim_end_matches('/');
        let value = command(
            &self.client,
            reqwest::Method::POST,
            &format!("{driver_url}/session"),
            Some(protocol::new_session_body(options)),
        )
        .await
        .map_err(|e| match e {
            CommandError::Wire(e) => {
                ActionError::Browser(format!("failed to launch {}: {e}", options.browser.as_str()))
            }
            CommandError::Transport(e) => ActionError::Browser(format!(
                "failed to reach WebDriver at {driver_url}: {e}"
            )),
        })?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| ActionError::Browser("WebDriver returned no session id".to_string()))?
            .to_string();

        let page = WebDriverPage {
            client: self.client.clone(),
            base: format!("{driver_url}/session/{session_id}"),
            id: session_id,
            engine: options.browser,
            poll_interval: self.settings.poll_interval(),
        };
        page.apply_window(options).await;

        tracing::info!(
            browser = options.browser.as_str(),
            browser_id = %page.id,
            headless = options.headless,
            "browser launched"
        );
        Ok(Arc::new(page))
    }
}

impl BrowserDriver for WebDriverBrowser {
    fn launch<'a>(
        &'a self,
        options: &'a OpenBrowserParams,
    ) -> BoxFuture<'a, BrowserResult<Arc<dyn BrowserPage>>> {
        self.open(options).boxed()
    }
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

pub struct WebDriverPage {
    client: reqwest::Client,
    base: String,
    id: String,
    engine: BrowserEngine,
    poll_interval: Duration,
}

impl WebDriverPage {
    async fn call(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, CommandError> {
        command(&self.client, method, &format!("{}{path}", self.base), body).await
    }

    async fn post(&self, path: &str, body: Value) -> BrowserResult<Value> {
        Ok(self.call(reqwest::Method::POST, path, Some(body)).await?)
    }

    async fn get(&self, path: &str) -> BrowserResult<Value> {
        Ok(self.call(reqwest::Method::GET, path, None).await?)
    }

    async fn script(&self, script: &str, args: Vec<Value>) -> BrowserResult<Value> {
        self.post("/execute/sync", json!({ "script": script, "args": args }))
            .await
    }

    /// Apply window size and state. Failures are logged, not returned.
    async fn apply_window(&self, options: &OpenBrowserParams) {
        let result = if options.maximized && !options.headless {
            self.post("/window/maximize", json!({})).await
        } else {
            self.post(
                "/window/rect",
                json!({ "width": options.width, "height": options.height }),
            )
            .await
        };
        if let Err(e) = result {
            tracing::debug!(browser_id = %self.id, error = %e, "window sizing not applied");
        }
    }

    async fn find(&self, selector: &str) -> BrowserResult<Option<String>> {
        let found = self
            .call(
                reqwest::Method::POST,
                "/element",
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await;
        match found {
            Ok(value) => Ok(protocol::element_id(&value)),
            Err(CommandError::Wire(e)) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn require(&self, selector: &str) -> BrowserResult<String> {
        self.find(selector)
            .await?
            .ok_or_else(|| ActionError::Browser(format!("no element matches '{selector}'")))
    }

    async fn displayed(&self, element: &str) -> BrowserResult<bool> {
        let value = self.get(&format!("/element/{element}/displayed")).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn selector_in_state(&self, selector: &str, state: ElementState) -> BrowserResult<bool> {
        let element = self.find(selector).await?;
        Ok(match (state, element) {
            (ElementState::Attached, found) => found.is_some(),
            (ElementState::Detached, found) => found.is_none(),
            (ElementState::Visible, Some(id)) => self.displayed(&id).await?,
            (ElementState::Visible, None) => false,
            (ElementState::Hidden, Some(id)) => !self.displayed(&id).await?,
            (ElementState::Hidden, None) => true,
        })
    }

    async fn load_state_reached(&self, state: LoadState) -> BrowserResult<bool> {
        let ready = self.script("return document.readyState", vec![]).await?;
        let ready = ready.as_str().unwrap_or_default();
        Ok(match state {
            LoadState::DomContentLoaded => ready == "interactive" || ready == "complete",
            LoadState::Load | LoadState::NetworkIdle => ready == "complete",
        })
    }

    async fn key_actions(&self, actions: Vec<Value>) -> BrowserResult<()> {
        self.post(
            "/actions",
            json!({ "actions": [{ "type": "key", "id": "keyboard", "actions": actions }] }),
        )
        .await?;
        Ok(())
    }

    async fn key(&self, key: &str, kinds: &[&str]) -> BrowserResult<()> {
        let code = protocol::key_code(key)
            .ok_or_else(|| ActionError::Browser(format!("unknown key '{key}'")))?;
        let actions = kinds
            .iter()
            .map(|kind| json!({ "type": kind, "value": code }))
            .collect();
        self.key_actions(actions).await
    }

    async fn navigate(&self, url: &str, timeout: Duration) -> BrowserResult<()> {
        let page_load = json!({ "pageLoad": timeout.as_millis() as u64 });
        if let Err(e) = self.post("/timeouts", page_load).await {
            tracing::debug!(browser_id = %self.id, error = %e, "page load timeout not applied");
        }
        match self.call(reqwest::Method::POST, "/url", Some(json!({ "url": url }))).await {
            Ok(_) => Ok(()),
            Err(CommandError::Wire(e)) if e.is_timeout() => {
                Err(timed_out(format!("navigating to '{url}'"), timeout))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn do_goto(&self, url: &str, wait_until: LoadState, timeout: Duration) -> BrowserResult<()> {
        let deadline = Instant::now() + timeout;
        by_deadline(
            deadline,
            timeout,
            || format!("navigating to '{url}'"),
            self.navigate(url, timeout),
        )
        .await?;
        self.load_state_until(wait_until, deadline, timeout).await
    }

    async fn do_wait_for_selector(
        &self,
        selector: &str,
        state: ElementState,
        timeout: Duration,
    ) -> BrowserResult<()> {
        let deadline = Instant::now() + timeout;
        let operation = || {
            format!(
                "waiting for '{selector}' to be {}",
                format!("{state:?}").to_lowercase()
            )
        };
        loop {
            let check = self.selector_in_state(selector, state);
            if by_deadline(deadline, timeout, operation, check).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(timed_out(operation(), timeout));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn do_wait_for_load_state(&self, state: LoadState, timeout: Duration) -> BrowserResult<()> {
        self.load_state_until(state, Instant::now() + timeout, timeout)
            .await
    }

    /// Poll `document.readyState` until `state` is reached or `deadline` passes.
    async fn load_state_until(
        &self,
        state: LoadState,
        deadline: Instant,
        timeout: Duration,
    ) -> BrowserResult<()> {
        let operation = || format!("waiting for page load ({state:?})");
        loop {
            let check = self.load_state_reached(state);
            if by_deadline(deadline, timeout, operation, check).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(timed_out(operation(), timeout));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn do_click(&self, selector: &str, options: ClickOptions) -> BrowserResult<()> {
        let element = self.require(selector).await?;
        if options.button == MouseButton::Left && options.click_count == 1 && options.delay.is_zero() {
            self.post(&format!("/element/{element}/click"), json!({})).await?;
            return Ok(());
        }

        let button = match options.button {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
        };
        let mut actions = vec![json!({
            "type": "pointerMove",
            "duration": 0,
            "origin": protocol::element_ref(&element),
            "x": 0,
            "y": 0,
        })];
        for _ in 0..options.click_count.max(1) {
            actions.push(json!({ "type": "pointerDown", "button": button }));
            if !options.delay.is_zero() {
                actions.push(json!({ "type": "pause", "duration": options.delay.as_millis() as u64 }));
            }
            actions.push(json!({ "type": "pointerUp", "button": button }));
        }
        self.post(
            "/actions",
            json!({ "actions": [{
                "type": "pointer",
                "id": "mouse",
                "parameters": { "pointerType": "mouse" },
                "actions": actions,
            }] }),
        )
        .await?;
        Ok(())
    }

    async fn do_fill(&self, selector: &str, text: &str) -> BrowserResult<()> {
        let element = self.require(selector).await?;
        self.post(&format!("/element/{element}/clear"), json!({})).await?;
        if !text.is_empty() {
            self.post(&format!("/element/{element}/value"), json!({ "text": text }))
                .await?;
        }
        Ok(())
    }

    async fn do_type_text(&self, selector: &str, text: &str, delay: Duration) -> BrowserResult<()> {
        let element = self.require(selector).await?;
        let path = format!("/element/{element}/value");
        if delay.is_zero() {
            self.post(&path, json!({ "text": text })).await?;
            return Ok(());
        }
        for (i, c) in text.chars().enumerate() {
            if i > 0 {
                tokio::time::sleep(delay).await;
            }
            self.post(&path, json!({ "text": c.to_string() })).await?;
        }
        Ok(())
    }

    async fn do_text_content(&self, selector: &str) -> BrowserResult<Option<String>> {
        let Some(element) = self.find(selector).await? else {
            return Ok(None);
        };
        let value = self.get(&format!("/element/{element}/text")).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn do_screenshot(&self, path: &Path, full_page: bool) -> BrowserResult<()> {
        let endpoint = if full_page && self.engine == BrowserEngine::Firefox {
            "/moz/screenshot/full"
        } else {
            "/screenshot"
        };
        let encoded = self.get(endpoint).await?;
        let bytes = STANDARD
            .decode(encoded.as_str().unwrap_or_default())
            .map_err(|e| ActionError::Browser(format!("invalid screenshot data: {e}")))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ActionError::FileSystem(format!("{}: {e}", parent.display())))?;
        }
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| ActionError::FileSystem(format!("{}: {e}", path.display())))
    }

    async fn do_scroll_into_view(&self, selector: &str) -> BrowserResult<()> {
        let element = self.require(selector).await?;
        self.script(
            "arguments[0].scrollIntoView({block: 'center'});",
            vec![protocol::element_ref(&element)],
        )
        .await?;
        Ok(())
    }

    async fn do_close(&self) -> BrowserResult<()> {
        self.call(reqwest::Method::DELETE, "", None).await?;
        tracing::debug!(browser_id = %self.id, "webdriver session closed");
        Ok(())
    }
}

impl BrowserPage for WebDriverPage {
    fn id(&self) -> &str {
        &self.id
    }

    fn goto<'a>(
        &'a self,
        url: &'a str,
        wait_until: LoadState,
        timeout: Duration,
    ) -> BoxFuture<'a, BrowserResult<()>> {
        self.do_goto(url, wait_until, timeout).boxed()
    }

    fn wait_for_selector<'a>(
        &'a self,
        selector: &'a str,
        state: ElementState,
        timeout: Duration,
    ) -> BoxFuture<'a, BrowserResult<()>> {
        self.do_wait_for_selector(selector, state, timeout).boxed()
    }

    fn click<'a>(
        &'a self,
        selector: &'a str,
        options: ClickOptions,
    ) -> BoxFuture<'a, BrowserResult<()>> {
        self.do_click(selector, options).boxed()
    }

    fn fill<'a>(&'a self, selector: &'a str, text: &'a str) -> BoxFuture<'a, BrowserResult<()>> {
        self.do_fill(selector, text).boxed()
    }

    fn type_text<'a>(
        &'a self,
        selector: &'a str,
        text: &'a str,
        delay: Duration,
    ) -> BoxFuture<'a, BrowserResult<()>> {
        self.do_type_text(selector, text, delay).boxed()
    }

    fn keyboard_down<'a>(&'a self, key: &'a str) -> BoxFuture<'a, BrowserResult<()>> {
        self.key(key, &["keyDown"]).boxed()
    }

    fn keyboard_up<'a>(&'a self, key: &'a str) -> BoxFuture<'a, BrowserResult<()>> {
        self.key(key, &["keyUp"]).boxed()
    }

    fn keyboard_press<'a>(&'a self, key: &'a str) -> BoxFuture<'a, BrowserResult<()>> {
        self.key(key, &["keyDown", "keyUp"]).boxed()
    }

    fn text_content<'a>(&'a self, selector: &'a str) -> BoxFuture<'a, BrowserResult<Option<String>>> {
        self.do_text_content(selector).boxed()
    }

    fn screenshot_to_file<'a>(
        &'a self,
        path: &'a Path,
        full_page: bool,
    ) -> BoxFuture<'a, BrowserResult<()>> {
        self.do_screenshot(path, full_page).boxed()
    }

    fn scroll_by(&self, dy: i64) -> BoxFuture<'_, BrowserResult<()>> {
        async move {
            self.script("window.scrollBy(0, arguments[0]);", vec![json!(dy)])
                .await?;
            Ok(())
        }
        .boxed()
    }

    fn scroll_into_view<'a>(&'a self, selector: &'a str) -> BoxFuture<'a, BrowserResult<()>> {
        self.do_scroll_into_view(selector).boxed()
    }

    fn wait_for_load_state(
        &self,
        state: LoadState,
        timeout: Duration,
    ) -> BoxFuture<'_, BrowserResult<()>> {
        self.do_wait_for_load_state(state, timeout).boxed()
    }

    fn close(&self) -> BoxFuture<'_, BrowserResult<()>> {
        self.do_close().boxed()
    }
}

impl std::fmt::Debug for WebDriverPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDriverPage")
            .field("id", &self.id)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
