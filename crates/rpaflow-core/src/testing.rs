//! In-memory capability doubles shared by the crate's unit tests.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use rpaflow_types::action::{ElementState, LoadState, OpenBrowserParams};
use rpaflow_types::config::ExecutorSettings;
use rpaflow_types::error::ActionError;
use rpaflow_types::workflow::{ActionStep, WorkflowDefinition};
use serde_json::json;
use uuid::Uuid;

use crate::action::ActionContext;
use crate::capability::{
    BrowserDriver, BrowserPage, Capabilities, ClickOptions, FileSystem, HttpClient, HttpRequest,
    HttpResponse, ProcessOutput, ProcessRunner, Shell,
};
use crate::engine::execution::Execution;
use crate::engine::message_box::MessageBoxRegistry;
use crate::engine::session::ExecutionSession;
use crate::event::EventBus;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

// ---------------------------------------------------------------------------
// Browser
// ---------------------------------------------------------------------------

#[derive(Default)]
struct BrowserState {
    launches: AtomicUsize,
    calls: Mutex<Vec<String>>,
    closed: Mutex<Vec<String>>,
    hidden: Mutex<HashSet<String>>,
    texts: Mutex<HashMap<String, String>>,
    fail_close: Mutex<bool>,
}

impl BrowserState {
    fn record(&self, call: String) {
        lock(&self.calls).push(call);
    }
}

/// Browser driver that journals every page call.
#[derive(Default)]
pub struct RecordingBrowser {
    state: Arc<BrowserState>,
}

impl RecordingBrowser {
    pub fn launches(&self) -> usize {
        self.state.launches.load(Ordering::SeqCst)
    }

    /// Ids of closed pages, in close order.
    pub fn closed(&self) -> Vec<String> {
        lock(&self.state.closed).clone()
    }

    /// Page calls other than launch and close.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.state.calls).clone()
    }

    /// Make `selector` never become visible.
    pub fn hide(&self, selector: &str) {
        lock(&self.state.hidden).insert(selector.to_string());
    }

    pub fn set_text(&self, selector: &str, text: &str) {
        lock(&self.state.texts).insert(selector.to_string(), text.to_string());
    }

    pub fn fail_close(&self) {
        *lock(&self.state.fail_close) = true;
    }
}

impl BrowserDriver for RecordingBrowser {
    fn launch<'a>(
        &'a self,
        _options: &'a OpenBrowserParams,
    ) -> BoxFuture<'a, Result<Arc<dyn BrowserPage>, ActionError>> {
        let n = self.state.launches.fetch_add(1, Ordering::SeqCst) + 1;
        let page: Arc<dyn BrowserPage> = Arc::new(RecordingPage {
            id: format!("browser-{n}"),
            state: Arc::clone(&self.state),
        });
        async move { Ok(page) }.boxed()
    }
}

struct RecordingPage {
    id: String,
    state: Arc<BrowserState>,
}

impl RecordingPage {
    fn ok(&self, call: String) -> BoxFuture<'_, Result<(), ActionError>> {
        self.state.record(call);
        async { Ok(()) }.boxed()
    }
}

impl BrowserPage for RecordingPage {
    fn id(&self) -> &str {
        &self.id
    }

    fn goto<'a>(
        &'a self,
        url: &'a str,
        _wait_until: LoadState,
        _timeout: Duration,
    ) -> BoxFuture<'a, Result<(), ActionError>> {
        self.ok(format!("goto:{url}"))
    }

    fn wait_for_selector<'a>(
        &'a self,
        selector: &'a str,
        state: ElementState,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<(), ActionError>> {
        self.state.record(format!("wait:{selector}:{state:?}"));
        let hidden = lock(&self.state.hidden).contains(selector);
        let needs_presence = matches!(state, ElementState::Visible | ElementState::Attached);
        async move {
            if hidden && needs_presence {
                Err(ActionError::Timeout {
                    operation: format!("waiting for '{selector}'"),
                    timeout_ms: timeout.as_millis() as u64,
                })
            } else {
                Ok(())
            }
        }
        .boxed()
    }

    fn click<'a>(
        &'a self,
        selector: &'a str,
        options: ClickOptions,
    ) -> BoxFuture<'a, Result<(), ActionError>> {
        self.ok(format!(
            "click:{selector}:{:?}:{}",
            options.button, options.click_count
        ))
    }

    fn fill<'a>(&'a self, selector: &'a str, text: &'a str) -> BoxFuture<'a, Result<(), ActionError>> {
        self.ok(format!("fill:{selector}:{text}"))
    }

    fn type_text<'a>(
        &'a self,
        selector: &'a str,
        text: &'a str,
        _delay: Duration,
    ) -> BoxFuture<'a, Result<(), ActionError>> {
        self.ok(format!("type:{selector}:{text}"))
    }

    fn keyboard_down<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), ActionError>> {
        self.ok(format!("keydown:{key}"))
    }

    fn keyboard_up<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), ActionError>> {
        self.ok(format!("keyup:{key}"))
    }

    fn keyboard_press<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), ActionError>> {
        self.ok(format!("keypress:{key}"))
    }

    fn text_content<'a>(
        &'a self,
        selector: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, ActionError>> {
        self.state.record(format!("text:{selector}"));
        let text = lock(&self.state.texts).get(selector).cloned();
        async move { Ok(text) }.boxed()
    }

    fn screenshot_to_file<'a>(
        &'a self,
        path: &'a Path,
        full_page: bool,
    ) -> BoxFuture<'a, Result<(), ActionError>> {
        self.ok(format!("screenshot:{}:{full_page}", path.display()))
    }

    fn scroll_by(&self, dy: i64) -> BoxFuture<'_, Result<(), ActionError>> {
        self.ok(format!("scroll:{dy}"))
    }

    fn scroll_into_view<'a>(&'a self, selector: &'a str) -> BoxFuture<'a, Result<(), ActionError>> {
        self.ok(format!("scroll_into_view:{selector}"))
    }

    fn wait_for_load_state(
        &self,
        state: LoadState,
        _timeout: Duration,
    ) -> BoxFuture<'_, Result<(), ActionError>> {
        self.ok(format!("load:{state:?}"))
    }

    fn close(&self) -> BoxFuture<'_, Result<(), ActionError>> {
        let failing = *lock(&self.state.fail_close);
        async move {
            if failing {
                return Err(ActionError::Browser("browser process already gone".to_string()));
            }
            lock(&self.state.closed).push(self.id.clone());
            Ok(())
        }
        .boxed()
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// HTTP client answering every request with the scripted response.
#[derive(Default)]
pub struct ScriptedHttp {
    response: Mutex<Option<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttp {
    pub fn respond(&self, response: HttpResponse) {
        *lock(&self.response) = Some(response);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }
}

impl HttpClient for ScriptedHttp {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, ActionError>> {
        lock(&self.requests).push(request);
        let response = lock(&self.response).clone().unwrap_or(HttpResponse {
            status: 200,
            body: String::new(),
        });
        async move { Ok(response) }.boxed()
    }
}

// ---------------------------------------------------------------------------
// Processes
// ---------------------------------------------------------------------------

/// Process runner returning scripted outputs; unscripted commands exit 0.
#[derive(Default)]
pub struct ScriptedProcess {
    outputs: Mutex<HashMap<String, ProcessOutput>>,
    commands: Mutex<Vec<(Shell, String)>>,
    spawned: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedProcess {
    pub fn script(&self, command: &str, output: ProcessOutput) {
        lock(&self.outputs).insert(command.to_string(), output);
    }

    pub fn commands(&self) -> Vec<(Shell, String)> {
        lock(&self.commands).clone()
    }

    pub fn spawned(&self) -> Vec<(String, Vec<String>)> {
        lock(&self.spawned).clone()
    }
}

impl ProcessRunner for ScriptedProcess {
    fn run<'a>(
        &'a self,
        shell: Shell,
        command: &'a str,
    ) -> BoxFuture<'a, Result<ProcessOutput, ActionError>> {
        lock(&self.commands).push((shell, command.to_string()));
        let output = lock(&self.outputs)
            .get(command)
            .cloned()
            .unwrap_or(ProcessOutput {
                code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            });
        async move { Ok(output) }.boxed()
    }

    fn spawn_detached(&self, program: &str, args: &[String]) -> Result<(), ActionError> {
        lock(&self.spawned).push((program.to_string(), args.to_vec()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

/// Flat in-memory filesystem keyed by path.
#[derive(Default)]
pub struct MemoryFs {
    files: Mutex<HashMap<PathBuf, String>>,
}

impl MemoryFs {
    pub fn put(&self, path: &str, content: &str) {
        lock(&self.files).insert(PathBuf::from(path), content.to_string());
    }

    pub fn get(&self, path: &str) -> Option<String> {
        lock(&self.files).get(Path::new(path)).cloned()
    }

    fn missing(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )
    }
}

impl FileSystem for MemoryFs {
    fn read_to_string<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<String>> {
        let content = lock(&self.files).get(path).cloned();
        async move { content.ok_or_else(|| Self::missing(path)) }.boxed()
    }

    fn write<'a>(&'a self, path: &'a Path, content: &'a str) -> BoxFuture<'a, io::Result<()>> {
        lock(&self.files).insert(path.to_path_buf(), content.to_string());
        async { Ok(()) }.boxed()
    }

    fn copy<'a>(&'a self, from: &'a Path, to: &'a Path) -> BoxFuture<'a, io::Result<()>> {
        let mut files = lock(&self.files);
        let result = match files.get(from).cloned() {
            Some(content) => {
                files.insert(to.to_path_buf(), content);
                Ok(())
            }
            None => Err(Self::missing(from)),
        };
        async move { result }.boxed()
    }

    fn rename<'a>(&'a self, from: &'a Path, to: &'a Path) -> BoxFuture<'a, io::Result<()>> {
        let mut files = lock(&self.files);
        let result = match files.remove(from) {
            Some(content) => {
                files.insert(to.to_path_buf(), content);
                Ok(())
            }
            None => Err(Self::missing(from)),
        };
        async move { result }.boxed()
    }

    fn remove_file<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<()>> {
        let result = match lock(&self.files).remove(path) {
            Some(_) => Ok(()),
            None => Err(Self::missing(path)),
        };
        async move { result }.boxed()
    }

    fn exists<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, bool> {
        let found = lock(&self.files).contains_key(path);
        async move { found }.boxed()
    }
}

// ---------------------------------------------------------------------------
// Harness and fixtures
// ---------------------------------------------------------------------------

/// One set of doubles; clones of [`TestHarness::capabilities`] share them.
pub struct TestHarness {
    pub browser: Arc<RecordingBrowser>,
    pub http: Arc<ScriptedHttp>,
    pub process: Arc<ScriptedProcess>,
    pub fs: Arc<MemoryFs>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            browser: Arc::new(RecordingBrowser::default()),
            http: Arc::new(ScriptedHttp::default()),
            process: Arc::new(ScriptedProcess::default()),
            fs: Arc::new(MemoryFs::default()),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::new(
            self.browser.clone(),
            self.http.clone(),
            self.process.clone(),
            self.fs.clone(),
        )
    }
}

/// Everything a handler needs to run as step 1 of a one-step workflow.
pub struct StepFixture {
    pub harness: TestHarness,
    pub bus: EventBus,
    pub execution: Execution,
    pub session: ExecutionSession,
    pub message_boxes: MessageBoxRegistry,
    pub settings: ExecutorSettings,
}

impl StepFixture {
    pub fn new() -> Self {
        let harness = TestHarness::new();
        let bus = EventBus::new(256);
        let workflow = WorkflowDefinition {
            id: "wf-fixture".to_string(),
            name: "fixture".to_string(),
            actions: vec![ActionStep::new("log_info", json!({"message": "fixture"}))],
            variables: vec![],
        };
        let session = ExecutionSession::new(Uuid::now_v7(), harness.capabilities());
        let execution = Execution::new(Uuid::now_v7(), session.id(), &workflow, bus.clone());
        Self {
            harness,
            bus,
            execution,
            session,
            message_boxes: MessageBoxRegistry::new(),
            settings: ExecutorSettings::default(),
        }
    }

    pub fn ctx(&self) -> ActionContext<'_> {
        ActionContext {
            execution: &self.execution,
            session: &self.session,
            message_boxes: &self.message_boxes,
            settings: &self.settings,
            step: 1,
        }
    }
}
