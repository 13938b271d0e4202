//! Typed action vocabulary.
//!
//! [`ActionKind`] is the closed set of recognised action-type keys (with their
//! aliases). [`Action`] pairs a kind with its decoded parameter payload.
//! Decoding happens per step at execution time, so a malformed parameter bag
//! fails only the step that carries it.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ActionError;
use crate::execution::Severity;

// ---------------------------------------------------------------------------
// Action kinds
// ---------------------------------------------------------------------------

/// Category an action belongs to. Used for logging and capability routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Browser,
    Http,
    Process,
    File,
    Variable,
    Timing,
    Messaging,
    Flow,
}

/// Every action type the engine knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    OpenBrowser,
    Navigate,
    Click,
    Type,
    Extract,
    Screenshot,
    Scroll,
    CloseBrowser,
    WaitElement,
    WaitPageLoad,
    HttpGet,
    HttpPost,
    HttpPut,
    HttpDelete,
    PowershellRun,
    CmdRun,
    RunApplication,
    FileRead,
    FileWrite,
    FileCopy,
    FileMove,
    FileDelete,
    FileExists,
    SetVariable,
    GetVariable,
    Wait,
    MessageBox,
    LogInfo,
    LogWarning,
    LogError,
    IfCondition,
    ForLoop,
}

impl ActionKind {
    /// Resolve a type key (including aliases) to a kind.
    ///
    /// Returns `None` for unknown keys; the caller decides how to degrade.
    pub fn resolve(key: &str) -> Option<Self> {
        let kind = match key {
            "open_browser" | "browser_open" => ActionKind::OpenBrowser,
            "navigate" => ActionKind::Navigate,
            "click" => ActionKind::Click,
            "type" => ActionKind::Type,
            "extract" => ActionKind::Extract,
            "screenshot" => ActionKind::Screenshot,
            "scroll" => ActionKind::Scroll,
            "close_browser" => ActionKind::CloseBrowser,
            "wait_element" => ActionKind::WaitElement,
            "wait_page_load" => ActionKind::WaitPageLoad,
            "http_get" => ActionKind::HttpGet,
            "http_post" => ActionKind::HttpPost,
            "http_put" => ActionKind::HttpPut,
            "http_delete" => ActionKind::HttpDelete,
            "powershell_run" => ActionKind::PowershellRun,
            "cmd_run" => ActionKind::CmdRun,
            "run_application" => ActionKind::RunApplication,
            "file_read" => ActionKind::FileRead,
            "file_write" => ActionKind::FileWrite,
            "file_copy" => ActionKind::FileCopy,
            "file_move" => ActionKind::FileMove,
            "file_delete" => ActionKind::FileDelete,
            "file_exists" => ActionKind::FileExists,
            "set_variable" => ActionKind::SetVariable,
            "get_variable" => ActionKind::GetVariable,
            "wait" | "delay" | "wait_seconds" => ActionKind::Wait,
            "message_box" => ActionKind::MessageBox,
            "log_info" => ActionKind::LogInfo,
            "log_warning" => ActionKind::LogWarning,
            "log_error" => ActionKind::LogError,
            "if_condition" => ActionKind::IfCondition,
            "for_loop" => ActionKind::ForLoop,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical type key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::OpenBrowser => "open_browser",
            ActionKind::Navigate => "navigate",
            ActionKind::Click => "click",
            ActionKind::Type => "type",
            ActionKind::Extract => "extract",
            ActionKind::Screenshot => "screenshot",
            ActionKind::Scroll => "scroll",
            ActionKind::CloseBrowser => "close_browser",
            ActionKind::WaitElement => "wait_element",
            ActionKind::WaitPageLoad => "wait_page_load",
            ActionKind::HttpGet => "http_get",
            ActionKind::HttpPost => "http_post",
            ActionKind::HttpPut => "http_put",
            ActionKind::HttpDelete => "http_delete",
            ActionKind::PowershellRun => "powershell_run",
            ActionKind::CmdRun => "cmd_run",
            ActionKind::RunApplication => "run_application",
            ActionKind::FileRead => "file_read",
            ActionKind::FileWrite => "file_write",
            ActionKind::FileCopy => "file_copy",
            ActionKind::FileMove => "file_move",
            ActionKind::FileDelete => "file_delete",
            ActionKind::FileExists => "file_exists",
            ActionKind::SetVariable => "set_variable",
            ActionKind::GetVariable => "get_variable",
            ActionKind::Wait => "wait",
            ActionKind::MessageBox => "message_box",
            ActionKind::LogInfo => "log_info",
            ActionKind::LogWarning => "log_warning",
            ActionKind::LogError => "log_error",
            ActionKind::IfCondition => "if_condition",
            ActionKind::ForLoop => "for_loop",
        }
    }

    pub fn category(&self) -> ActionCategory {
        use ActionKind::*;
        match self {
            OpenBrowser | Navigate | Click | Type | Extract | Screenshot | Scroll
            | CloseBrowser | WaitElement | WaitPageLoad => ActionCategory::Browser,
            HttpGet | HttpPost | HttpPut | HttpDelete => ActionCategory::Http,
            PowershellRun | CmdRun | RunApplication => ActionCategory::Process,
            FileRead | FileWrite | FileCopy | FileMove | FileDelete | FileExists => {
                ActionCategory::File
            }
            SetVariable | GetVariable => ActionCategory::Variable,
            Wait => ActionCategory::Timing,
            MessageBox | LogInfo | LogWarning | LogError => ActionCategory::Messaging,
            IfCondition | ForLoop => ActionCategory::Flow,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Shared parameter enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserEngine {
    #[default]
    #[serde(alias = "chromium")]
    Chrome,
    #[serde(alias = "msedge")]
    Edge,
    Firefox,
}

impl BrowserEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserEngine::Chrome => "chrome",
            BrowserEngine::Edge => "edge",
            BrowserEngine::Firefox => "firefox",
        }
    }
}

/// Page readiness milestone used by navigation and load waits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Load,
    #[default]
    DomContentLoaded,
    NetworkIdle,
}

/// Element condition awaited by `wait_element`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMethod {
    /// Keystroke by keystroke with a delay between keys.
    #[default]
    Type,
    /// Set the field value at once.
    Fill,
    /// Treated like `Fill`.
    Paste,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    #[default]
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether the request carries a JSON body.
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

// ---------------------------------------------------------------------------
// Parameter payloads
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

fn default_navigation_timeout() -> u64 {
    30_000
}

fn default_visibility_timeout() -> u64 {
    10_000
}

fn default_click_count() -> u32 {
    1
}

fn default_type_delay() -> u64 {
    50
}

fn default_scroll_amount() -> i64 {
    300
}

fn default_wait_seconds() -> f64 {
    1.0
}

fn default_message_title() -> String {
    "Message".to_string()
}

fn default_message_kind() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpenBrowserParams {
    #[serde(default)]
    pub browser: BrowserEngine,
    #[serde(default)]
    pub headless: bool,
    #[serde(default = "default_true")]
    pub maximized: bool,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for OpenBrowserParams {
    fn default() -> Self {
        Self {
            browser: BrowserEngine::default(),
            headless: false,
            maximized: true,
            width: default_width(),
            height: default_height(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NavigateParams {
    pub url: String,
    #[serde(default)]
    pub wait_until: LoadState,
    #[serde(default = "default_navigation_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClickParams {
    pub selector: String,
    #[serde(default)]
    pub button: MouseButton,
    #[serde(default = "default_click_count")]
    pub click_count: u32,
    #[serde(default)]
    pub delay: u64,
    #[serde(default = "default_visibility_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypeParams {
    pub selector: String,
    #[serde(alias = "value")]
    pub text: String,
    #[serde(default)]
    pub clear_before: Option<bool>,
    #[serde(default)]
    pub clear_first: Option<bool>,
    #[serde(default)]
    pub input_method: InputMethod,
    #[serde(default = "default_type_delay", alias = "typeDelay")]
    pub delay: u64,
    #[serde(default)]
    pub press_key_after: Option<String>,
    #[serde(default)]
    pub press_enter: bool,
}

impl TypeParams {
    /// The field is cleared unless either clear flag is explicitly false.
    pub fn should_clear(&self) -> bool {
        self.clear_before != Some(false) && self.clear_first != Some(false)
    }

    /// Key (or `Mod+Key` combination) to press after input, if any.
    pub fn key_to_press(&self) -> Option<&str> {
        let key = match self.press_key_after.as_deref() {
            Some(key) => key,
            None if self.press_enter => "Enter",
            None => return None,
        };
        let key = key.trim();
        if key.is_empty() || key.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(key)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractParams {
    pub selector: String,
    #[serde(default, alias = "variable")]
    pub save_as: Option<String>,
    #[serde(default = "default_visibility_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotParams {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub full_page: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrollParams {
    #[serde(default)]
    pub direction: ScrollDirection,
    #[serde(default = "default_scroll_amount")]
    pub amount: i64,
    #[serde(default)]
    pub selector: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaitElementParams {
    pub selector: String,
    #[serde(default)]
    pub state: ElementState,
    #[serde(default = "default_navigation_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaitPageLoadParams {
    #[serde(default)]
    pub state: LoadState,
    #[serde(default = "default_navigation_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HttpParams {
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default, alias = "data")]
    pub body: Option<Value>,
    #[serde(default)]
    pub save_as: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShellParams {
    #[serde(alias = "script")]
    pub command: String,
    #[serde(default)]
    pub save_as: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunApplicationParams {
    #[serde(alias = "application")]
    pub path: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilePathParams {
    #[serde(alias = "file")]
    pub path: String,
    #[serde(default)]
    pub save_as: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileWriteParams {
    #[serde(alias = "file")]
    pub path: String,
    #[serde(alias = "text")]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileTransferParams {
    #[serde(alias = "from")]
    pub source: String,
    #[serde(alias = "to")]
    pub destination: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetVariableParams {
    #[serde(alias = "variable")]
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GetVariableParams {
    #[serde(alias = "variable")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaitParams {
    #[serde(default = "default_wait_seconds", alias = "time")]
    pub seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageBoxParams {
    #[serde(default = "default_message_title")]
    pub title: String,
    #[serde(default, alias = "text")]
    pub message: Option<String>,
    #[serde(default = "default_message_kind", rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogParams {
    #[serde(default, alias = "text")]
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowMarkerParams {
    #[serde(default)]
    pub condition: Option<Value>,
    #[serde(default)]
    pub iterations: Option<Value>,
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// A resolved action with its typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    OpenBrowser(OpenBrowserParams),
    Navigate(NavigateParams),
    Click(ClickParams),
    Type(TypeParams),
    Extract(ExtractParams),
    Screenshot(ScreenshotParams),
    Scroll(ScrollParams),
    CloseBrowser,
    WaitElement(WaitElementParams),
    WaitPageLoad(WaitPageLoadParams),
    Http {
        method: HttpMethod,
        params: HttpParams,
    },
    PowerShell(ShellParams),
    Cmd(ShellParams),
    RunApplication(RunApplicationParams),
    FileRead(FilePathParams),
    FileWrite(FileWriteParams),
    FileCopy(FileTransferParams),
    FileMove(FileTransferParams),
    FileDelete(FilePathParams),
    FileExists(FilePathParams),
    SetVariable(SetVariableParams),
    GetVariable(GetVariableParams),
    Wait(WaitParams),
    MessageBox(MessageBoxParams),
    Log {
        severity: Severity,
        params: LogParams,
    },
    IfCondition(FlowMarkerParams),
    ForLoop(FlowMarkerParams),
}

impl Action {
    /// Decode the parameter bag of a step into the payload for `kind`.
    pub fn decode(kind: ActionKind, parameters: &Map<String, Value>) -> Result<Self, ActionError> {
        let action = match kind {
            ActionKind::OpenBrowser => Action::OpenBrowser(payload(kind, parameters)?),
            ActionKind::Navigate => Action::Navigate(payload(kind, parameters)?),
            ActionKind::Click => Action::Click(payload(kind, parameters)?),
            ActionKind::Type => Action::Type(payload(kind, parameters)?),
            ActionKind::Extract => Action::Extract(payload(kind, parameters)?),
            ActionKind::Screenshot => Action::Screenshot(payload(kind, parameters)?),
            ActionKind::Scroll => Action::Scroll(payload(kind, parameters)?),
            ActionKind::CloseBrowser => Action::CloseBrowser,
            ActionKind::WaitElement => Action::WaitElement(payload(kind, parameters)?),
            ActionKind::WaitPageLoad => Action::WaitPageLoad(payload(kind, parameters)?),
            ActionKind::HttpGet => http(HttpMethod::Get, kind, parameters)?,
            ActionKind::HttpPost => http(HttpMethod::Post, kind, parameters)?,
            ActionKind::HttpPut => http(HttpMethod::Put, kind, parameters)?,
            ActionKind::HttpDelete => http(HttpMethod::Delete, kind, parameters)?,
            ActionKind::PowershellRun => Action::PowerShell(payload(kind, parameters)?),
            ActionKind::CmdRun => Action::Cmd(payload(kind, parameters)?),
            ActionKind::RunApplication => Action::RunApplication(payload(kind, parameters)?),
            ActionKind::FileRead => Action::FileRead(payload(kind, parameters)?),
            ActionKind::FileWrite => Action::FileWrite(payload(kind, parameters)?),
            ActionKind::FileCopy => Action::FileCopy(payload(kind, parameters)?),
            ActionKind::FileMove => Action::FileMove(payload(kind, parameters)?),
            ActionKind::FileDelete => Action::FileDelete(payload(kind, parameters)?),
            ActionKind::FileExists => Action::FileExists(payload(kind, parameters)?),
            ActionKind::SetVariable => Action::SetVariable(payload(kind, parameters)?),
            ActionKind::GetVariable => Action::GetVariable(payload(kind, parameters)?),
            ActionKind::Wait => Action::Wait(payload(kind, parameters)?),
            ActionKind::MessageBox => Action::MessageBox(payload(kind, parameters)?),
            ActionKind::LogInfo => log(Severity::Info, kind, parameters)?,
            ActionKind::LogWarning => log(Severity::Warning, kind, parameters)?,
            ActionKind::LogError => log(Severity::Error, kind, parameters)?,
            ActionKind::IfCondition => Action::IfCondition(payload(kind, parameters)?),
            ActionKind::ForLoop => Action::ForLoop(payload(kind, parameters)?),
        };
        Ok(action)
    }
}

fn payload<T: DeserializeOwned>(
    kind: ActionKind,
    parameters: &Map<String, Value>,
) -> Result<T, ActionError> {
    serde_json::from_value(Value::Object(parameters.clone()))
        .map_err(|e| ActionError::invalid(kind.as_str(), e.to_string()))
}

fn http(
    method: HttpMethod,
    kind: ActionKind,
    parameters: &Map<String, Value>,
) -> Result<Action, ActionError> {
    Ok(Action::Http {
        method,
        params: payload(kind, parameters)?,
    })
}

fn log(
    severity: Severity,
    kind: ActionKind,
    parameters: &Map<String, Value>,
) -> Result<Action, ActionError> {
    Ok(Action::Log {
        severity,
        params: payload(kind, parameters)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn aliases_resolve_to_the_same_kind() {
        assert_eq!(ActionKind::resolve("browser_open"), Some(ActionKind::OpenBrowser));
        assert_eq!(ActionKind::resolve("open_browser"), Some(ActionKind::OpenBrowser));
        assert_eq!(ActionKind::resolve("delay"), Some(ActionKind::Wait));
        assert_eq!(ActionKind::resolve("wait_seconds"), Some(ActionKind::Wait));
        assert_eq!(ActionKind::resolve("totally_unknown_action"), None);
    }

    #[test]
    fn canonical_keys_round_trip_through_resolve() {
        let kinds = [
            ActionKind::OpenBrowser,
            ActionKind::WaitPageLoad,
            ActionKind::HttpDelete,
            ActionKind::PowershellRun,
            ActionKind::FileExists,
            ActionKind::LogWarning,
            ActionKind::ForLoop,
        ];
        for kind in kinds {
            assert_eq!(ActionKind::resolve(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn categories() {
        assert_eq!(ActionKind::Click.category(), ActionCategory::Browser);
        assert_eq!(ActionKind::HttpPut.category(), ActionCategory::Http);
        assert_eq!(ActionKind::CmdRun.category(), ActionCategory::Process);
        assert_eq!(ActionKind::FileMove.category(), ActionCategory::File);
        assert_eq!(ActionKind::Wait.category(), ActionCategory::Timing);
        assert_eq!(ActionKind::IfCondition.category(), ActionCategory::Flow);
    }

    #[test]
    fn open_browser_defaults() {
        let action = Action::decode(ActionKind::OpenBrowser, &Map::new()).unwrap();
        assert_eq!(action, Action::OpenBrowser(OpenBrowserParams::default()));
    }

    #[test]
    fn click_defaults_and_overrides() {
        let Action::Click(click) =
            Action::decode(ActionKind::Click, &params(json!({"selector": "#go"}))).unwrap()
        else {
            panic!("expected click");
        };
        assert_eq!(click.button, MouseButton::Left);
        assert_eq!(click.click_count, 1);
        assert_eq!(click.timeout, 10_000);

        let Action::Click(click) = Action::decode(
            ActionKind::Click,
            &params(json!({"selector": "#go", "button": "right", "clickCount": 2, "delay": 20})),
        )
        .unwrap() else {
            panic!("expected click");
        };
        assert_eq!(click.button, MouseButton::Right);
        assert_eq!(click.click_count, 2);
        assert_eq!(click.delay, 20);
    }

    #[test]
    fn missing_required_parameter_is_an_action_error() {
        let err = Action::decode(ActionKind::Click, &Map::new()).unwrap_err();
        assert!(matches!(err, ActionError::InvalidParameters { ref action, .. } if action == "click"));
        assert!(err.to_string().contains("selector"));
    }

    #[test]
    fn type_params_aliases_and_key_resolution() {
        let Action::Type(p) = Action::decode(
            ActionKind::Type,
            &params(json!({"selector": "#q", "value": "rust", "typeDelay": 5, "pressEnter": true})),
        )
        .unwrap() else {
            panic!("expected type");
        };
        assert_eq!(p.text, "rust");
        assert_eq!(p.delay, 5);
        assert!(p.should_clear());
        assert_eq!(p.key_to_press(), Some("Enter"));

        let Action::Type(p) = Action::decode(
            ActionKind::Type,
            &params(json!({"selector": "#q", "text": "x", "clearFirst": false, "pressKeyAfter": "none"})),
        )
        .unwrap() else {
            panic!("expected type");
        };
        assert!(!p.should_clear());
        assert_eq!(p.key_to_press(), None);
        assert_eq!(p.input_method, InputMethod::Type);
    }

    #[test]
    fn press_key_after_takes_precedence_over_press_enter() {
        let Action::Type(p) = Action::decode(
            ActionKind::Type,
            &params(json!({"selector": "#q", "text": "x", "pressEnter": true, "pressKeyAfter": "Ctrl+A"})),
        )
        .unwrap() else {
            panic!("expected type");
        };
        assert_eq!(p.key_to_press(), Some("Ctrl+A"));
    }

    #[test]
    fn http_payload_accepts_data_alias() {
        let action = Action::decode(
            ActionKind::HttpPost,
            &params(json!({"url": "http://x", "data": {"a": 1}, "saveAs": "resp"})),
        )
        .unwrap();
        let Action::Http { method, params } = action else {
            panic!("expected http");
        };
        assert_eq!(method, HttpMethod::Post);
        assert!(method.has_body());
        assert_eq!(params.body, Some(json!({"a": 1})));
        assert_eq!(params.save_as.as_deref(), Some("resp"));
    }

    #[test]
    fn file_and_variable_aliases() {
        let Action::FileCopy(p) = Action::decode(
            ActionKind::FileCopy,
            &params(json!({"from": "a.txt", "to": "b.txt"})),
        )
        .unwrap() else {
            panic!("expected copy");
        };
        assert_eq!(p.source, "a.txt");
        assert_eq!(p.destination, "b.txt");

        let Action::SetVariable(p) = Action::decode(
            ActionKind::SetVariable,
            &params(json!({"variable": "n", "value": [1, 2]})),
        )
        .unwrap() else {
            panic!("expected set_variable");
        };
        assert_eq!(p.name, "n");
        assert_eq!(p.value, json!([1, 2]));
    }

    #[test]
    fn wait_accepts_time_alias_and_defaults_to_one_second() {
        let Action::Wait(p) = Action::decode(ActionKind::Wait, &Map::new()).unwrap() else {
            panic!("expected wait");
        };
        assert_eq!(p.seconds, 1.0);
        let Action::Wait(p) =
            Action::decode(ActionKind::Wait, &params(json!({"time": 0.5}))).unwrap()
        else {
            panic!("expected wait");
        };
        assert_eq!(p.seconds, 0.5);
    }

    #[test]
    fn log_actions_carry_severity() {
        let action =
            Action::decode(ActionKind::LogWarning, &params(json!({"text": "careful"}))).unwrap();
        assert_eq!(
            action,
            Action::Log {
                severity: Severity::Warning,
                params: LogParams {
                    message: "careful".to_string()
                }
            }
        );
    }

    #[test]
    fn unrelated_parameters_are_ignored() {
        let action = Action::decode(
            ActionKind::Navigate,
            &params(json!({"url": "https://example.com", "continueOnError": true, "note": "x"})),
        )
        .unwrap();
        assert!(matches!(action, Action::Navigate(NavigateParams { timeout: 30_000, .. })));
    }
}
