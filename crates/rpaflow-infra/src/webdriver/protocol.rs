//! W3C WebDriver wire details: session capabilities, key codes, element
//! references, and error payloads.

use rpaflow_types::action::{BrowserEngine, OpenBrowserParams};
use serde_json::{Value, json};

/// JSON key under which WebDriver returns element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Error code returned when a selector matches nothing.
pub const NO_SUCH_ELEMENT: &str = "no such element";

/// Error code returned when a driver-side timeout (such as `pageLoad`) expires.
pub const TIMEOUT: &str = "timeout";

/// Body of `POST /session` for the requested engine and window options.
pub fn new_session_body(options: &OpenBrowserParams) -> Value {
    let mut args: Vec<String> = Vec::new();
    match options.browser {
        BrowserEngine::Chrome | BrowserEngine::Edge => {
            if options.headless {
                args.push("--headless=new".to_string());
            }
            if options.maximized && !options.headless {
                args.push("--start-maximized".to_string());
            } else {
                args.push(format!("--window-size={},{}", options.width, options.height));
            }
        }
        BrowserEngine::Firefox => {
            if options.headless {
                args.push("-headless".to_string());
            }
        }
    }

    let always_match = match options.browser {
        BrowserEngine::Chrome => json!({
            "browserName": "chrome",
            "goog:chromeOptions": { "args": args },
        }),
        BrowserEngine::Edge => json!({
            "browserName": "MicrosoftEdge",
            "ms:edgeOptions": { "args": args },
        }),
        BrowserEngine::Firefox => json!({
            "browserName": "firefox",
            "moz:firefoxOptions": { "args": args },
        }),
    };
    json!({ "capabilities": { "alwaysMatch": always_match } })
}

/// Map a key name to the character WebDriver expects.
///
/// Names are matched case-insensitively; a single character maps to itself.
pub fn key_code(key: &str) -> Option<String> {
    let mut chars = key.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(c.to_string());
    }

    let code = match key.to_ascii_lowercase().as_str() {
        "backspace" => '\u{E003}',
        "tab" => '\u{E004}',
        "enter" | "return" => '\u{E007}',
        "shift" => '\u{E008}',
        "control" | "ctrl" => '\u{E009}',
        "alt" | "option" => '\u{E00A}',
        "pause" => '\u{E00B}',
        "escape" | "esc" => '\u{E00C}',
        "space" => ' ',
        "pageup" => '\u{E00E}',
        "pagedown" => '\u{E00F}',
        "end" => '\u{E010}',
        "home" => '\u{E011}',
        "arrowleft" | "left" => '\u{E012}',
        "arrowup" | "up" => '\u{E013}',
        "arrowright" | "right" => '\u{E014}',
        "arrowdown" | "down" => '\u{E015}',
        "insert" => '\u{E016}',
        "delete" | "del" => '\u{E017}',
        "meta" | "cmd" | "command" | "win" => '\u{E03D}',
        lower => {
            let n: u32 = lower.strip_prefix('f')?.parse().ok()?;
            if !(1..=12).contains(&n) {
                return None;
            }
            char::from_u32(0xE031 + n - 1)?
        }
    };
    Some(code.to_string())
}

/// Element id from a `find element` result.
pub fn element_id(value: &Value) -> Option<String> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// JSON argument referencing an element in `execute/sync` scripts.
pub fn element_ref(id: &str) -> Value {
    json!({ ELEMENT_KEY: id })
}

/// Error carried in a WebDriver response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireError {
    pub error: String,
    pub message: String,
}

impl WireError {
    /// Extract the error from a response body's `value`, if it holds one.
    pub fn from_value(value: &Value) -> Option<Self> {
        let error = value.get("error")?.as_str()?.to_string();
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Some(Self { error, message })
    }

    pub fn is_no_such_element(&self) -> bool {
        self.error == NO_SUCH_ELEMENT
    }

    pub fn is_timeout(&self) -> bool {
        self.error == TIMEOUT
    }
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            f.write_str(&self.error)
        } else {
            write!(f, "{}: {}", self.error, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chrome_headless_session_uses_window_size() {
        let body = new_session_body(&OpenBrowserParams {
            headless: true,
            ..OpenBrowserParams::default()
        });
        let caps = &body["capabilities"]["alwaysMatch"];
        assert_eq!(caps["browserName"], "chrome");
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.contains(&json!("--headless=new")));
        assert!(args.iter().any(|a| a.as_str().unwrap().starts_with("--window-size=")));
    }

    #[test]
    fn edge_and_firefox_use_their_vendor_options() {
        let edge = new_session_body(&OpenBrowserParams {
            browser: BrowserEngine::Edge,
            ..OpenBrowserParams::default()
        });
        let caps = &edge["capabilities"]["alwaysMatch"];
        assert_eq!(caps["browserName"], "MicrosoftEdge");
        assert_eq!(caps["ms:edgeOptions"]["args"], json!(["--start-maximized"]));

        let firefox = new_session_body(&OpenBrowserParams {
            browser: BrowserEngine::Firefox,
            headless: true,
            ..OpenBrowserParams::default()
        });
        assert_eq!(
            firefox["capabilities"]["alwaysMatch"]["moz:firefoxOptions"]["args"],
            json!(["-headless"])
        );
    }

    #[test]
    fn key_names_map_to_webdriver_codes() {
        assert_eq!(key_code("Enter").as_deref(), Some("\u{E007}"));
        assert_eq!(key_code("ctrl").as_deref(), Some("\u{E009}"));
        assert_eq!(key_code("Control").as_deref(), Some("\u{E009}"));
        assert_eq!(key_code("F1").as_deref(), Some("\u{E031}"));
        assert_eq!(key_code("F12").as_deref(), Some("\u{E03C}"));
        assert_eq!(key_code("a").as_deref(), Some("a"));
        assert_eq!(key_code("F13"), None);
        assert_eq!(key_code("Hyper"), None);
    }

    #[test]
    fn element_references_round_trip() {
        let value = element_ref("abc-123");
        assert_eq!(element_id(&value).as_deref(), Some("abc-123"));
        assert_eq!(element_id(&json!({"other": 1})), None);
    }

    #[test]
    fn wire_errors_are_detected() {
        let value = json!({"error": "no such element", "message": "Unable to locate", "stacktrace": ""});
        let err = WireError::from_value(&value).unwrap();
        assert!(err.is_no_such_element());
        assert!(!err.is_timeout());
        assert_eq!(err.to_string(), "no such element: Unable to locate");
        let page_load = WireError::from_value(&json!({"error": "timeout", "message": "page load"})).unwrap();
        assert!(page_load.is_timeout());
        assert!(WireError::from_value(&json!(null)).is_none());
        assert!(WireError::from_value(&json!({"sessionId": "x"})).is_none());
    }
}
