//! Engine configuration types.
//!
//! `EngineConfig` represents the `config.toml` that tunes the executor, the
//! WebDriver binding, the HTTP client, and the process runner.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::action::BrowserEngine;

/// Top-level configuration for rpaflow.
///
/// Loaded from `{config_dir}/config.toml`. All fields have sensible defaults,
/// so an empty or partial file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: ExecutorSettings,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub process: ProcessSettings,
}

/// Run loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutorSettings {
    /// Capacity of the broadcast event bus.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// How long a message box waits for acknowledgement.
    #[serde(default = "default_message_box_timeout_secs")]
    pub message_box_timeout_secs: u64,
}

fn default_event_capacity() -> usize {
    1024
}

fn default_message_box_timeout_secs() -> u64 {
    300
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
            message_box_timeout_secs: default_message_box_timeout_secs(),
        }
    }
}

impl ExecutorSettings {
    pub fn message_box_timeout(&self) -> Duration {
        Duration::from_secs(self.message_box_timeout_secs)
    }
}

/// WebDriver endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserSettings {
    /// Default WebDriver server URL.
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    /// Per-engine overrides, keyed by `chrome`, `edge`, or `firefox`.
    #[serde(default)]
    pub drivers: HashMap<String, String>,
    /// Interval between element polls during waits.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Upper bound on any single WebDriver request.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_command_timeout_secs() -> u64 {
    60
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            drivers: HashMap::new(),
            poll_interval_ms: default_poll_interval_ms(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

impl BrowserSettings {
    /// WebDriver URL for an engine: its override if set, else the default.
    pub fn driver_url(&self, engine: BrowserEngine) -> &str {
        self.drivers
            .get(engine.as_str())
            .map(String::as_str)
            .unwrap_or(self.webdriver_url.as_str())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpSettings {
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("rpaflow/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessSettings {
    /// Executable used for `powershell_run`.
    #[serde(default = "default_powershell")]
    pub powershell: String,
    /// Shell used for `cmd_run`. Empty means the platform default.
    #[serde(default)]
    pub shell: String,
}

fn default_powershell() -> String {
    if cfg!(windows) {
        "powershell".to_string()
    } else {
        "pwsh".to_string()
    }
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            powershell: default_powershell(),
            shell: String::new(),
        }
    }
}
