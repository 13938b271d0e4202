//! Infrastructure layer for rpaflow.
//!
//! Contains implementations of the capability traits defined in `rpaflow-core`:
//! a W3C WebDriver browser binding, a reqwest HTTP client, a `tokio::process`
//! runner, and the local filesystem. Also loads `config.toml`.

pub mod config;
pub mod filesystem;
pub mod http;
pub mod process;
pub mod webdriver;

use std::sync::Arc;

use rpaflow_core::capability::Capabilities;
use rpaflow_types::config::EngineConfig;
use rpaflow_types::error::ActionError;

/// Capabilities backed by the local machine, configured from `config`.
pub fn local_capabilities(config: &EngineConfig) -> Result<Capabilities, ActionError> {
    Ok(Capabilities::new(
        Arc::new(webdriver::WebDriverBrowser::new(config.browser.clone())?),
        Arc::new(http::ReqwestHttpClient::new(&config.http)?),
        Arc::new(process::TokioProcessRunner::new(config.process.clone())),
        Arc::new(filesystem::LocalFileSystem::new()),
    ))
}
