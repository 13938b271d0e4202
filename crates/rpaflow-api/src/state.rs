//! Application state shared by the CLI commands and the HTTP server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use rpaflow_core::Engine;
use rpaflow_infra::config::load_config;
use rpaflow_infra::filesystem::resolve_config_dir;
use rpaflow_infra::local_capabilities;

/// Shared application state holding the engine.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub config_dir: PathBuf,
}

impl AppState {
    /// Load `config.toml` and wire the engine to the local capability bindings.
    pub async fn init() -> anyhow::Result<Self> {
        let config_dir = resolve_config_dir();
        let config = load_config(&config_dir).await;
        tracing::debug!(config_dir = %config_dir.display(), "configuration loaded");

        let capabilities =
            local_capabilities(&config).context("failed to set up capability bindings")?;
        let engine = Arc::new(Engine::new(capabilities, config.engine));

        Ok(Self { engine, config_dir })
    }
}
