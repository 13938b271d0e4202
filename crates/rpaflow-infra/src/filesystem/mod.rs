//! Local filesystem binding.
//!
//! Implements the `FileSystem` capability from `rpaflow-core` with `tokio::fs`,
//! and resolves the configuration directory.

use std::io;
use std::path::{Path, PathBuf};

use futures_util::future::{BoxFuture, FutureExt};
use rpaflow_core::capability::FileSystem;

/// Local filesystem implementation of the `FileSystem` capability.
///
/// All operations go through `tokio::fs` for async I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFileSystem {
    fn read_to_string<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<String>> {
        tokio::fs::read_to_string(path).boxed()
    }

    fn write<'a>(&'a self, path: &'a Path, content: &'a str) -> BoxFuture<'a, io::Result<()>> {
        async move {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, content).await
        }
        .boxed()
    }

    fn copy<'a>(&'a self, from: &'a Path, to: &'a Path) -> BoxFuture<'a, io::Result<()>> {
        async move {
            tokio::fs::copy(from, to).await?;
            Ok(())
        }
        .boxed()
    }

    fn rename<'a>(&'a self, from: &'a Path, to: &'a Path) -> BoxFuture<'a, io::Result<()>> {
        tokio::fs::rename(from, to).boxed()
    }

    fn remove_file<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<()>> {
        tokio::fs::remove_file(path).boxed()
    }

    fn exists<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, bool> {
        async move { tokio::fs::try_exists(path).await.unwrap_or(false) }.boxed()
    }
}

/// Resolve the configuration directory.
///
/// Priority:
/// 1. `RPAFLOW_HOME` environment variable
/// 2. Platform config directory (e.g. `~/.config/rpaflow` on Linux)
/// 3. `.rpaflow` in the current directory
pub fn resolve_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RPAFLOW_HOME") {
        return PathBuf::from(dir);
    }

    if let Some(config) = dirs::config_dir() {
        return config.join("rpaflow");
    }

    PathBuf::from(".rpaflow")
}
