//! Capability ports consumed by action handlers.
//!
//! Each side-effect category is a trait object injected into the execution
//! session, so handlers never touch a concrete browser, HTTP stack, process
//! API, or filesystem. Concrete bindings live in rpaflow-infra; tests use the
//! in-memory doubles from `crate::testing`.
//!
//! The traits return boxed futures so they stay object-safe behind `Arc<dyn _>`.

pub mod browser;
pub mod filesystem;
pub mod http;
pub mod process;

use std::sync::Arc;

pub use browser::{BrowserDriver, BrowserPage, ClickOptions};
pub use filesystem::FileSystem;
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use process::{ProcessOutput, ProcessRunner, Shell};

/// The set of capabilities an execution session may use.
#[derive(Clone)]
pub struct Capabilities {
    pub browser: Arc<dyn BrowserDriver>,
    pub http: Arc<dyn HttpClient>,
    pub process: Arc<dyn ProcessRunner>,
    pub fs: Arc<dyn FileSystem>,
}

impl Capabilities {
    pub fn new(
        browser: Arc<dyn BrowserDriver>,
        http: Arc<dyn HttpClient>,
        process: Arc<dyn ProcessRunner>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            browser,
            http,
            process,
            fs,
        }
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}
