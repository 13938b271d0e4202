//! Browser automation port.
//!
//! `BrowserDriver` launches a browser and hands back a single `BrowserPage`.
//! Method names follow the Playwright page vocabulary; every call is bounded
//! by the timeout the caller passes and reports expiry as
//! [`ActionError::Timeout`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use rpaflow_types::action::{ElementState, LoadState, MouseButton, OpenBrowserParams};
use rpaflow_types::error::ActionError;

pub type BrowserResult<T> = Result<T, ActionError>;

/// Mouse click details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickOptions {
    pub button: MouseButton,
    pub click_count: u32,
    /// Time between mouse down and mouse up.
    pub delay: Duration,
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self {
            button: MouseButton::Left,
            click_count: 1,
            delay: Duration::ZERO,
        }
    }
}

/// Launches browsers.
pub trait BrowserDriver: Send + Sync {
    /// Start a browser with the given options and open one page in it.
    fn launch<'a>(
        &'a self,
        options: &'a OpenBrowserParams,
    ) -> BoxFuture<'a, BrowserResult<Arc<dyn BrowserPage>>>;
}

/// A live page inside a launched browser. Closing the page closes the browser.
pub trait BrowserPage: Send + Sync {
    /// Driver-assigned identifier of the underlying browser.
    fn id(&self) -> &str;

    fn goto<'a>(
        &'a self,
        url: &'a str,
        wait_until: LoadState,
        timeout: Duration,
    ) -> BoxFuture<'a, BrowserResult<()>>;

    /// Resolve once the element matching `selector` reaches `state`.
    fn wait_for_selector<'a>(
        &'a self,
        selector: &'a str,
        state: ElementState,
        timeout: Duration,
    ) -> BoxFuture<'a, BrowserResult<()>>;

    fn click<'a>(
        &'a self,
        selector: &'a str,
        options: ClickOptions,
    ) -> BoxFuture<'a, BrowserResult<()>>;

    /// Replace the value of an input at once.
    fn fill<'a>(&'a self, selector: &'a str, text: &'a str) -> BoxFuture<'a, BrowserResult<()>>;

    /// Send `text` keystroke by keystroke, pausing `delay` between keys.
    fn type_text<'a>(
        &'a self,
        selector: &'a str,
        text: &'a str,
        delay: Duration,
    ) -> BoxFuture<'a, BrowserResult<()>>;

    fn keyboard_down<'a>(&'a self, key: &'a str) -> BoxFuture<'a, BrowserResult<()>>;

    fn keyboard_up<'a>(&'a self, key: &'a str) -> BoxFuture<'a, BrowserResult<()>>;

    fn keyboard_press<'a>(&'a self, key: &'a str) -> BoxFuture<'a, BrowserResult<()>>;

    /// Text content of the first element matching `selector`.
    fn text_content<'a>(&'a self, selector: &'a str) -> BoxFuture<'a, BrowserResult<Option<String>>>;

    fn screenshot_to_file<'a>(
        &'a self,
        path: &'a Path,
        full_page: bool,
    ) -> BoxFuture<'a, BrowserResult<()>>;

    /// Scroll the window vertically by `dy` pixels (negative scrolls up).
    fn scroll_by(&self, dy: i64) -> BoxFuture<'_, BrowserResult<()>>;

    fn scroll_into_view<'a>(&'a self, selector: &'a str) -> BoxFuture<'a, BrowserResult<()>>;

    fn wait_for_load_state(
        &self,
        state: LoadState,
        timeout: Duration,
    ) -> BoxFuture<'_, BrowserResult<()>>;

    /// Close the page and its browser.
    fn close(&self) -> BoxFuture<'_, BrowserResult<()>>;
}
