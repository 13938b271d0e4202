//! Browser action handlers.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use rpaflow_types::action::{
    ActionKind, ClickParams, ElementState, ExtractParams, InputMethod, NavigateParams,
    OpenBrowserParams, ScreenshotParams, ScrollDirection, ScrollParams, TypeParams,
    WaitElementParams, WaitPageLoadParams,
};
use rpaflow_types::error::ActionError;
use serde_json::{Value, json};

use super::{ActionContext, INPUT_VISIBILITY_TIMEOUT_MS, TYPED_PREVIEW_CHARS, preview, require};
use crate::capability::{BrowserPage, ClickOptions};

pub(super) async fn open_browser(
    ctx: &ActionContext<'_>,
    params: OpenBrowserParams,
) -> Result<Value, ActionError> {
    ctx.info(format!("Opening browser: {}", params.browser.as_str()));
    let browser_id = ctx.session.open_browser(&params).await?;
    Ok(json!({ "browserId": browser_id }))
}

pub(super) async fn navigate(
    ctx: &ActionContext<'_>,
    params: NavigateParams,
) -> Result<Value, ActionError> {
    let page = ctx.session.page().await?;
    require(ActionKind::Navigate, "url", &params.url)?;

    ctx.info(format!("Navigating to: {}", params.url));
    page.goto(&params.url, params.wait_until, ms(params.timeout))
        .await?;
    Ok(json!({ "url": params.url }))
}

pub(super) async fn click(ctx: &ActionContext<'_>, params: ClickParams) -> Result<Value, ActionError> {
    let page = ctx.session.page().await?;
    require(ActionKind::Click, "selector", &params.selector)?;

    ctx.info(format!("Clicking: {}", params.selector));
    page.wait_for_selector(&params.selector, ElementState::Visible, ms(params.timeout))
        .await?;
    let options = ClickOptions {
        button: params.button,
        click_count: params.click_count,
        delay: ms(params.delay),
    };
    page.click(&params.selector, options).await?;
    Ok(json!({ "clicked": params.selector }))
}

pub(super) async fn type_text(
    ctx: &ActionContext<'_>,
    params: TypeParams,
) -> Result<Value, ActionError> {
    let page = ctx.session.page().await?;
    require(ActionKind::Type, "selector", &params.selector)?;
    if params.text.is_empty() {
        return Err(ActionError::invalid(
            ActionKind::Type.as_str(),
            "`text` must not be empty",
        ));
    }

    ctx.info(format!("Typing into: {}", params.selector));
    page.wait_for_selector(
        &params.selector,
        ElementState::Visible,
        ms(INPUT_VISIBILITY_TIMEOUT_MS),
    )
    .await?;

    if params.should_clear() {
        page.fill(&params.selector, "").await?;
    }

    match params.input_method {
        InputMethod::Fill | InputMethod::Paste => page.fill(&params.selector, &params.text).await?,
        InputMethod::Type => {
            page.type_text(&params.selector, &params.text, ms(params.delay))
                .await?
        }
    }

    if let Some(key) = params.key_to_press() {
        ctx.info(format!("Pressing key: {key}"));
        press_key_combo(page.as_ref(), key).await?;
    }

    Ok(json!({ "typed": preview(&params.text, TYPED_PREVIEW_CHARS) }))
}

/// Press `combo`, which is either a single key or `Mod+Mod+Key`.
///
/// Modifiers go down in order, the key is pressed, then modifiers are
/// released in reverse order. Modifiers are released even if the key press
/// fails.
pub(crate) async fn press_key_combo(page: &dyn BrowserPage, combo: &str) -> Result<(), ActionError> {
    let parts: Vec<&str> = combo.split('+').map(str::trim).collect();
    let Some((key, modifiers)) = parts.split_last() else {
        return Ok(());
    };
    if modifiers.is_empty() {
        return page.keyboard_press(key).await;
    }

    let mut held = Vec::with_capacity(modifiers.len());
    let mut outcome = Ok(());
    for modifier in modifiers {
        if let Err(e) = page.keyboard_down(modifier).await {
            outcome = Err(e);
            break;
        }
        held.push(*modifier);
    }
    if outcome.is_ok() {
        outcome = page.keyboard_press(key).await;
    }
    for modifier in held.iter().rev() {
        let released = page.keyboard_up(modifier).await;
        if outcome.is_ok() {
            outcome = released;
        }
    }
    outcome
}

pub(super) async fn extract(
    ctx: &ActionContext<'_>,
    params: ExtractParams,
) -> Result<Value, ActionError> {
    let page = ctx.session.page().await?;
    require(ActionKind::Extract, "selector", &params.selector)?;

    ctx.info(format!("Extracting text from: {}", params.selector));
    page.wait_for_selector(&params.selector, ElementState::Visible, ms(params.timeout))
        .await?;
    let text = page.text_content(&params.selector).await?;
    let text = text.map(Value::String).unwrap_or(Value::Null);

    if let Some(name) = params.save_as.as_deref().filter(|n| !n.is_empty()) {
        ctx.session.set_variable(name, text.clone());
    }
    Ok(json!({ "text": text }))
}

pub(super) async fn screenshot(
    ctx: &ActionContext<'_>,
    params: ScreenshotParams,
) -> Result<Value, ActionError> {
    let page = ctx.session.page().await?;
    let path = params
        .path
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| format!("screenshot_{}.png", Utc::now().timestamp_millis()));

    ctx.info(format!("Taking screenshot: {path}"));
    page.screenshot_to_file(Path::new(&path), params.full_page)
        .await?;
    Ok(json!({ "path": path }))
}

pub(super) async fn scroll(ctx: &ActionContext<'_>, params: ScrollParams) -> Result<Value, ActionError> {
    let page = ctx.session.page().await?;

    match params.selector.as_deref().filter(|s| !s.is_empty()) {
        Some(selector) => {
            ctx.info(format!("Scrolling into view: {selector}"));
            page.scroll_into_view(selector).await?;
        }
        None => {
            let dy = match params.direction {
                ScrollDirection::Up => -params.amount,
                ScrollDirection::Down => params.amount,
            };
            ctx.info(format!("Scrolling by {dy}px"));
            page.scroll_by(dy).await?;
        }
    }
    Ok(json!({ "scrolled": params.amount }))
}

pub(super) async fn close_browser(ctx: &ActionContext<'_>) -> Result<Value, ActionError> {
    if ctx.session.has_browser().await {
        ctx.info("Closing browser");
        ctx.session.close_browser().await?;
    }
    Ok(json!({ "closed": true }))
}

pub(super) async fn wait_element(
    ctx: &ActionContext<'_>,
    params: WaitElementParams,
) -> Result<Value, ActionError> {
    let page = ctx.session.page().await?;
    require(ActionKind::WaitElement, "selector", &params.selector)?;

    ctx.info(format!("Waiting for element: {}", params.selector));
    page.wait_for_selector(&params.selector, params.state, ms(params.timeout))
        .await?;
    Ok(json!({ "found": params.selector }))
}

pub(super) async fn wait_page_load(
    ctx: &ActionContext<'_>,
    params: WaitPageLoadParams,
) -> Result<Value, ActionError> {
    let page = ctx.session.page().await?;

    ctx.info("Waiting for page load");
    page.wait_for_load_state(params.state, ms(params.timeout))
        .await?;
    Ok(json!({ "loaded": true }))
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StepFixture;
    use rpaflow_types::action::MouseButton;
    use rpaflow_types::error::ResourceError;

    async fn opened() -> StepFixture {
        let fixture = StepFixture::new();
        open_browser(&fixture.ctx(), OpenBrowserParams::default())
            .await
            .unwrap();
        fixture
    }

    #[tokio::test]
    async fn actions_fail_without_an_open_browser() {
        let fixture = StepFixture::new();
        let err = navigate(
            &fixture.ctx(),
            NavigateParams {
                url: "https://example.com".to_string(),
                wait_until: Default::default(),
                timeout: 30_000,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ActionError::Resource(ResourceError::BrowserNotOpen)));
    }

    #[tokio::test]
    async fn open_browser_returns_the_browser_id() {
        let fixture = StepFixture::new();
        let result = open_browser(&fixture.ctx(), OpenBrowserParams::default())
            .await
            .unwrap();
        assert!(result["browserId"].as_str().is_some_and(|id| !id.is_empty()));
        assert_eq!(fixture.harness.browser.launches(), 1);
    }

    #[tokio::test]
    async fn click_waits_for_visibility_first() {
        let fixture = opened().await;
        let result = click(
            &fixture.ctx(),
            ClickParams {
                selector: "#submit".to_string(),
                button: MouseButton::Right,
                click_count: 2,
                delay: 0,
                timeout: 10_000,
            },
        )
        .await
        .unwrap();
        assert_eq!(result, json!({"clicked": "#submit"}));
        assert_eq!(
            fixture.harness.browser.calls(),
            vec![
                "wait:#submit:Visible".to_string(),
                "click:#submit:Right:2".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn missing_element_times_out() {
        let fixture = opened().await;
        fixture.harness.browser.hide("#ghost");
        let err = click(
            &fixture.ctx(),
            ClickParams {
                selector: "#ghost".to_string(),
                button: MouseButton::Left,
                click_count: 1,
                delay: 0,
                timeout: 10_000,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ActionError::Timeout { timeout_ms: 10_000, .. }));
    }

    fn type_params(text: &str) -> TypeParams {
        TypeParams {
            selector: "#q".to_string(),
            text: text.to_string(),
            clear_before: None,
            clear_first: None,
            input_method: InputMethod::Type,
            delay: 0,
            press_key_after: None,
            press_enter: false,
        }
    }

    #[tokio::test]
    async fn type_clears_types_and_truncates_the_echo() {
        let fixture = opened().await;
        let text = "x".repeat(60);
        let result = type_text(&fixture.ctx(), type_params(&text)).await.unwrap();
        assert_eq!(result["typed"], format!("{}...", "x".repeat(50)));
        assert_eq!(
            fixture.harness.browser.calls(),
            vec![
                "wait:#q:Visible".to_string(),
                "fill:#q:".to_string(),
                format!("type:#q:{text}"),
            ]
        );
    }

    #[tokio::test]
    async fn type_with_fill_and_no_clear() {
        let fixture = opened().await;
        let mut params = type_params("hello");
        params.clear_first = Some(false);
        params.input_method = InputMethod::Paste;
        type_text(&fixture.ctx(), params).await.unwrap();
        assert_eq!(
            fixture.harness.browser.calls(),
            vec!["wait:#q:Visible".to_string(), "fill:#q:hello".to_string()]
        );
    }

    #[tokio::test]
    async fn type_presses_combo_modifiers_in_order() {
        let fixture = opened().await;
        let mut params = type_params("hello");
        params.clear_before = Some(false);
        params.press_key_after = Some("Ctrl+Shift+Tab".to_string());
        type_text(&fixture.ctx(), params).await.unwrap();

        let keys: Vec<String> = fixture
            .harness
            .browser
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("key"))
            .collect();
        assert_eq!(
            keys,
            vec![
                "keydown:Ctrl",
                "keydown:Shift",
                "keypress:Tab",
                "keyup:Shift",
                "keyup:Ctrl"
            ]
        );
    }

    #[tokio::test]
    async fn type_rejects_empty_text() {
        let fixture = opened().await;
        let err = type_text(&fixture.ctx(), type_params("")).await.unwrap_err();
        assert!(matches!(err, ActionError::InvalidParameters { .. }));
    }

    #[tokio::test]
    async fn extract_saves_text_into_a_variable() {
        let fixture = opened().await;
        fixture.harness.browser.set_text("h1", "Welcome");
        let result = extract(
            &fixture.ctx(),
            ExtractParams {
                selector: "h1".to_string(),
                save_as: Some("title".to_string()),
                timeout: 10_000,
            },
        )
        .await
        .unwrap();
        assert_eq!(result, json!({"text": "Welcome"}));
        assert_eq!(fixture.session.get_variable("title"), Some(json!("Welcome")));
    }

    #[tokio::test]
    async fn screenshot_defaults_to_a_timestamped_png() {
        let fixture = opened().await;
        let result = screenshot(&fixture.ctx(), ScreenshotParams::default())
            .await
            .unwrap();
        let path = result["path"].as_str().unwrap();
        assert!(path.starts_with("screenshot_"));
        assert!(path.ends_with(".png"));
    }

    #[tokio::test]
    async fn scroll_up_uses_a_negative_offset() {
        let fixture = opened().await;
        let result = scroll(
            &fixture.ctx(),
            ScrollParams {
                direction: ScrollDirection::Up,
                amount: 120,
                selector: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(result, json!({"scrolled": 120}));
        assert_eq!(fixture.harness.browser.calls(), vec!["scroll:-120".to_string()]);
    }

    #[tokio::test]
    async fn close_browser_is_idempotent() {
        let fixture = opened().await;
        assert_eq!(close_browser(&fixture.ctx()).await.unwrap(), json!({"closed": true}));
        assert_eq!(close_browser(&fixture.ctx()).await.unwrap(), json!({"closed": true}));
        assert_eq!(fixture.harness.browser.closed().len(), 1);
    }

    #[tokio::test]
    async fn wait_element_honours_the_requested_state() {
        let fixture = opened().await;
        let result = wait_element(
            &fixture.ctx(),
            WaitElementParams {
                selector: ".spinner".to_string(),
                state: ElementState::Hidden,
                timeout: 5_000,
            },
        )
        .await
        .unwrap();
        assert_eq!(result, json!({"found": ".spinner"}));
        assert_eq!(
            fixture.harness.browser.calls(),
            vec!["wait:.spinner:Hidden".to_string()]
        );
    }
}
