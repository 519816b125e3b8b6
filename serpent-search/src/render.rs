//! Rendered-mode fetching through a headless Chromium session.
//!
//! A render is described as a sequence of [`RenderAction`]s (navigate,
//! humanised pauses and scrolling, wait for a result selector, snapshot)
//! executed against a fresh browser. Every render carries its own deadline,
//! derived by the caller from the overall request bound.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::EngineConfig;
use crate::error::SearchError;
use crate::http::jitter;

/// One step of a render session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderAction {
    /// Load the request URL.
    Navigate,
    /// Idle for a fixed duration.
    Pause(Duration),
    /// Scroll the viewport down by this many pixels.
    Scroll(u32),
    /// Poll until any selector matches, giving up after `timeout`.
    /// Giving up is not an error; the snapshot is still taken so bot-check
    /// pages can be recognised downstream.
    WaitForAny {
        selectors: Vec<String>,
        timeout: Duration,
    },
    /// Capture the rendered document.
    Snapshot,
}

/// One rendered page fetch.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Absolute URL to load.
    pub url: String,
    /// Request headers; `User-Agent` is applied as the browser identity.
    pub headers: Vec<(String, String)>,
    /// Optional proxy URL (already validated).
    pub proxy: Option<String>,
    /// Steps to run after the page is opened.
    pub actions: Vec<RenderAction>,
    /// Hard deadline for the whole session.
    pub deadline: Instant,
}

/// Produces a DOM snapshot of a script-rendered page.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Run `request.actions` and return the rendered HTML.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Render`] if the browser fails and
    /// [`SearchError::Timeout`] if `request.deadline` passes first.
    async fn render(&self, request: &RenderRequest) -> Result<String, SearchError>;
}

/// Build the humanised action sequence used by every provider:
/// navigate → pause → scroll → pause → wait for results → snapshot.
pub fn humanised_plan(config: &EngineConfig, wait_selectors: &[&str]) -> Vec<RenderAction> {
    let (min_px, max_px) = config.render_scroll_px;
    let scroll = if max_px > min_px {
        rand::thread_rng().gen_range(min_px..=max_px)
    } else {
        min_px
    };

    vec![
        RenderAction::Navigate,
        RenderAction::Pause(jitter(config.render_settle_ms)),
        RenderAction::Scroll(scroll),
        RenderAction::Pause(jitter(config.render_settle_ms)),
        RenderAction::WaitForAny {
            selectors: wait_selectors.iter().map(|s| (*s).to_string()).collect(),
            timeout: Duration::from_secs(10),
        },
        RenderAction::Snapshot,
    ]
}

/// [`Renderer`] that launches a local headless Chromium per session.
///
/// A fresh browser per render keeps proxy settings and cookies isolated
/// between requests.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    window: (u32, u32),
    poll_interval: Duration,
}

impl Default for ChromiumRenderer {
    fn default() -> Self {
        Self {
            window: (1920, 1080),
            poll_interval: Duration::from_millis(250),
        }
    }
}

impl ChromiumRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn browser_config(&self, proxy: Option<&str>) -> Result<BrowserConfig, SearchError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(self.window.0, self.window.1)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-default-apps");
        if let Some(proxy) = proxy {
            builder = builder.arg(format!("--proxy-server={proxy}"));
        }
        builder.build().map_err(SearchError::Render)
    }

    async fn run_session(&self, request: &RenderRequest) -> Result<String, SearchError> {
        let config = self.browser_config(request.proxy.as_deref())?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SearchError::Render(format!("failed to launch browser: {e}")))?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let outcome = self.run_actions(&browser, request).await;

        if let Err(e) = browser.close().await {
            tracing::debug!(error = %e, "browser close failed");
        }
        events.abort();

        outcome
    }

    async fn run_actions(
        &self,
        browser: &Browser,
        request: &RenderRequest,
    ) -> Result<String, SearchError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SearchError::Render(format!("failed to open page: {e}")))?;

        apply_identity(&page, &request.headers).await?;

        let mut snapshot = None;
        for action in &request.actions {
            match action {
                RenderAction::Navigate => {
                    page.goto(request.url.as_str())
                        .await
                        .map_err(|e| SearchError::Render(format!("navigation failed: {e}")))?;
                }
                RenderAction::Pause(duration) => tokio::time::sleep(*duration).await,
                RenderAction::Scroll(px) => {
                    let script = format!("window.scrollBy(0, {px});");
                    page.evaluate(script.as_str())
                        .await
                        .map_err(|e| SearchError::Render(format!("scroll failed: {e}")))?;
                }
                RenderAction::WaitForAny { selectors, timeout } => {
                    self.wait_for_any(&page, selectors, *timeout).await;
                }
                RenderAction::Snapshot => {
                    snapshot = Some(page.content().await.map_err(|e| {
                        SearchError::Render(format!("snapshot failed: {e}"))
                    })?);
                }
            }
        }

        let html = match snapshot {
            Some(html) => html,
            None => page
                .content()
                .await
                .map_err(|e| SearchError::Render(format!("snapshot failed: {e}")))?,
        };

        if let Err(e) = page.close().await {
            tracing::debug!(error = %e, "page close failed");
        }
        Ok(html)
    }

    async fn wait_for_any(&self, page: &Page, selectors: &[String], timeout: Duration) {
        let give_up = Instant::now() + timeout;
        loop {
            for selector in selectors {
                if let Ok(elements) = page.find_elements(selector.as_str()).await {
                    if !elements.is_empty() {
                        tracing::trace!(selector = %selector, count = elements.len(), "result selector visible");
                        return;
                    }
                }
            }
            if Instant::now() >= give_up {
                tracing::debug!("no result selector became visible; snapshotting anyway");
                return;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

async fn apply_identity(page: &Page, headers: &[(String, String)]) -> Result<(), SearchError> {
    let mut extra = serde_json::Map::new();
    for (name, value) in headers {
        if name.eq_ignore_ascii_case("user-agent") {
            page.set_user_agent(value.as_str())
                .await
                .map_err(|e| SearchError::Render(format!("failed to set identity: {e}")))?;
        } else {
            extra.insert(name.clone(), serde_json::Value::String(value.clone()));
        }
    }
    if !extra.is_empty() {
        let params = SetExtraHttpHeadersParams::new(Headers::new(serde_json::Value::Object(extra)));
        page.execute(params)
            .await
            .map_err(|e| SearchError::Render(format!("failed to set headers: {e}")))?;
    }
    Ok(())
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<String, SearchError> {
        tracing::trace!(url = %request.url, "render session starting");
        tokio::time::timeout_at(request.deadline, self.run_session(request))
            .await
            .map_err(|_| SearchError::Timeout("render deadline exceeded".into()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanised_plan_order() {
        let plan = humanised_plan(&EngineConfig::default(), &["#search .g", "h3"]);
        assert_eq!(plan.len(), 6);
        assert_eq!(plan[0], RenderAction::Navigate);
        assert!(matches!(plan[2], RenderAction::Scroll(px) if (100..=500).contains(&px)));
        match &plan[4] {
            RenderAction::WaitForAny { selectors, .. } => {
                assert_eq!(selectors, &vec!["#search .g".to_string(), "h3".to_string()]);
            }
            other => panic!("expected wait step, got {other:?}"),
        }
        assert_eq!(plan[5], RenderAction::Snapshot);
    }

    #[test]
    fn humanised_plan_respects_settle_range() {
        let config = EngineConfig {
            render_settle_ms: (5, 10),
            ..Default::default()
        };
        for action in humanised_plan(&config, &["a"]) {
            if let RenderAction::Pause(d) = action {
                assert!(d >= Duration::from_millis(5) && d <= Duration::from_millis(10));
            }
        }
    }

    #[test]
    fn browser_config_builds_with_proxy() {
        let renderer = ChromiumRenderer::new();
        // Building only resolves an executable path when one is installed;
        // either outcome must be a typed error, never a panic.
        match renderer.browser_config(Some("http://127.0.0.1:8080")) {
            Ok(_) => {}
            Err(err) => assert!(matches!(err, SearchError::Render(_))),
        }
    }

    #[tokio::test]
    #[ignore] // Requires a local Chromium — run with `cargo test -- --ignored`
    async fn live_render_example_dot_com() {
        let renderer = ChromiumRenderer::new();
        let request = RenderRequest {
            url: "https://example.com".into(),
            headers: vec![("User-Agent".into(), crate::identity::USER_AGENTS[0].into())],
            proxy: None,
            actions: humanised_plan(&EngineConfig::without_delays(), &["h1"]),
            deadline: Instant::now() + Duration::from_secs(30),
        };
        let html = renderer.render(&request).await.expect("render should work");
        assert!(html.contains("Example Domain"));
    }
}
