//! The provider abstraction and the behaviour every provider shares.
//!
//! Each search provider (Google, Bing, DuckDuckGo) implements
//! [`SearchProvider`] so the orchestrator can hold them as
//! `Arc<dyn SearchProvider>`. The providers differ only in how they build a
//! result-page URL and in their [`SelectorProfile`]; throttling, identity
//! rotation, fetching, debug capture and extraction live in
//! [`ProviderCore`], which each provider embeds.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::EngineConfig;
use crate::debug::{DebugSink, NoopDebugSink};
use crate::error::SearchError;
use crate::extract::{extract_page, SelectorProfile};
use crate::http::{browser_headers, jitter, FetchRequest, ReqwestTransport, Transport};
use crate::identity::IdentityRotator;
use crate::rate_limit::RateLimiter;
use crate::render::{humanised_plan, ChromiumRenderer, RenderRequest, Renderer};
use crate::request::{FetchMode, SearchRequest};
use crate::types::{ProviderInfo, SearchResult};

/// A search provider the orchestrator can dispatch to.
///
/// All implementations must be `Send + Sync` for concurrent fan-out.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Display name. Registry lookups compare it case-insensitively.
    fn name(&self) -> &str;

    /// Declared capability set.
    fn capabilities(&self) -> Vec<String>;

    /// Run `request` against this provider and return ranked results.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidConfiguration`] for an unusable request
    /// (before any I/O), [`SearchError::Transport`], [`SearchError::Render`]
    /// or [`SearchError::Timeout`] for fetch failures, and
    /// [`SearchError::CaptchaDetected`] for bot-check pages. An empty page is
    /// an empty `Ok`.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, SearchError>;

    /// Change the requests-per-minute limit. `<= 0` disables throttling.
    fn set_rate_limit(&self, requests_per_minute: i32);

    /// Current requests-per-minute limit.
    fn rate_limit(&self) -> i32;

    /// Capability descriptor for this provider.
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.name().to_string(),
            capabilities: self.capabilities(),
            rate_limit: self.rate_limit(),
        }
    }
}

/// Shared per-provider machinery: rate limiting, identity rotation, the
/// direct and rendered fetch paths, debug capture and extraction.
///
/// One instance lives as long as its provider, so throttling and rotation
/// state carry across requests.
pub struct ProviderCore {
    config: EngineConfig,
    limiter: RateLimiter,
    identities: IdentityRotator,
    transport: Arc<dyn Transport>,
    renderer: Arc<dyn Renderer>,
    debug_sink: Arc<dyn DebugSink>,
}

impl std::fmt::Debug for ProviderCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCore")
            .field("config", &self.config)
            .field("limiter", &self.limiter)
            .field("identities", &self.identities.len())
            .finish_non_exhaustive()
    }
}

impl ProviderCore {
    /// Build a core around the given fetch capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidConfiguration`] if `config` is invalid.
    pub fn new(
        config: EngineConfig,
        transport: Arc<dyn Transport>,
        renderer: Arc<dyn Renderer>,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            limiter: RateLimiter::new(config.requests_per_minute),
            identities: IdentityRotator::new(config.user_agents.clone().unwrap_or_default()),
            transport,
            renderer,
            debug_sink: Arc::new(NoopDebugSink),
            config,
        })
    }

    /// Build a core with the `reqwest` transport and local Chromium renderer.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid or the HTTP client cannot be
    /// constructed.
    pub fn with_defaults(config: EngineConfig) -> Result<Self, SearchError> {
        Self::new(
            config,
            Arc::new(ReqwestTransport::new()?),
            Arc::new(ChromiumRenderer::new()),
        )
    }

    /// Replace the debug artifact sink.
    pub fn with_debug_sink(mut self, sink: Arc<dyn DebugSink>) -> Self {
        self.debug_sink = sink;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_rate_limit(&self, requests_per_minute: i32) {
        self.limiter.set_rate_limit(requests_per_minute);
    }

    pub fn rate_limit(&self) -> i32 {
        self.limiter.rate_limit()
    }

    /// Fetch `url` in the request's mode and extract results with `profile`.
    ///
    /// The whole call, including the rate-limit wait, is bounded by
    /// `request.timeout`.
    ///
    /// # Errors
    ///
    /// See [`SearchProvider::search`].
    pub async fn search(
        &self,
        profile: &SelectorProfile,
        url: &str,
        request: &SearchRequest,
    ) -> Result<Vec<SearchResult>, SearchError> {
        request.validate()?;
        let deadline = Instant::now() + request.timeout;

        tracing::trace!(
            provider = profile.provider,
            query = %request.query,
            mode = request.mode.as_str(),
            proxy = ?request.proxy_display(),
            "search starting"
        );

        let raw = tokio::time::timeout_at(deadline, self.fetch(profile, url, request, deadline))
            .await
            .map_err(|_| {
                SearchError::Timeout(format!(
                    "{} did not respond within {}s",
                    profile.provider,
                    request.timeout.as_secs_f32()
                ))
            })??;

        if request.debug {
            self.debug_sink.persist(profile.provider, request.mode, &raw);
        }

        let results = extract_page(profile, &raw, request, Utc::now())?;
        tracing::debug!(
            provider = profile.provider,
            count = results.len(),
            "search complete"
        );
        Ok(results)
    }

    async fn fetch(
        &self,
        profile: &SelectorProfile,
        url: &str,
        request: &SearchRequest,
        deadline: Instant,
    ) -> Result<String, SearchError> {
        self.limiter.acquire().await;

        let identity = self.identities.next_identity();
        let headers = browser_headers(&identity, &request.language);

        match request.mode {
            FetchMode::Direct => {
                tokio::time::sleep(jitter(self.config.request_delay_ms)).await;
                let response = self
                    .transport
                    .fetch(&FetchRequest {
                        url: url.to_string(),
                        headers,
                        proxy: request.proxy.clone(),
                        timeout: deadline.saturating_duration_since(Instant::now()),
                    })
                    .await?;
                if !response.is_success() {
                    return Err(SearchError::Transport(format!(
                        "{} returned HTTP {}",
                        profile.provider, response.status
                    )));
                }
                Ok(response.text())
            }
            FetchMode::Rendered => {
                let render_deadline = deadline.min(Instant::now() + self.config.render_timeout);
                self.renderer
                    .render(&RenderRequest {
                        url: url.to_string(),
                        headers,
                        proxy: request.proxy.clone(),
                        actions: humanised_plan(&self.config, profile.containers),
                        deadline: render_deadline,
                    })
                    .await
            }
        }
    }
}
