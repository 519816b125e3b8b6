//! Bing search engine: independent index with deeplink clusters.
//!
//! Bing wraps outbound links in `/ck/a?…&u=a1<base64url>` click-tracking
//! redirects and sometimes renders results with only a `<cite>` display
//! URL. Popular results carry a cluster of sub-page deeplinks.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use url::Url;

use crate::engine::{ProviderCore, SearchProvider};
use crate::error::SearchError;
use crate::extract::{absolutize, host_matches, SelectorProfile};
use crate::request::SearchRequest;
use crate::types::{ProviderKind, SearchResult};

const DEFAULT_BASE_URL: &str = "https://www.bing.com";

/// Result-page layout for Bing.
pub const PROFILE: SelectorProfile = SelectorProfile {
    provider: "Bing",
    base_url: DEFAULT_BASE_URL,
    containers: &["li.b_algo", "#b_results > li"],
    title: &["h2", "h3"],
    url: &["h2 a", "a"],
    url_text: &["cite"],
    description: &["div.b_caption p", ".b_lineclamp2", ".b_lineclamp3", "p"],
    ad_markers: &[".b_adSlug", ".b_adProvider"],
    features: &[],
    deeplinks: Some("ul.b_deeplinks_expand li a, .b_vlist2col li a"),
    own_hosts: &["bing.com"],
    resolve: resolve_bing,
};

/// Decode Bing click-tracking wrappers. Other links into Bing resolve to
/// nothing.
fn resolve_bing(href: &str, base: &Url) -> Option<String> {
    let url = absolutize(href, base)?;
    if !url.host_str().is_some_and(|h| host_matches(h, "bing.com")) {
        return Some(url.into());
    }
    if !url.path().starts_with("/ck/a") {
        return None;
    }
    let (_, wrapped) = url.query_pairs().find(|(key, _)| key == "u")?;
    decode_click_target(&wrapped)
}

/// Decode a `u=a1<base64url>` click-tracking payload.
fn decode_click_target(wrapped: &str) -> Option<String> {
    let payload = wrapped.strip_prefix("a1")?.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let target = String::from_utf8(bytes).ok()?;
    target.starts_with("http").then_some(target)
}

/// Bing result-page scraper.
#[derive(Debug)]
pub struct BingEngine {
    core: ProviderCore,
    base_url: String,
}

impl BingEngine {
    pub fn new(core: ProviderCore) -> Self {
        Self {
            core,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the engine at another origin (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the result-page URL for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidConfiguration`] if the base URL is invalid.
    pub fn search_url(&self, request: &SearchRequest) -> Result<String, SearchError> {
        let mut url = Url::parse(&format!("{}/search", self.base_url.trim_end_matches('/')))
            .map_err(|e| SearchError::InvalidConfiguration(format!("invalid Bing base URL: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("q", &request.effective_query())
                .append_pair("count", &request.max_results.to_string())
                .append_pair("setlang", &request.language);
            if !request.region.is_empty() {
                query.append_pair("cc", &request.region);
            }
            if request.page > 1 {
                let first = (request.page - 1).saturating_mul(10).saturating_add(1);
                query.append_pair("first", &first.to_string());
            }
        }
        Ok(url.into())
    }
}

#[async_trait]
impl SearchProvider for BingEngine {
    fn name(&self) -> &str {
        ProviderKind::Bing.name()
    }

    fn capabilities(&self) -> Vec<String> {
        ProviderKind::Bing.capabilities()
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        let url = self.search_url(request)?;
        self.core.search(&PROFILE, &url, request).await
    }

    fn set_rate_limit(&self, requests_per_minute: i32) {
        self.core.set_rate_limit(requests_per_minute);
    }

    fn rate_limit(&self) -> i32 {
        self.core.rate_limit()
    }
}
