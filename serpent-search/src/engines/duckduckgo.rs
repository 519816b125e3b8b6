//! DuckDuckGo search engine: most scraper-friendly, privacy-aligned.
//!
//! Uses the HTML-only version at `https://html.duckduckgo.com/html/`
//! which requires no JavaScript and is tolerant of automated requests.
//! Result links are wrapped as `//duckduckgo.com/l/?uddg=<encoded>`.

use async_trait::async_trait;
use url::Url;

use crate::engine::{ProviderCore, SearchProvider};
use crate::error::SearchError;
use crate::extract::{absolutize, host_matches, FeatureRule, SelectorProfile};
use crate::request::SearchRequest;
use crate::types::{ProviderKind, SearchFeature, SearchResult};

const DEFAULT_BASE_URL: &str = "https://html.duckduckgo.com";

/// Results per HTML page, used for the `s` offset.
const RESULTS_PER_PAGE: u32 = 30;

/// Result-page layout for DuckDuckGo.
///
/// The first container selector also matches the zero-click answer box so
/// instant answers keep their document position ahead of web results.
pub const PROFILE: SelectorProfile = SelectorProfile {
    provider: "DuckDuckGo",
    base_url: DEFAULT_BASE_URL,
    containers: &[".zci, .result", "article.result", ".web-result"],
    title: &[".result__title", ".result__a", ".zci__heading", "h2"],
    url: &["a.result__a", ".zci__heading a", "a.result__url", "a"],
    url_text: &[".result__url"],
    description: &[
        ".result__snippet",
        ".result__snippet-truncate",
        ".zci__result",
    ],
    ad_markers: &[".result--ad", ".badge--ad"],
    features: &[FeatureRule {
        selector: ".zci",
        feature: SearchFeature::InstantAnswer,
    }],
    deeplinks: None,
    own_hosts: &["duckduckgo.com"],
    resolve: resolve_duckduckgo,
};

/// Unwrap DuckDuckGo's `uddg` redirect. Other links into DuckDuckGo
/// resolve to nothing.
fn resolve_duckduckgo(href: &str, base: &Url) -> Option<String> {
    let url = absolutize(href, base)?;
    if !url.host_str().is_some_and(|h| host_matches(h, "duckduckgo.com")) {
        return Some(url.into());
    }
    if !url.path().starts_with("/l/") {
        return None;
    }
    url.query_pairs()
        .find(|(key, _)| key == "uddg")
        .map(|(_, value)| value.into_owned())
}

/// DuckDuckGo HTML search scraper.
#[derive(Debug)]
pub struct DuckDuckGoEngine {
    core: ProviderCore,
    base_url: String,
}

impl DuckDuckGoEngine {
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

    /// Build the result-page URL for `request`. The `kl` region code is
    /// `<region>-<language>`, e.g. `us-en`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidConfiguration`] if the base URL is invalid.
    pub fn search_url(&self, request: &SearchRequest) -> Result<String, SearchError> {
        let mut url = Url::parse(&format!("{}/html/", self.base_url.trim_end_matches('/')))
            .map_err(|e| {
                SearchError::InvalidConfiguration(format!("invalid DuckDuckGo base URL: {e}"))
            })?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("q", &request.effective_query());
            if !request.region.is_empty() && !request.language.is_empty() {
                query.append_pair(
                    "kl",
                    &format!("{}-{}", request.region, request.language).to_lowercase(),
                );
            }
            if request.page > 1 {
                let offset = (request.page - 1).saturating_mul(RESULTS_PER_PAGE);
                query.append_pair("s", &offset.to_string());
            }
        }
        Ok(url.into())
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoEngine {
    fn name(&self) -> &str {
        ProviderKind::DuckDuckGo.name()
    }

    fn capabilities(&self) -> Vec<String> {
        ProviderKind::DuckDuckGo.capabilities()
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
