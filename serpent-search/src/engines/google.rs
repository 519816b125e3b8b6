//! Google search engine: richest result page, most aggressive bot detection.
//!
//! Google wraps many outbound links in `/url?q=…` redirects, marks special
//! features (knowledge panels, featured snippets, videos, review stars) with
//! dedicated classes, and serves CAPTCHA pages quickly to automated clients.
//! Rendered mode is usually needed for sustained use.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::engine::{ProviderCore, SearchProvider};
use crate::error::SearchError;
use crate::extract::{absolutize, FeatureRule, SelectorProfile};
use crate::request::SearchRequest;
use crate::types::{ProviderKind, SearchFeature, SearchResult};

const DEFAULT_BASE_URL: &str = "https://www.google.com";

/// Result-page layout for Google.
pub const PROFILE: SelectorProfile = SelectorProfile {
    provider: "Google",
    base_url: DEFAULT_BASE_URL,
    containers: &[
        "#search .g",
        "#rso .g",
        "#search .MjjYud",
        "#rso .MjjYud",
        "div.g",
        ".MjjYud",
        "#search div[data-hveid]",
        "#rso > div",
        "#main div[data-header-feature]",
    ],
    title: &["h3.LC20lb", "h3", "div[role='heading']"],
    url: &[".yuRUbf a", "a"],
    url_text: &[],
    description: &[
        ".VwiC3b",
        ".IsZvec",
        "div[role='doc-subtitle']",
        "span.st",
        "[data-content-feature='1']",
    ],
    ad_markers: &[".uEierd", ".commercial-unit-desktop-top", "[data-text-ad]"],
    features: &[
        FeatureRule {
            selector: ".kp-wholepage, .ULSxyf",
            feature: SearchFeature::KnowledgePanel,
        },
        FeatureRule {
            selector: ".g-blk",
            feature: SearchFeature::FeaturedSnippet,
        },
        FeatureRule {
            selector: ".video-voyager, .X7NTVe",
            feature: SearchFeature::Video,
        },
        FeatureRule {
            selector: "g-review-stars, .PZPZlf",
            feature: SearchFeature::Review,
        },
    ],
    deeplinks: None,
    own_hosts: &["google.com", "gstatic.com", "googleusercontent.com"],
    resolve: resolve_google,
};

static WRAPPED_TARGET: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[?&](?:q|url)=([^&]+)").ok());

fn is_google_host(host: &str) -> bool {
    host == "google.com" || host.starts_with("google.") || host.contains(".google.")
}

/// Unwrap Google's `/url?q=` redirects. Links back into Google itself
/// (related searches, settings, cached copies) resolve to nothing.
fn resolve_google(href: &str, base: &Url) -> Option<String> {
    let Some(url) = absolutize(href, base) else {
        return wrapped_target(href);
    };
    if !url.host_str().is_some_and(is_google_host) {
        return Some(url.into());
    }
    if url.path() != "/url" {
        return None;
    }
    url.query_pairs()
        .find(|(key, _)| key == "q" || key == "url")
        .map(|(_, value)| value.into_owned())
        .filter(|target| target.starts_with("http"))
        .or_else(|| wrapped_target(href))
}

/// Pull the redirect target out of a wrapper that does not parse as a URL.
fn wrapped_target(href: &str) -> Option<String> {
    if !href.contains("/url?") {
        return None;
    }
    let encoded = WRAPPED_TARGET.as_ref()?.captures(href)?.get(1)?.as_str();
    // A lone form-encoded key decodes to the percent-decoded target.
    let (decoded, _) = url::form_urlencoded::parse(encoded.as_bytes()).next()?;
    decoded.starts_with("http").then(|| decoded.into_owned())
}

/// Google result-page scraper.
#[derive(Debug)]
pub struct GoogleEngine {
    core: ProviderCore,
    base_url: String,
}

impl GoogleEngine {
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
    /// Asks for five extra results to leave room for ad and word-count
    /// gating.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidConfiguration`] if the base URL is invalid.
    pub fn search_url(&self, request: &SearchRequest) -> Result<String, SearchError> {
        let mut url = Url::parse(&format!("{}/search", self.base_url.trim_end_matches('/')))
            .map_err(|e| SearchError::InvalidConfiguration(format!("invalid Google base URL: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("q", &request.effective_query())
                .append_pair("num", &request.max_results.saturating_add(5).to_string())
                .append_pair("hl", &request.language)
                .append_pair("safe", "off")
                .append_pair("pws", "0");
            if !request.region.is_empty() {
                query.append_pair("gl", &request.region);
            }
            if request.page > 1 {
                let start = (request.page - 1).saturating_mul(10);
                query.append_pair("start", &start.to_string());
            }
            if let Some(range) = &request.date_range {
                query.append_pair(
                    "tbs",
                    &format!(
                        "cdr:1,cd_min:{},cd_max:{}",
                        range.start.format("%m/%d/%Y"),
                        range.end.format("%m/%d/%Y")
                    ),
                );
            }
        }
        Ok(url.into())
    }
}

#[async_trait]
impl SearchProvider for GoogleEngine {
    fn name(&self) -> &str {
        ProviderKind::Google.name()
    }

    fn capabilities(&self) -> Vec<String> {
        ProviderKind::Google.capabilities()
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
