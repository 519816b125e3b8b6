//! Search request parameters.
//!
//! A [`SearchRequest`] is built once per invocation, validated, and then
//! shared read-only with every provider that serves it.

use chrono::NaiveDate;
use std::time::Duration;
use url::Url;

use crate::error::SearchError;

/// Which provider(s) a request is dispatched to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderTarget {
    /// Fan out to every registered provider.
    All,
    /// A single provider, looked up case-insensitively.
    Named(String),
}

impl ProviderTarget {
    /// Parse a target name; `"all"` (any case) selects fan-out.
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Named(name.to_string())
        }
    }
}

/// How a provider page is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Plain HTTP request with browser-like headers.
    #[default]
    Direct,
    /// Headless browser session with script execution.
    Rendered,
}

impl FetchMode {
    /// Short label used in logs and debug artifact names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Rendered => "rendered",
        }
    }
}

/// Advanced query operators appended to the query text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvancedQuery {
    /// Restrict results to one site (`site:`).
    pub site: Option<String>,
    /// Restrict results to one file type (`filetype:`).
    pub filetype: Option<String>,
}

/// Inclusive publication date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Parameters for one search invocation.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Free-text query.
    pub query: String,
    /// Provider(s) to query.
    pub target: ProviderTarget,
    /// Maximum results per provider.
    pub max_results: usize,
    /// Keep sponsored results (flagged `is_ad`) instead of dropping them.
    pub include_ads: bool,
    /// Overall deadline for the call, shared by all providers.
    pub timeout: Duration,
    /// Proxy URL for outbound traffic (`http`, `https`, `socks5`).
    pub proxy: Option<String>,
    /// Direct or rendered fetching.
    pub mode: FetchMode,
    /// Interface language code (`en`, `de`…).
    pub language: String,
    /// Region code (`us`, `gb`…). Empty means provider default.
    pub region: String,
    /// 1-based result page.
    pub page: u32,
    /// `site:` / `filetype:` operators.
    pub advanced: AdvancedQuery,
    /// Domains excluded with `-site:` operators.
    pub exclude_domains: Vec<String>,
    /// Minimum description word count for accepted results.
    pub min_word_count: Option<usize>,
    /// Maximum description word count for accepted results.
    pub max_word_count: Option<usize>,
    /// Optional publication date range (providers that support it).
    pub date_range: Option<DateRange>,
    /// Raise diagnostics to debug level and capture raw snapshots.
    pub debug: bool,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            target: ProviderTarget::All,
            max_results: 10,
            include_ads: false,
            timeout: Duration::from_secs(30),
            proxy: None,
            mode: FetchMode::Direct,
            language: "en".into(),
            region: "us".into(),
            page: 1,
            advanced: AdvancedQuery::default(),
            exclude_domains: Vec::new(),
            min_word_count: None,
            max_word_count: None,
            date_range: None,
            debug: false,
        }
    }
}

impl SearchRequest {
    /// Create a request for `query` with default settings.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Validates the request, returning an error before any I/O if a field
    /// is unusable.
    ///
    /// Checks:
    /// - `query` must not be blank
    /// - `max_results`, `timeout` and `page` must be non-zero
    /// - `proxy`, if present, must be an absolute `http`, `https` or `socks5` URL
    /// - word-count bounds must not be inverted
    /// - the date range must not end before it starts
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.query.trim().is_empty() {
            return Err(SearchError::InvalidConfiguration(
                "query must not be empty".into(),
            ));
        }
        if self.max_results == 0 {
            return Err(SearchError::InvalidConfiguration(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(SearchError::InvalidConfiguration(
                "timeout must be greater than 0".into(),
            ));
        }
        if self.page == 0 {
            return Err(SearchError::InvalidConfiguration(
                "page numbers start at 1".into(),
            ));
        }
        if let Some(proxy) = &self.proxy {
            validate_proxy(proxy)?;
        }
        if let (Some(min), Some(max)) = (self.min_word_count, self.max_word_count) {
            if min > max {
                return Err(SearchError::InvalidConfiguration(
                    "min_word_count must be <= max_word_count".into(),
                ));
            }
        }
        if let Some(range) = &self.date_range {
            if range.start > range.end {
                return Err(SearchError::InvalidConfiguration(
                    "date range start must not be after its end".into(),
                ));
            }
        }
        Ok(())
    }

    /// Query text with advanced operators and domain exclusions appended.
    pub fn effective_query(&self) -> String {
        let mut terms = vec![self.query.trim().to_string()];
        if let Some(site) = &self.advanced.site {
            terms.push(format!("site:{site}"));
        }
        if let Some(filetype) = &self.advanced.filetype {
            terms.push(format!("filetype:{filetype}"));
        }
        for domain in &self.exclude_domains {
            terms.push(format!("-site:{domain}"));
        }
        terms.join(" ")
    }

    /// Proxy address with any credentials removed, for logging.
    pub fn proxy_display(&self) -> Option<String> {
        let proxy = self.proxy.as_deref()?;
        match Url::parse(proxy) {
            Ok(mut url) => {
                let _ = url.set_username("");
                let _ = url.set_password(None);
                Some(url.to_string())
            }
            Err(_) => Some("<invalid proxy>".into()),
        }
    }
}

fn validate_proxy(proxy: &str) -> Result<(), SearchError> {
    let parsed = Url::parse(proxy)
        .map_err(|e| SearchError::InvalidConfiguration(format!("invalid proxy URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" | "socks5" | "socks5h" => {}
        other => {
            return Err(SearchError::InvalidConfiguration(format!(
                "unsupported proxy scheme '{other}'"
            )))
        }
    }
    if parsed.host_str().is_none() {
        return Err(SearchError::InvalidConfiguration(
            "proxy URL has no host".into(),
        ));
    }
    Ok(())
}
