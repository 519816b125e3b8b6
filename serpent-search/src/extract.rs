//! Selector-fallback extraction.
//!
//! Each provider describes its result page as a [`SelectorProfile`]: ordered
//! selector chains for containers and the fields inside them, ad markers,
//! special-feature markers and a link resolver. [`extract_page`] runs the
//! same protocol over any profile:
//!
//! 1. Reject bot-check pages.
//! 2. Adopt the first container selector with at least one match.
//! 3. Resolve title, URL and description per container along their chains,
//!    skipping containers without a title or URL.
//! 4. Gate ads and word counts, then rank survivors in document order.
//! 5. If nothing survived, fall back to a generic pass over all links.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use url::Url;

use crate::captcha;
use crate::classify::{self, WordBounds};
use crate::dom::{self, Snapshot};
use crate::error::SearchError;
use crate::request::SearchRequest;
use crate::types::{ResultMetadata, ResultType, SearchFeature, SearchResult};

/// Description used when a container has none.
pub const NO_DESCRIPTION: &str = "No description available";

/// Fallback-pass descriptions are cut to this many characters.
const FALLBACK_DESCRIPTION_CHARS: usize = 300;

/// Number of element labels logged when a debug search finds nothing.
const EMPTY_PAGE_LABELS: usize = 50;

/// Maps an `href` found on a provider page to a destination URL, unwrapping
/// the provider's redirect wrappers. Returns `None` for links that point back
/// into the provider itself.
pub type UrlResolver = fn(href: &str, base: &Url) -> Option<String>;

/// A container marker that turns a result into a special search feature.
#[derive(Debug, Clone, Copy)]
pub struct FeatureRule {
    pub selector: &'static str,
    pub feature: SearchFeature,
}

/// Declarative description of one provider's result page.
#[derive(Debug, Clone, Copy)]
pub struct SelectorProfile {
    /// Provider display name, recorded on every result.
    pub provider: &'static str,
    /// Origin that relative links are resolved against.
    pub base_url: &'static str,
    /// Container selectors, most specific first.
    pub containers: &'static [&'static str],
    pub title: &'static [&'static str],
    /// Anchors whose `href` is the result URL.
    pub url: &'static [&'static str],
    /// Elements whose text is a display URL, used when no anchor resolves.
    pub url_text: &'static [&'static str],
    pub description: &'static [&'static str],
    /// Sub-selectors that mark a container as sponsored.
    pub ad_markers: &'static [&'static str],
    pub features: &'static [FeatureRule],
    /// Anchors listing sub-page links beneath a result.
    pub deeplinks: Option<&'static str>,
    /// Hosts excluded from the fallback link pass.
    pub own_hosts: &'static [&'static str],
    pub resolve: UrlResolver,
}

/// Resolve `href` against `base`, keeping only `http`/`https` targets.
pub fn absolutize(href: &str, base: &Url) -> Option<Url> {
    let url = base.join(href.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Resolver for providers without redirect wrappers.
pub fn resolve_direct(href: &str, base: &Url) -> Option<String> {
    absolutize(href, base).map(String::from)
}

/// Whether `host` is `domain` or a subdomain of it.
pub fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Turn a display URL such as `www.example.com › docs` into an absolute URL.
pub fn display_text_url(text: &str) -> Option<String> {
    let path: Vec<&str> = text
        .split('›')
        .filter_map(|segment| segment.split_whitespace().next())
        .collect();
    let joined = path.join("/");
    if joined.is_empty() {
        None
    } else if joined.contains("://") {
        Some(joined)
    } else {
        Some(format!("https://{joined}"))
    }
}

struct Compiled {
    containers: Vec<Selector>,
    title: Vec<Selector>,
    url: Vec<Selector>,
    url_text: Vec<Selector>,
    description: Vec<Selector>,
    ad_markers: Vec<Selector>,
    features: Vec<(Selector, SearchFeature)>,
    deeplinks: Option<Selector>,
    anchors: Selector,
}

impl Compiled {
    fn new(profile: &SelectorProfile) -> Result<Self, SearchError> {
        Ok(Self {
            containers: dom::compile(profile.containers)?,
            title: dom::compile(profile.title)?,
            url: dom::compile(profile.url)?,
            url_text: dom::compile(profile.url_text)?,
            description: dom::compile(profile.description)?,
            ad_markers: dom::compile(profile.ad_markers)?,
            features: profile
                .features
                .iter()
                .map(|rule| -> Result<_, SearchError> {
                    Ok((dom::compile_one(rule.selector)?, rule.feature))
                })
                .collect::<Result<_, _>>()?,
            deeplinks: profile.deeplinks.map(dom::compile_one).transpose()?,
            anchors: dom::compile_one("a[href]")?,
        })
    }
}

/// Per-call state shared by the container and fallback passes.
struct Extraction<'a> {
    profile: &'a SelectorProfile,
    request: &'a SearchRequest,
    base: Url,
    bounds: WordBounds,
    fetched_at: DateTime<Utc>,
    accepted: Vec<SearchResult>,
}

/// Emit a per-call diagnostic at `debug` when the request asks for it,
/// `trace` otherwise.
macro_rules! diag {
    ($debug:expr, $($arg:tt)+) => {
        if $debug {
            tracing::debug!($($arg)+)
        } else {
            tracing::trace!($($arg)+)
        }
    };
}

/// Parse a raw snapshot and extract ranked results for `request`.
///
/// # Errors
///
/// Returns [`SearchError::CaptchaDetected`] for bot-check pages and
/// [`SearchError::Parse`] if the profile holds an invalid selector or base
/// URL. A page with no usable results is an empty `Ok`.
pub fn extract_page(
    profile: &SelectorProfile,
    raw: &str,
    request: &SearchRequest,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<SearchResult>, SearchError> {
    let snapshot = Snapshot::parse(raw);

    if let Some(signal) = captcha::detect(&snapshot) {
        tracing::warn!(provider = profile.provider, ?signal, "bot-check page served");
        return Err(SearchError::CaptchaDetected(profile.provider.to_string()));
    }

    let compiled = Compiled::new(profile)?;
    let base = Url::parse(profile.base_url)
        .map_err(|e| SearchError::Parse(format!("invalid base URL '{}': {e}", profile.base_url)))?;

    let mut extraction = Extraction {
        profile,
        request,
        base,
        bounds: WordBounds::new(request.min_word_count, request.max_word_count),
        fetched_at,
        accepted: Vec::new(),
    };

    match snapshot.first_matching(&compiled.containers) {
        Some((index, containers)) => {
            diag!(
                request.debug,
                provider = profile.provider,
                selector = profile.containers[index],
                containers = containers.len(),
                "container selector adopted"
            );
            extraction.containers(&compiled, &containers);
        }
        None => diag!(
            request.debug,
            provider = profile.provider,
            "no container selector matched"
        ),
    }

    if extraction.accepted.is_empty() {
        diag!(
            request.debug,
            provider = profile.provider,
            "container pass empty, using link fallback"
        );
        extraction.fallback(&compiled, &snapshot);
    }

    if extraction.accepted.is_empty() && request.debug {
        tracing::debug!(
            provider = profile.provider,
            labels = ?snapshot.element_labels(EMPTY_PAGE_LABELS),
            "page yielded no results"
        );
    }

    Ok(extraction.accepted)
}

impl Extraction<'_> {
    fn is_full(&self) -> bool {
        self.accepted.len() >= self.request.max_results
    }

    /// Final destination URL and its host, or `None` if unusable.
    fn finalize(&self, candidate: &str) -> Option<(String, String)> {
        let url = Url::parse(candidate).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let host = url.host_str().filter(|h| !h.is_empty())?.to_string();
        Some((url.into(), host))
    }

    fn resolve_href(&self, href: &str) -> Option<(String, String)> {
        let resolved = (self.profile.resolve)(href, &self.base)?;
        self.finalize(&resolved)
    }

    fn container_url(&self, compiled: &Compiled, container: ElementRef<'_>) -> Option<(String, String)> {
        let from_anchor = compiled.url.iter().find_map(|selector| {
            container
                .select(selector)
                .filter_map(|el| dom::attr(el, "href"))
                .find_map(|href| self.resolve_href(href))
        });
        from_anchor.or_else(|| {
            let text = dom::first_text(container, &compiled.url_text)?;
            self.finalize(&display_text_url(&text)?)
        })
    }

    fn deeplinks(&self, compiled: &Compiled, container: ElementRef<'_>, own_url: &str) -> Vec<String> {
        let Some(selector) = &compiled.deeplinks else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        container
            .select(selector)
            .filter_map(|el| dom::attr(el, "href"))
            .filter_map(|href| self.resolve_href(href))
            .map(|(url, _)| url)
            .filter(|url| url != own_url && seen.insert(url.clone()))
            .collect()
    }

    /// Apply ad and word-count gating; returns `Some(is_ad)` if kept.
    fn gate(&self, title: &str, description: &str, ad_marker: bool) -> Option<bool> {
        let is_ad = ad_marker || classify::looks_like_ad(title, description);
        if is_ad && !self.request.include_ads {
            return None;
        }
        if !self.bounds.accepts(description) {
            return None;
        }
        Some(is_ad)
    }

    #[allow(clippy::too_many_arguments)]
    fn accept(
        &mut self,
        title: String,
        url: String,
        domain: String,
        description: String,
        is_ad: bool,
        result_type: ResultType,
        search_feature: Option<SearchFeature>,
        deeplinks: Vec<String>,
    ) {
        let keywords = classify::extract_keywords(&self.request.query, &description);
        let rank = self.accepted.len() + 1;
        self.accepted.push(SearchResult {
            title,
            url,
            description,
            is_ad,
            rank,
            keywords,
            metadata: ResultMetadata {
                domain,
                fetched_at: self.fetched_at,
                result_type,
                search_feature,
                provider: self.profile.provider.to_string(),
                deeplinks,
            },
        });
    }

    fn containers(&mut self, compiled: &Compiled, containers: &[ElementRef<'_>]) {
        for (position, container) in containers.iter().enumerate() {
            if self.is_full() {
                break;
            }
            let container = *container;

            let Some(title) = dom::first_text(container, &compiled.title) else {
                diag!(self.request.debug, position, "container skipped: no title");
                continue;
            };
            let Some((url, domain)) = self.container_url(compiled, container) else {
                diag!(self.request.debug, position, "container skipped: no url");
                continue;
            };
            let description = dom::first_text(container, &compiled.description)
                .unwrap_or_else(|| NO_DESCRIPTION.to_string());

            let ad_marker = compiled
                .ad_markers
                .iter()
                .any(|selector| dom::has_match(container, selector));
            let Some(is_ad) = self.gate(&title, &description, ad_marker) else {
                diag!(self.request.debug, position, "container gated out");
                continue;
            };

            let search_feature = compiled
                .features
                .iter()
                .find(|(selector, _)| dom::has_match(container, selector))
                .map(|(_, feature)| *feature);
            let deeplinks = self.deeplinks(compiled, container, &url);
            let result_type = match (search_feature, deeplinks.is_empty()) {
                (Some(_), _) => ResultType::Special,
                (None, false) => ResultType::WithDeeplinks,
                (None, true) => ResultType::Organic,
            };

            self.accept(
                title,
                url,
                domain,
                description,
                is_ad,
                result_type,
                search_feature,
                deeplinks,
            );
        }
    }

    fn fallback(&mut self, compiled: &Compiled, snapshot: &Snapshot) {
        let mut seen = HashSet::new();
        for anchor in snapshot.select(&compiled.anchors) {
            if self.is_full() {
                break;
            }
            let Some(href) = dom::attr(anchor, "href") else {
                continue;
            };
            let Some((url, domain)) = self.resolve_href(href) else {
                continue;
            };
            if self
                .profile
                .own_hosts
                .iter()
                .any(|own| host_matches(&domain, own))
            {
                continue;
            }
            if !seen.insert(url.clone()) {
                continue;
            }

            let text = dom::text_of(anchor);
            let title = if text.is_empty() { url.clone() } else { text };
            let description = anchor
                .parent()
                .and_then(ElementRef::wrap)
                .map(dom::text_of)
                .map(|parent| parent.replacen(&title, "", 1).trim().to_string())
                .filter(|d| !d.is_empty())
                .map(|d| d.chars().take(FALLBACK_DESCRIPTION_CHARS).collect::<String>())
                .unwrap_or_else(|| NO_DESCRIPTION.to_string());

            let Some(is_ad) = self.gate(&title, &description, false) else {
                continue;
            };
            self.accept(
                title,
                url,
                domain,
                description,
                is_ad,
                ResultType::Fallback,
                None,
                Vec::new(),
            );
        }
    }
}
