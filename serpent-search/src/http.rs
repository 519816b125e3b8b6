//! Direct-mode transport: plain HTTP fetches with browser-like headers.
//!
//! [`Transport`] is the seam the extraction engines fetch through; the
//! default [`ReqwestTransport`] keeps one [`reqwest::Client`] per egress
//! path (direct, or one per proxy) with cookie support and decompression.

use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::SearchError;

/// One outbound page fetch.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Absolute URL to fetch.
    pub url: String,
    /// Request headers, including `User-Agent`.
    pub headers: Vec<(String, String)>,
    /// Optional proxy URL (already validated).
    pub proxy: Option<String>,
    /// Bound on the whole exchange.
    pub timeout: Duration,
}

/// Status and raw body of a fetched page.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response bytes.
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Fetches raw pages for direct mode.
///
/// Implementations must return non-success statuses as a [`FetchResponse`]
/// rather than an error; status policy belongs to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `request.url`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Transport`] on connection or read failure and
    /// [`SearchError::Timeout`] when `request.timeout` elapses.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, SearchError>;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug)]
pub struct ReqwestTransport {
    direct: reqwest::Client,
    proxied: Mutex<HashMap<String, reqwest::Client>>,
}

impl ReqwestTransport {
    /// Build a transport with a direct client.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Transport`] if the client cannot be constructed.
    pub fn new() -> Result<Self, SearchError> {
        Ok(Self {
            direct: build_client(None)?,
            proxied: Mutex::new(HashMap::new()),
        })
    }

    fn client_for(&self, proxy: Option<&str>) -> Result<reqwest::Client, SearchError> {
        let Some(proxy) = proxy else {
            return Ok(self.direct.clone());
        };
        let mut proxied = self.proxied.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(client) = proxied.get(proxy) {
            return Ok(client.clone());
        }
        let client = build_client(Some(proxy))?;
        proxied.insert(proxy.to_string(), client.clone());
        Ok(client)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, SearchError> {
        let client = self.client_for(request.proxy.as_deref())?;

        let mut builder = client.get(&request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        tracing::trace!(status, bytes = body.len(), "page fetched");

        Ok(FetchResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Build a [`reqwest::Client`] configured for result-page scraping.
///
/// The client has:
/// - Cookie store enabled (for consent pages)
/// - Brotli and gzip decompression
/// - At most 10 redirects
/// - Optional proxy routing for all schemes
///
/// Timeouts are applied per request.
fn build_client(proxy: Option<&str>) -> Result<reqwest::Client, SearchError> {
    let mut builder = reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::limited(10));

    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| SearchError::InvalidConfiguration(format!("invalid proxy URL: {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| SearchError::Transport(format!("failed to build HTTP client: {e}")))
}

fn map_reqwest_error(e: reqwest::Error) -> SearchError {
    if e.is_timeout() {
        SearchError::Timeout(format!("request timed out: {e}"))
    } else {
        SearchError::Transport(format!("request failed: {e}"))
    }
}

/// Browser-like request headers for `user_agent` and interface `language`.
///
/// `Accept-Encoding` is left to the client so decompression stays automatic.
pub fn browser_headers(user_agent: &str, language: &str) -> Vec<(String, String)> {
    let mut headers = vec![
        ("User-Agent", user_agent.to_string()),
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
        ),
        ("Accept-Language", accept_language(language)),
        ("Cache-Control", "max-age=0".to_string()),
        ("DNT", "1".to_string()),
        ("Upgrade-Insecure-Requests", "1".to_string()),
        ("Sec-Fetch-Dest", "document".to_string()),
        ("Sec-Fetch-Mode", "navigate".to_string()),
        ("Sec-Fetch-Site", "none".to_string()),
        ("Sec-Fetch-User", "?1".to_string()),
    ];

    // Client hints are only sent by Chromium-based browsers.
    if user_agent.contains("Chrome/") && !user_agent.contains("Mobile") {
        headers.push((
            "Sec-Ch-Ua",
            "\"Chromium\";v=\"131\", \"Not_A Brand\";v=\"24\", \"Google Chrome\";v=\"131\""
                .to_string(),
        ));
        headers.push(("Sec-Ch-Ua-Mobile", "?0".to_string()));
    }

    headers
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn accept_language(language: &str) -> String {
    let language = language.trim();
    if language.is_empty() || language.eq_ignore_ascii_case("en") {
        "en-US,en;q=0.9".to_string()
    } else {
        format!("{language},en;q=0.8")
    }
}

/// Pick a random delay in `range` (milliseconds, inclusive).
pub fn jitter(range: (u64, u64)) -> Duration {
    let (min, max) = range;
    if max == 0 || min >= max {
        return Duration::from_millis(min);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min..=max))
}
