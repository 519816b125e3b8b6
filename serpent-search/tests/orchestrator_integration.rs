//! Integration tests for the search manager.
//!
//! Mock providers exercise fan-out, failure isolation, deadlines and
//! merging without network calls. The end-to-end tests drive real engines
//! through the `reqwest` transport against a local `wiremock` server.

use async_trait::async_trait;
use chrono::Utc;
use serpent_search::engines::{BingEngine, DuckDuckGoEngine};
use serpent_search::http::{ReqwestTransport, Transport};
use serpent_search::render::{ChromiumRenderer, Renderer};
use serpent_search::types::ResultMetadata;
use serpent_search::{
    EngineConfig, FilterPipeline, ProviderCore, ProviderTarget, ResultType, SearchError,
    SearchManager, SearchProvider, SearchRequest, SearchResult,
};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

enum Behaviour {
    Results(Vec<SearchResult>),
    Slow(Duration, Vec<SearchResult>),
    Transport,
    Captcha,
    Panic,
}

struct MockProvider {
    name: &'static str,
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl MockProvider {
    fn new(name: &'static str, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            name,
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SearchProvider for MockProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn capabilities(&self) -> Vec<String> {
        vec!["basic".into(), "text".into()]
    }

    async fn search(&self, _request: &SearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Results(results) => Ok(results.clone()),
            Behaviour::Slow(delay, results) => {
                tokio::time::sleep(*delay).await;
                Ok(results.clone())
            }
            Behaviour::Transport => Err(SearchError::Transport(format!(
                "{} returned HTTP 503",
                self.name
            ))),
            Behaviour::Captcha => Err(SearchError::CaptchaDetected(self.name.to_string())),
            Behaviour::Panic => panic!("{} blew up", self.name),
        }
    }

    fn set_rate_limit(&self, _requests_per_minute: i32) {}

    fn rate_limit(&self) -> i32 {
        0
    }
}

fn make_result(url: &str, provider: &str, rank: usize) -> SearchResult {
    let domain = url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();
    SearchResult {
        title: format!("Result {rank} from {provider}"),
        url: url.to_string(),
        description: format!("A description about rust from {provider}"),
        is_ad: false,
        rank,
        keywords: BTreeSet::from(["rust".to_string()]),
        metadata: ResultMetadata {
            domain,
            fetched_at: Utc::now(),
            result_type: ResultType::Organic,
            search_feature: None,
            provider: provider.to_string(),
            deeplinks: Vec::new(),
        },
    }
}

fn ranked(provider: &str, urls: &[&str]) -> Vec<SearchResult> {
    urls.iter()
        .enumerate()
        .map(|(i, url)| make_result(url, provider, i + 1))
        .collect()
}

fn manager_with(providers: Vec<Arc<MockProvider>>) -> SearchManager {
    let manager = SearchManager::new();
    for provider in providers {
        manager.register(provider);
    }
    manager
}

// ── fan-out and failure isolation ──────────────────────────────────────

#[tokio::test]
async fn one_success_two_transport_failures() {
    let manager = manager_with(vec![
        MockProvider::new("Google", Behaviour::Transport),
        MockProvider::new("Bing", Behaviour::Results(ranked("Bing", &["https://a.example"]))),
        MockProvider::new("DuckDuckGo", Behaviour::Transport),
    ]);

    let results = manager
        .search_all(&SearchRequest::new("rust"))
        .await
        .expect("partial failure is tolerated");
    assert_eq!(results.len(), 1);
    assert_eq!(results["Bing"].len(), 1);

    let metrics = manager.metrics();
    assert_eq!(metrics.total_searches, 3);
    assert_eq!(metrics.successful_searches, 1);
    assert_eq!(metrics.failed_searches, 2);
}

#[tokio::test]
async fn all_failures_aggregate_every_provider() {
    let manager = manager_with(vec![
        MockProvider::new("Google", Behaviour::Captcha),
        MockProvider::new("Bing", Behaviour::Transport),
        MockProvider::new("DuckDuckGo", Behaviour::Transport),
    ]);

    let err = manager
        .search_all(&SearchRequest::new("rust"))
        .await
        .expect_err("every provider failed");
    let SearchError::AllProvidersFailed(detail) = &err else {
        panic!("expected AllProvidersFailed, got {err:?}");
    };
    for name in ["Google", "Bing", "DuckDuckGo"] {
        assert!(detail.contains(name), "{name} missing from {detail}");
    }
    assert!(detail.contains("captcha"));
    assert_eq!(manager.metrics().failed_searches, 3);
}

#[tokio::test]
async fn panicking_provider_is_isolated() {
    let manager = manager_with(vec![
        MockProvider::new("Google", Behaviour::Panic),
        MockProvider::new("Bing", Behaviour::Results(ranked("Bing", &["https://a.example"]))),
    ]);

    let results = manager
        .search_all(&SearchRequest::new("rust"))
        .await
        .expect("panic in one provider is a provider failure");
    assert_eq!(results.len(), 1);
    assert!(results.contains_key("Bing"));
    assert_eq!(manager.metrics().failed_searches, 1);
}

#[tokio::test(start_paused = true)]
async fn providers_run_concurrently() {
    let delay = Duration::from_secs(1);
    let manager = manager_with(vec![
        MockProvider::new("Google", Behaviour::Slow(delay, ranked("Google", &["https://g.example"]))),
        MockProvider::new("Bing", Behaviour::Slow(delay, ranked("Bing", &["https://b.example"]))),
        MockProvider::new(
            "DuckDuckGo",
            Behaviour::Slow(delay, ranked("DuckDuckGo", &["https://d.example"])),
        ),
    ]);

    let started = tokio::time::Instant::now();
    let results = manager
        .search_all(&SearchRequest::new("rust"))
        .await
        .expect("all succeed");
    assert_eq!(results.len(), 3);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn deadline_keeps_finished_results() {
    let manager = manager_with(vec![
        MockProvider::new("Bing", Behaviour::Results(ranked("Bing", &["https://fast.example"]))),
        MockProvider::new(
            "Google",
            Behaviour::Slow(Duration::from_secs(60), ranked("Google", &["https://slow.example"])),
        ),
    ]);
    let request = SearchRequest {
        timeout: Duration::from_secs(2),
        ..SearchRequest::new("rust")
    };

    let started = tokio::time::Instant::now();
    let results = manager.search_all(&request).await.expect("fast provider finished");
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(results.len(), 1);
    assert!(results.contains_key("Bing"));

    let metrics = manager.metrics();
    assert_eq!(metrics.successful_searches, 1);
    assert_eq!(metrics.failed_searches, 1);
}

#[tokio::test(start_paused = true)]
async fn deadline_with_no_finished_provider_is_aggregate_timeout() {
    let manager = manager_with(vec![MockProvider::new(
        "Google",
        Behaviour::Slow(Duration::from_secs(60), Vec::new()),
    )]);
    let request = SearchRequest {
        timeout: Duration::from_secs(1),
        ..SearchRequest::new("rust")
    };

    let err = manager.search_all(&request).await.expect_err("timed out");
    let SearchError::AllProvidersFailed(detail) = &err else {
        panic!("expected AllProvidersFailed, got {err:?}");
    };
    assert!(detail.contains("Google"));
    assert!(detail.contains("timed out"));
}

// ── dispatch, merge and filters ────────────────────────────────────────

#[tokio::test]
async fn named_target_searches_only_that_provider() {
    let google = MockProvider::new("Google", Behaviour::Results(ranked("Google", &["https://g.example"])));
    let bing = MockProvider::new("Bing", Behaviour::Results(ranked("Bing", &["https://b.example"])));
    let manager = manager_with(vec![Arc::clone(&google), Arc::clone(&bing)]);

    let request = SearchRequest {
        target: ProviderTarget::parse("GOOGLE"),
        ..SearchRequest::new("rust")
    };
    let results = manager
        .search(&request, &FilterPipeline::new())
        .await
        .expect("named search");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].metadata.provider, "Google");
    assert_eq!(google.calls.load(Ordering::SeqCst), 1);
    assert_eq!(bing.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_target_fails_without_dispatch() {
    let google = MockProvider::new("Google", Behaviour::Results(Vec::new()));
    let manager = manager_with(vec![Arc::clone(&google)]);

    let request = SearchRequest {
        target: ProviderTarget::parse("yahoo"),
        ..SearchRequest::new("rust")
    };
    let err = manager
        .search(&request, &FilterPipeline::new())
        .await
        .expect_err("unknown provider");
    assert!(matches!(err, SearchError::InvalidConfiguration(_)));
    assert_eq!(google.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn merged_results_are_deduplicated_in_provider_order() {
    let manager = manager_with(vec![
        MockProvider::new(
            "Google",
            Behaviour::Results(ranked("Google", &["https://www.shared.example/", "https://g.example"])),
        ),
        MockProvider::new(
            "Bing",
            Behaviour::Results(ranked("Bing", &["https://b.example", "http://shared.example"])),
        ),
    ]);

    let results = manager
        .search(&SearchRequest::new("rust"), &FilterPipeline::new())
        .await
        .expect("merged");
    let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://b.example", "http://shared.example", "https://g.example"]
    );
    assert_eq!(results[1].metadata.provider, "Bing");
    assert_eq!(results[1].rank, 2);
}

#[tokio::test]
async fn filters_run_after_merge() {
    let manager = manager_with(vec![
        MockProvider::new(
            "Google",
            Behaviour::Results(ranked("Google", &["https://docs.rs/a", "https://spam.example"])),
        ),
        MockProvider::new("Bing", Behaviour::Results(ranked("Bing", &["https://docs.rs/b"]))),
    ]);

    let filters = FilterPipeline::new()
        .include_domain("docs.rs")
        .keyword("rust")
        .result_type(ResultType::Organic);
    let results = manager
        .search(&SearchRequest::new("rust"), &filters)
        .await
        .expect("filtered");
    let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec!["https://docs.rs/b", "https://docs.rs/a"]);
}

#[tokio::test]
async fn capabilities_report_registered_providers() {
    let manager = manager_with(vec![
        MockProvider::new("Google", Behaviour::Transport),
        MockProvider::new("Bing", Behaviour::Transport),
    ]);
    let infos = manager.capabilities();
    assert_eq!(infos.len(), 2);
    assert_eq!(infos[0].name, "Bing");
    assert_eq!(infos[1].name, "Google");
    assert!(infos.iter().all(|i| i.capabilities.contains(&"text".to_string())));
}

// ── end-to-end through real engines ────────────────────────────────────

const BING_HTML: &str = r#"<html><body><ol id="b_results">
<li class="b_algo">
    <h2><a href="https://www.rust-lang.org/">Rust Programming Language</a></h2>
    <div class="b_caption"><p>A language empowering everyone to build reliable software in Rust.</p></div>
</li>
<li class="b_algo">
    <h2><a href="https://doc.rust-lang.org/book/">The Rust Book</a></h2>
    <div class="b_caption"><p>An introductory book about Rust.</p></div>
</li>
</ol></body></html>"#;

const DDG_HTML: &str = r#"<html><body>
<div class="result web-result">
    <h2 class="result__title"><a class="result__a" href="https://rust-lang.org">Rust</a></h2>
    <div class="result__snippet">Official site of Rust.</div>
</div>
<div class="result web-result">
    <h2 class="result__title"><a class="result__a" href="https://crates.io/">crates.io</a></h2>
    <div class="result__snippet">The Rust community's crate registry.</div>
</div>
</body></html>"#;

const CAPTCHA_HTML: &str = r#"<html><body>
<p>Our systems have detected unusual traffic from your computer network.</p>
<form id="captcha-form"></form>
</body></html>"#;

fn core() -> ProviderCore {
    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new().expect("transport"));
    let renderer: Arc<dyn Renderer> = Arc::new(ChromiumRenderer::new());
    ProviderCore::new(EngineConfig::without_delays(), transport, renderer).expect("core")
}

#[tokio::test]
async fn end_to_end_fan_out_against_mock_server() {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BING_HTML))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/html/"))
        .and(query_param("q", "rust"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DDG_HTML))
        .expect(1)
        .mount(&server)
        .await;

    let manager = SearchManager::new();
    manager.register(Arc::new(BingEngine::new(core()).with_base_url(server.uri())));
    manager.register(Arc::new(DuckDuckGoEngine::new(core()).with_base_url(server.uri())));

    let per_provider = manager
        .search_all(&SearchRequest::new("rust"))
        .await
        .expect("search should succeed");
    assert_eq!(per_provider["Bing"].len(), 2);
    assert_eq!(per_provider["DuckDuckGo"].len(), 2);

    let merged = SearchManager::deduplicate(per_provider);
    let urls: Vec<&str> = merged.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://www.rust-lang.org/",
            "https://doc.rust-lang.org/book/",
            "https://crates.io/",
        ]
    );
    assert_eq!(merged[0].metadata.provider, "Bing");
    assert_eq!(merged[2].metadata.provider, "DuckDuckGo");
    assert!(merged.iter().all(|r| r.keywords.contains("rust")));

    let filtered = FilterPipeline::new().exclude_domain("crates").apply(merged);
    assert_eq!(filtered.len(), 2);
}

#[tokio::test]
async fn captcha_page_fails_only_that_provider() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CAPTCHA_HTML))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DDG_HTML))
        .mount(&server)
        .await;

    let manager = SearchManager::new();
    manager.register(Arc::new(BingEngine::new(core()).with_base_url(server.uri())));
    manager.register(Arc::new(DuckDuckGoEngine::new(core()).with_base_url(server.uri())));

    let bing_err = manager
        .search_one("bing", &SearchRequest::new("rust"))
        .await
        .expect_err("captcha page");
    assert!(matches!(bing_err, SearchError::CaptchaDetected(ref p) if p == "Bing"));
    assert!(bing_err.suggests_mode_switch());

    let results = manager
        .search_all(&SearchRequest::new("rust"))
        .await
        .expect("DuckDuckGo still answers");
    assert_eq!(results.len(), 1);
    assert_eq!(results["DuckDuckGo"].len(), 2);

    let metrics = manager.metrics();
    assert_eq!(metrics.total_searches, 3);
    assert_eq!(metrics.failed_searches, 2);
}
