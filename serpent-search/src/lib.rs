//! # serpent-search
//!
//! Multi-provider search-result extraction and orchestration.
//!
//! This crate scrapes public search result pages (Google, Bing, DuckDuckGo)
//! into structured [`SearchResult`]s, runs several providers concurrently,
//! deduplicates their output by normalised URL and applies a fixed-order
//! filter pipeline. No API keys are involved.
//!
//! ## Design
//!
//! - Each provider is a [`SelectorProfile`](extract::SelectorProfile): ordered
//!   selector-fallback chains for containers, titles, URLs and descriptions
//! - Pages are fetched directly over HTTP or rendered in headless Chromium
//! - Per-provider rate limiting, user-agent rotation and request jitter
//! - Bot-check pages surface as [`SearchError::CaptchaDetected`] instead of
//!   empty result lists
//! - Partial failure is tolerated: a fan-out fails only if every provider does
//!
//! ## Security
//!
//! - Search queries are logged only at trace level
//! - Proxy credentials never appear in errors or logs
//! - No network listeners; this is a library, not a server

pub mod captcha;
pub mod classify;
pub mod config;
pub mod debug;
pub mod dom;
pub mod engine;
pub mod engines;
pub mod error;
pub mod extract;
pub mod filter;
pub mod http;
pub mod identity;
pub mod orchestrator;
pub mod rate_limit;
pub mod render;
pub mod request;
pub mod types;

pub use config::EngineConfig;
pub use engine::{ProviderCore, SearchProvider};
pub use error::{Result, SearchError};
pub use filter::FilterPipeline;
pub use orchestrator::{MetricsSnapshot, SearchManager};
pub use request::{FetchMode, ProviderTarget, SearchRequest};
pub use types::{ProviderKind, ResultType, SearchFeature, SearchResult};

use std::sync::Arc;

use http::ReqwestTransport;
use render::ChromiumRenderer;

/// Build a manager with every built-in provider registered, all sharing
/// one HTTP client and one renderer and each using `config`.
///
/// # Errors
///
/// Returns [`SearchError::InvalidConfiguration`] if `config` is invalid, or
/// [`SearchError::Transport`] if the HTTP client cannot be built.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> serpent_search::Result<()> {
/// use serpent_search::{EngineConfig, FilterPipeline, SearchRequest};
///
/// let manager = serpent_search::default_manager(EngineConfig::default())?;
/// let results = manager
///     .search(&SearchRequest::new("rust programming"), &FilterPipeline::new())
///     .await?;
/// for result in &results {
///     println!("{}. {} ({})", result.rank, result.title, result.url);
/// }
/// # Ok(())
/// # }
/// ```
pub fn default_manager(config: EngineConfig) -> Result<SearchManager> {
    let transport: Arc<dyn http::Transport> = Arc::new(ReqwestTransport::new()?);
    let renderer: Arc<dyn render::Renderer> = Arc::new(ChromiumRenderer::new());

    let manager = SearchManager::new();
    for kind in ProviderKind::all() {
        let core = ProviderCore::new(config.clone(), Arc::clone(&transport), Arc::clone(&renderer))?;
        manager.register(engines::build(*kind, core));
    }
    Ok(manager)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_manager_registers_every_provider() {
        let manager = default_manager(EngineConfig::default()).expect("manager");
        assert_eq!(manager.provider_names(), vec!["Bing", "DuckDuckGo", "Google"]);
        for info in manager.capabilities() {
            assert!(info.capabilities.contains(&"basic".to_string()));
            assert_eq!(info.rate_limit, rate_limit::DEFAULT_REQUESTS_PER_MINUTE);
        }
    }

    #[test]
    fn default_manager_rejects_invalid_config() {
        let config = EngineConfig {
            request_delay_ms: (500, 100),
            ..EngineConfig::default()
        };
        let err = default_manager(config).expect_err("inverted jitter range");
        assert!(matches!(err, SearchError::InvalidConfiguration(_)));
    }
}
