//! # serpent
//!
//! Host layer for [`serpent_search`]: TOML configuration, logging setup,
//! application directories and filesystem capture of raw result pages.
//!
//! ```no_run
//! # async fn example() -> serpent::error::Result<()> {
//! use serpent::config::SerpentConfig;
//! use serpent_search::FilterPipeline;
//!
//! let config = SerpentConfig::from_file(&SerpentConfig::default_config_path())?;
//! let _guard = serpent::logging::init_logging(&config.logging)?;
//! let manager = serpent::build_manager(&config)?;
//!
//! let results = manager
//!     .search(&config.request("rust async runtime"), &FilterPipeline::new())
//!     .await?;
//! for result in &results {
//!     println!("[{}] {} {}", result.metadata.provider, result.title, result.url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod debug_sink;
pub mod error;
pub mod logging;
pub mod serpent_dirs;

use std::sync::Arc;

use serpent_search::debug::DebugSink;
use serpent_search::http::{ReqwestTransport, Transport};
use serpent_search::render::{ChromiumRenderer, Renderer};
use serpent_search::{ProviderCore, ProviderKind, SearchManager, engines};

use crate::config::SerpentConfig;
use crate::debug_sink::FileDebugSink;
use crate::error::{Result, SerpentError};

/// Build a [`SearchManager`] with every enabled provider registered.
///
/// Providers share one HTTP client and one renderer; each gets its own rate
/// limiter from its settings. With debug capture enabled, every provider
/// writes raw pages to a [`FileDebugSink`].
///
/// # Errors
///
/// Returns [`SerpentError::Config`] if no provider is enabled, or a search
/// error if a provider's settings are invalid or the HTTP client cannot be
/// built.
pub fn build_manager(config: &SerpentConfig) -> Result<SearchManager> {
    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new()?);
    let renderer: Arc<dyn Renderer> = Arc::new(ChromiumRenderer::new());
    let sink: Option<Arc<dyn DebugSink>> = config.debug.enabled.then(|| {
        let dir = config.debug.artifact_dir();
        tracing::info!(dir = %dir.display(), "debug capture enabled");
        Arc::new(FileDebugSink::new(dir)) as Arc<dyn DebugSink>
    });

    let manager = SearchManager::new();
    for kind in ProviderKind::all() {
        let settings = config.providers.get(*kind);
        if !settings.enabled {
            tracing::debug!(provider = kind.name(), "provider disabled");
            continue;
        }
        let mut core = ProviderCore::new(
            settings.engine_config(),
            Arc::clone(&transport),
            Arc::clone(&renderer),
        )?;
        if let Some(sink) = &sink {
            core = core.with_debug_sink(Arc::clone(sink));
        }
        manager.register(engines::build(*kind, core));
    }

    if manager.is_empty() {
        return Err(SerpentError::Config("no providers enabled".into()));
    }
    Ok(manager)
}
