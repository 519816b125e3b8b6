//! Search provider implementations.
//!
//! Each module provides a struct implementing [`crate::engine::SearchProvider`]
//! plus the [`crate::extract::SelectorProfile`] describing that provider's
//! result page.

pub mod bing;
pub mod duckduckgo;
pub mod google;

pub use bing::BingEngine;
pub use duckduckgo::DuckDuckGoEngine;
pub use google::GoogleEngine;

use std::sync::Arc;

use crate::engine::{ProviderCore, SearchProvider};
use crate::types::ProviderKind;

/// Construct the engine for `kind` around `core`.
pub fn build(kind: ProviderKind, core: ProviderCore) -> Arc<dyn SearchProvider> {
    match kind {
        ProviderKind::Google => Arc::new(GoogleEngine::new(core)),
        ProviderKind::Bing => Arc::new(BingEngine::new(core)),
        ProviderKind::DuckDuckGo => Arc::new(DuckDuckGoEngine::new(core)),
    }
}
