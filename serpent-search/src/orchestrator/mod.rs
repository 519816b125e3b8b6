//! Search orchestration: provider registry, concurrent fan-out, cross-provider
//! deduplication and attempt metrics.

pub mod dedup;
pub mod manager;
pub mod metrics;
pub mod url_normalize;

pub use manager::SearchManager;
pub use metrics::MetricsSnapshot;
