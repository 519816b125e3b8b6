//! Debug artifact capture hook.
//!
//! When a request has `debug` set, engines hand every raw snapshot to a
//! [`DebugSink`] keyed by provider and fetch mode. Capture is best-effort
//! and never affects the search outcome.

use crate::request::FetchMode;

/// Receives raw page snapshots for offline selector maintenance.
pub trait DebugSink: Send + Sync {
    /// Persist `snapshot` for `provider` fetched in `mode`. Implementations
    /// log their own failures instead of returning them.
    ///
    /// Called from inside an async search on a runtime worker thread, so
    /// implementations must return promptly and hand slow I/O off (for
    /// example to [`tokio::task::spawn_blocking`]).
    fn persist(&self, provider: &str, mode: FetchMode, snapshot: &str);
}

/// Sink that discards everything. The default for engines.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDebugSink;

impl DebugSink for NoopDebugSink {
    fn persist(&self, provider: &str, mode: FetchMode, snapshot: &str) {
        tracing::trace!(
            provider,
            mode = mode.as_str(),
            bytes = snapshot.len(),
            "debug capture discarded"
        );
    }
}
