//! Per-provider engine configuration with sensible defaults.
//!
//! [`EngineConfig`] controls throttling, anti-fingerprint jitter and the
//! humanised interaction sequence used in rendered mode. The defaults are
//! tuned for polite scraping.

use std::time::Duration;

use crate::error::SearchError;

/// Configuration for one provider engine.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Requests per minute allowed to the provider. `<= 0` disables throttling.
    pub requests_per_minute: i32,
    /// Random delay range in milliseconds `(min, max)` before a direct fetch.
    pub request_delay_ms: (u64, u64),
    /// Random pause range in milliseconds after navigation and after scrolling
    /// in rendered mode.
    pub render_settle_ms: (u64, u64),
    /// Random scroll distance range in pixels applied after navigation.
    pub render_scroll_px: (u32, u32),
    /// Upper bound for one render session. The effective bound is the smaller
    /// of this and the time left on the caller's deadline.
    pub render_timeout: Duration,
    /// Custom identity pool. If `None`, rotates through the built-in list of
    /// browser User-Agents.
    pub user_agents: Option<Vec<String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 10,
            request_delay_ms: (0, 500),
            render_settle_ms: (500, 2500),
            render_scroll_px: (100, 500),
            render_timeout: Duration::from_secs(30),
            user_agents: None,
        }
    }
}

impl EngineConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - every `(min, max)` range must have `min <= max`
    /// - `render_timeout` must be greater than 0
    /// - a custom identity pool must not be empty
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.request_delay_ms.0 > self.request_delay_ms.1 {
            return Err(SearchError::InvalidConfiguration(
                "request_delay_ms min must be <= max".into(),
            ));
        }
        if self.render_settle_ms.0 > self.render_settle_ms.1 {
            return Err(SearchError::InvalidConfiguration(
                "render_settle_ms min must be <= max".into(),
            ));
        }
        if self.render_scroll_px.0 > self.render_scroll_px.1 {
            return Err(SearchError::InvalidConfiguration(
                "render_scroll_px min must be <= max".into(),
            ));
        }
        if self.render_timeout.is_zero() {
            return Err(SearchError::InvalidConfiguration(
                "render_timeout must be greater than 0".into(),
            ));
        }
        if let Some(pool) = &self.user_agents {
            if pool.iter().all(|ua| ua.trim().is_empty()) {
                return Err(SearchError::InvalidConfiguration(
                    "user_agents must contain at least one identity".into(),
                ));
            }
        }
        Ok(())
    }

    /// Configuration with all deliberate delays removed. Used by tests and
    /// by callers that run against local fixtures.
    pub fn without_delays() -> Self {
        Self {
            requests_per_minute: 0,
            request_delay_ms: (0, 0),
            render_settle_ms: (0, 0),
            ..Default::default()
        }
    }
}
