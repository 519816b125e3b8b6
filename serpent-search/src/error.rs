//! Error types for the serpent-search crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. Proxy credentials never appear in messages.

/// Errors that can occur while searching a provider or orchestrating several.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The request or engine configuration is unusable (malformed proxy,
    /// unknown provider, inverted bounds). Raised before any I/O.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A network request failed or returned a non-success status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider served a bot-check page instead of results.
    #[error("captcha detected on {0} - retry in rendered mode or through a different proxy")]
    CaptchaDetected(String),

    /// The headless browser session failed.
    #[error("render error: {0}")]
    Render(String),

    /// The shared deadline expired before the provider finished.
    #[error("search timed out: {0}")]
    Timeout(String),

    /// A selector or snapshot could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Every provider in a fan-out failed.
    #[error("all providers failed: {0}")]
    AllProvidersFailed(String),
}

impl SearchError {
    /// Whether the caller may reasonably retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout(_) | Self::Render(_)
        )
    }

    /// Whether the failure suggests switching fetch mode or egress path
    /// rather than retrying as-is.
    pub fn suggests_mode_switch(&self) -> bool {
        matches!(self, Self::CaptchaDetected(_))
    }
}

/// Convenience type alias for serpent-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
