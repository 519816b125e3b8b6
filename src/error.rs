//! Error types for the serpent host layer.

use serpent_search::SearchError;

/// Top-level error type for the host layer.
#[derive(Debug, thiserror::Error)]
pub enum SerpentError {
    /// Configuration could not be loaded, saved or applied.
    #[error("config error: {0}")]
    Config(String),

    /// Search core error.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SerpentError>;
