//! Tracing subscriber setup.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{Result, SerpentError};

const LOG_FILE_PREFIX: &str = "serpent.log";

/// `RUST_LOG` if set, otherwise `default_directive`.
///
/// # Errors
///
/// Returns [`SerpentError::Config`] if `default_directive` does not parse.
pub fn env_filter(default_directive: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_directive)
        .map_err(|e| SerpentError::Config(format!("invalid log level '{default_directive}': {e}")))
}

/// Install the global subscriber. With a log directory configured, output
/// goes to a daily-rolled file through a non-blocking writer and the
/// returned guard must be held until shutdown to flush it.
///
/// # Errors
///
/// Returns an error if the filter does not parse, the log directory cannot
/// be created, or a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = env_filter(&config.level)?;

    let Some(dir) = &config.log_dir else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| SerpentError::Config(format!("logging already initialised: {e}")))?;
        return Ok(None);
    };

    std::fs::create_dir_all(dir)?;
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| SerpentError::Config(format!("logging already initialised: {e}")))?;
    Ok(Some(guard))
}
