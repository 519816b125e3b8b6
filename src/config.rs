//! Host configuration, loaded from and saved to TOML.
//!
//! Every section is `#[serde(default)]`, so a partial file (or an empty
//! one) yields defaults for whatever it leaves out.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serpent_search::{EngineConfig, FetchMode, ProviderKind, SearchRequest};

use crate::error::{Result, SerpentError};
use crate::serpent_dirs;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerpentConfig {
    /// Request defaults.
    pub search: SearchDefaults,
    /// Per-provider settings.
    pub providers: ProvidersConfig,
    /// Log output.
    pub logging: LoggingConfig,
    /// Debug artifact capture.
    pub debug: DebugConfig,
}

/// Defaults applied to every request built from this configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    /// Results requested per provider.
    pub max_results: usize,
    /// Deadline for one search, in seconds.
    pub timeout_secs: u64,
    /// Keep sponsored results.
    pub include_ads: bool,
    /// Interface language code.
    pub language: String,
    /// Region code.
    pub region: String,
    /// Fetch through a headless browser instead of plain HTTP.
    pub rendered: bool,
    /// Egress proxy (`http`, `https` or `socks5` URL).
    pub proxy: Option<String>,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            max_results: 10,
            timeout_secs: 30,
            include_ads: false,
            language: "en".into(),
            region: "us".into(),
            rendered: false,
            proxy: None,
        }
    }
}

impl SearchDefaults {
    /// A request for `query` carrying these defaults.
    pub fn to_request(&self, query: impl Into<String>) -> SearchRequest {
        SearchRequest {
            max_results: self.max_results,
            timeout: Duration::from_secs(self.timeout_secs),
            include_ads: self.include_ads,
            language: self.language.clone(),
            region: self.region.clone(),
            mode: if self.rendered {
                FetchMode::Rendered
            } else {
                FetchMode::Direct
            },
            proxy: self.proxy.clone(),
            ..SearchRequest::new(query)
        }
    }
}

/// Settings for each built-in provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub google: ProviderSettings,
    pub bing: ProviderSettings,
    pub duckduckgo: ProviderSettings,
}

impl ProvidersConfig {
    /// Settings for `kind`.
    pub fn get(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::Google => &self.google,
            ProviderKind::Bing => &self.bing,
            ProviderKind::DuckDuckGo => &self.duckduckgo,
        }
    }
}

/// One provider's throttling and jitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Register this provider.
    pub enabled: bool,
    /// Requests per minute; `<= 0` disables throttling.
    pub requests_per_minute: i32,
    /// Random delay before a direct fetch, `[min, max]` milliseconds.
    pub request_delay_ms: (u64, u64),
    /// Upper bound for one render session, in seconds.
    pub render_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            enabled: true,
            requests_per_minute: engine.requests_per_minute,
            request_delay_ms: engine.request_delay_ms,
            render_timeout_secs: engine.render_timeout.as_secs(),
        }
    }
}

impl ProviderSettings {
    /// Engine configuration with these settings applied over the defaults.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            requests_per_minute: self.requests_per_minute,
            request_delay_ms: self.request_delay_ms,
            render_timeout: Duration::from_secs(self.render_timeout_secs),
            ..EngineConfig::default()
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Write daily-rolled log files here instead of stderr.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "serpent=info,serpent_search=info".into(),
            log_dir: None,
        }
    }
}

/// Debug artifact capture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Capture every fetched result page and raise diagnostics to debug level.
    pub enabled: bool,
    /// Capture directory; defaults to [`serpent_dirs::debug_dir`].
    pub artifact_dir: Option<PathBuf>,
}

impl DebugConfig {
    /// The directory captured pages are written to.
    pub fn artifact_dir(&self) -> PathBuf {
        self.artifact_dir
            .clone()
            .unwrap_or_else(serpent_dirs::debug_dir)
    }
}

impl SerpentConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SerpentError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SerpentError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path, [`serpent_dirs::config_file`].
    pub fn default_config_path() -> PathBuf {
        serpent_dirs::config_file()
    }

    /// A request for `query` from the search defaults, with the debug flag
    /// set when capture is enabled.
    pub fn request(&self, query: impl Into<String>) -> SearchRequest {
        SearchRequest {
            debug: self.debug.enabled,
            ..self.search.to_request(query)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SerpentConfig::default();
        assert!(config.search.max_results > 0);
        assert!(config.search.timeout_secs > 0);
        for kind in ProviderKind::all() {
            let settings = config.providers.get(*kind);
            assert!(settings.enabled);
            assert!(settings.engine_config().validate().is_ok());
        }
        assert!(!config.debug.enabled);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut config = SerpentConfig::default();
        config.search.max_results = 25;
        config.search.proxy = Some("socks5://127.0.0.1:9050".into());
        config.providers.google.enabled = false;
        config.providers.bing.request_delay_ms = (100, 900);
        config.debug.enabled = true;

        config.save_to_file(&path).expect("save");
        let loaded = SerpentConfig::from_file(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[search]\nmax_results = 3\n\n[providers.duckduckgo]\nrequests_per_minute = 30\n",
        )
        .expect("write");

        let config = SerpentConfig::from_file(&path).expect("load");
        assert_eq!(config.search.max_results, 3);
        assert_eq!(config.search.language, "en");
        assert_eq!(config.providers.duckduckgo.requests_per_minute, 30);
        assert!(config.providers.duckduckgo.enabled);
        assert_eq!(config.providers.google, ProviderSettings::default());
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = SerpentConfig::from_file(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(SerpentError::Io(_))));
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").expect("write");
        let result = SerpentConfig::from_file(&path);
        assert!(matches!(result, Err(SerpentError::Config(_))));
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = SerpentConfig::default_config_path();
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn to_request_carries_defaults() {
        let defaults = SearchDefaults {
            max_results: 7,
            timeout_secs: 12,
            include_ads: true,
            language: "de".into(),
            region: "at".into(),
            rendered: true,
            proxy: Some("http://proxy.local:8080".into()),
        };
        let request = defaults.to_request("rust");
        assert_eq!(request.query, "rust");
        assert_eq!(request.max_results, 7);
        assert_eq!(request.timeout, Duration::from_secs(12));
        assert!(request.include_ads);
        assert_eq!(request.language, "de");
        assert_eq!(request.region, "at");
        assert_eq!(request.mode, FetchMode::Rendered);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn debug_capture_sets_request_flag() {
        let mut config = SerpentConfig::default();
        assert!(!config.request("rust").debug);
        config.debug.enabled = true;
        assert!(config.request("rust").debug);
    }

    #[test]
    fn engine_config_applies_settings() {
        let settings = ProviderSettings {
            enabled: true,
            requests_per_minute: 4,
            request_delay_ms: (10, 20),
            render_timeout_secs: 5,
        };
        let engine = settings.engine_config();
        assert_eq!(engine.requests_per_minute, 4);
        assert_eq!(engine.request_delay_ms, (10, 20));
        assert_eq!(engine.render_timeout, Duration::from_secs(5));
    }
}
