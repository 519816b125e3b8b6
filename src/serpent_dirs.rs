//! Application directory paths.
//!
//! Uses the [`dirs`] crate for platform-appropriate resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | App data | `~/Library/Application Support/serpent/` | `~/.local/share/serpent/` |
//! | Config | `~/Library/Application Support/serpent/` | `~/.config/serpent/` |
//!
//! # Environment Overrides
//!
//! - `SERPENT_DATA_DIR` overrides [`data_dir`]
//! - `SERPENT_CONFIG_DIR` overrides [`config_dir`]

use std::ffi::OsString;
use std::path::PathBuf;

const APP_DIR: &str = "serpent";

fn resolve(override_dir: Option<OsString>, platform: Option<PathBuf>, fallback: &str) -> PathBuf {
    if let Some(dir) = override_dir {
        return PathBuf::from(dir);
    }
    platform
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(fallback))
}

/// Application data root. Override with `SERPENT_DATA_DIR`.
#[must_use]
pub fn data_dir() -> PathBuf {
    resolve(
        std::env::var_os("SERPENT_DATA_DIR"),
        dirs::data_dir(),
        "/tmp/serpent-data",
    )
}

/// Application config directory. Override with `SERPENT_CONFIG_DIR`.
#[must_use]
pub fn config_dir() -> PathBuf {
    resolve(
        std::env::var_os("SERPENT_CONFIG_DIR"),
        dirs::config_dir(),
        "/tmp/serpent-config",
    )
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Log file directory (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Captured result pages (`data_dir()/debug/`).
#[must_use]
pub fn debug_dir() -> PathBuf {
    data_dir().join("debug")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins() {
        let path = resolve(
            Some(OsString::from("/custom/dir")),
            Some(PathBuf::from("/home/user/.local/share")),
            "/tmp/x",
        );
        assert_eq!(path, PathBuf::from("/custom/dir"));
    }

    #[test]
    fn platform_dir_gets_app_suffix() {
        let path = resolve(None, Some(PathBuf::from("/home/user/.config")), "/tmp/x");
        assert_eq!(path, PathBuf::from("/home/user/.config/serpent"));
    }

    #[test]
    fn fallback_without_platform_dir() {
        assert_eq!(resolve(None, None, "/tmp/x"), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn derived_paths() {
        assert!(config_file().ends_with("config.toml"));
        assert!(logs_dir().ends_with("logs"));
        assert!(debug_dir().ends_with("debug"));
    }
}
