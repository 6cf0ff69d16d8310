//! Configuration management.

use crate::{ConfigError, ConfigResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default log level for the interactive client.
pub const DEFAULT_LOG_LEVEL: &str = "warn";
/// Address the bridge service listens on when run locally.
pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Rows per table page.
pub const DEFAULT_PAGE_SIZE: u64 = 50;
/// Period between monitor pull+fetch cycles.
pub const DEFAULT_MONITOR_INTERVAL_MS: u64 = 3_000;
/// Query executions kept in the history scrollback.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;
/// Packages shown at once after client-side filtering.
pub const DEFAULT_PACKAGE_RENDER_LIMIT: usize = 100;

const ENV_LOG_LEVEL: &str = "DBTAP_LOG_LEVEL";
const ENV_BRIDGE_URL: &str = "DBTAP_BRIDGE_URL";

/// Client configuration, stored as JSON at `~/.dbtap/config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Base URL of the device-database bridge.
    pub bridge_url: String,
    pub request_timeout_secs: u64,
    pub page_size: u64,
    pub monitor_interval_ms: u64,
    pub history_capacity: usize,
    pub package_render_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            bridge_url: DEFAULT_BRIDGE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            monitor_interval_ms: DEFAULT_MONITOR_INTERVAL_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            package_render_limit: DEFAULT_PACKAGE_RENDER_LIMIT,
        }
    }
}

impl Config {
    /// Load from the config file if present, then apply environment overrides.
    pub fn load(paths: &Paths) -> ConfigResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> ConfigResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Override fields from `DBTAP_*` variables resolved through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL).and_then(non_empty) {
            self.log_level = level;
        }
        if let Some(url) = lookup(ENV_BRIDGE_URL).and_then(non_empty) {
            self.bridge_url = url;
        }
    }

    /// Reject values that would make the client misbehave.
    pub fn validate(&self) -> ConfigResult<()> {
        self.bridge_url()?;
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be positive".into()));
        }
        if self.monitor_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "monitor_interval_ms must be positive".into(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid(
                "history_capacity must be positive".into(),
            ));
        }
        Ok(())
    }

    /// The bridge base URL, parsed.
    pub fn bridge_url(&self) -> ConfigResult<Url> {
        Url::parse(&self.bridge_url).map_err(ConfigError::from)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.bridge_url, DEFAULT_BRIDGE_URL);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.monitor_interval(), Duration::from_secs(3));
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.package_render_limit, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{ "log_level": "debug", "page_size": 25 }"#).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.page_size, 25);
        assert_eq!(config.bridge_url, DEFAULT_BRIDGE_URL);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config {
            bridge_url: "http://10.0.0.2:5000".to_string(),
            monitor_interval_ms: 1_500,
            ..Default::default()
        };
        config.save(&paths).unwrap();

        let loaded = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_nonexistent_uses_defaults() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_env_overrides_ignore_blank_values() {
        let env: HashMap<&str, &str> = [
            ("DBTAP_LOG_LEVEL", "  "),
            ("DBTAP_BRIDGE_URL", "http://bridge.local:8080"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.bridge_url, "http://bridge.local:8080");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = Config {
            bridge_url: "not a valid url".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = Config {
            page_size: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: page_size must be positive"
        );
    }
}
