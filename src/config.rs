//! Application configuration.
//!
//! Configuration is stored as YAML at `$RICKDASH_CONFIG`, or in the platform
//! config directory (`.../rickdash/config.yaml`), and includes:
//! - The GraphQL endpoint and request timeout
//! - Search defaults (debounce delay, minimum search length)
//!
//! A missing file means defaults. `RICKDASH_ENDPOINT` overrides the endpoint.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RickdashError};
use crate::search::SearchOptions;

pub const DEFAULT_ENDPOINT: &str = "https://rickandmortyapi.com/graphql";

const CONFIG_ENV: &str = "RICKDASH_CONFIG";
const ENDPOINT_ENV: &str = "RICKDASH_ENDPOINT";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// GraphQL endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Total request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Search behavior defaults
    #[serde(default, skip_serializing_if = "SearchConfig::is_default")]
    pub search: SearchConfig,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout: default_request_timeout(),
            search: SearchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_debounce_delay_ms")]
    pub debounce_delay_ms: u64,
    #[serde(default)]
    pub min_search_length: usize,
}

fn default_debounce_delay_ms() -> u64 {
    300
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_delay_ms: default_debounce_delay_ms(),
            min_search_length: 0,
        }
    }
}

impl SearchConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = env::var(CONFIG_ENV)
            && !path.is_empty()
        {
            return Ok(PathBuf::from(path));
        }

        directories::ProjectDirs::from("", "", "rickdash")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
            .ok_or_else(|| RickdashError::Config("cannot determine config directory".to_string()))
    }

    /// Load configuration from the default location, or defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, or defaults if the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            RickdashError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.endpoint).map_err(|e| {
            RickdashError::Config(format!("invalid endpoint '{}': {}", self.endpoint, e))
        })?;
        if self.request_timeout == 0 {
            return Err(RickdashError::Config(
                "request_timeout must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    /// Endpoint from environment variable or config file
    pub fn endpoint(&self) -> String {
        if let Ok(endpoint) = env::var(ENDPOINT_ENV)
            && !endpoint.is_empty()
        {
            return endpoint;
        }
        self.endpoint.clone()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Coordinator options seeded from the search section.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            debounce_delay: Duration::from_millis(self.search.debounce_delay_ms),
            min_search_length: self.search.min_search_length,
            ..SearchOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.request_timeout, 30);
        assert_eq!(config.search.debounce_delay_ms, 300);
        assert_eq!(config.search.min_search_length, 0);
    }

    #[test]
    fn test_config_partial_yaml_uses_defaults() {
        let yaml = r#"
search:
  min_search_length: 2
"#;
        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.search.debounce_delay_ms, 300);
        assert_eq!(config.search.min_search_length, 2);
    }

    #[test]
    fn test_default_search_section_is_not_serialized() {
        let yaml = serde_yaml_ng::to_string(&Config::default()).unwrap();
        assert!(!yaml.contains("search"));
        assert!(yaml.contains("endpoint"));
    }

    #[test]
    fn test_search_options_from_config() {
        let mut config = Config::default();
        config.search.debounce_delay_ms = 150;
        config.search.min_search_length = 3;

        let options = config.search_options();
        assert_eq!(options.debounce_delay, Duration::from_millis(150));
        assert_eq!(options.min_search_length, 3);
        assert!(options.enabled);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("missing.yaml")).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.endpoint = "http://localhost:8080/graphql".to_string();
        config.request_timeout = 5;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.endpoint, "http://localhost:8080/graphql");
        assert_eq!(loaded.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_rejects_invalid_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "endpoint: not a url\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, RickdashError::Config(_)));
    }

    #[test]
    #[serial]
    fn test_endpoint_env_override() {
        let config = Config::default();
        // SAFETY: serialized with other tests touching the environment.
        unsafe { env::set_var(ENDPOINT_ENV, "http://127.0.0.1:9/graphql") };
        assert_eq!(config.endpoint(), "http://127.0.0.1:9/graphql");
        unsafe { env::remove_var(ENDPOINT_ENV) };
        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    #[serial]
    fn test_config_path_env_override() {
        unsafe { env::set_var(CONFIG_ENV, "/tmp/rickdash-test.yaml") };
        assert_eq!(
            Config::config_path().unwrap(),
            PathBuf::from("/tmp/rickdash-test.yaml")
        );
        unsafe { env::remove_var(CONFIG_ENV) };
    }
}
