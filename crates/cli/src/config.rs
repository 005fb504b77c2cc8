//! Configuration loading from toolgate.toml.

use catalog::UtilityProvider;
use engine::{DEFAULT_TIMEOUT, EngineConfig, OAuthProviderConfig};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Tool catalog file.
    #[serde(default = "default_catalog")]
    pub catalog: PathBuf,

    /// Secret database. Defaults to the user data directory.
    pub database: Option<PathBuf>,

    #[serde(default)]
    pub http: HttpConfig,

    /// OAuth settings keyed by provider name.
    #[serde(default)]
    pub oauth: BTreeMap<String, OAuthProviderConfig>,
}

/// Outbound HTTP settings.
#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_catalog() -> PathBuf {
    PathBuf::from("tools.toml")
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        for provider in config.oauth.keys() {
            provider.parse::<UtilityProvider>()?;
        }
        if config.http.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(config)
    }

    /// Configuration used when no file is present.
    pub fn default_config() -> Self {
        Self {
            catalog: default_catalog(),
            database: None,
            http: HttpConfig::default(),
            oauth: BTreeMap::new(),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            timeout: Duration::from_secs(self.http.timeout_secs),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid oauth section: {0}")]
    Provider(#[from] catalog::Error),

    #[error("http.timeout_secs must be greater than zero")]
    ZeroTimeout,
}
