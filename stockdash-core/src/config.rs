//! Dashboard configuration.
//!
//! Stored as TOML; every key is optional. Lookup order is an explicit path,
//! then `{config_dir}/stockdash/config.toml`, then built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::data::yahoo::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};

pub const DEFAULT_CATALOG_PATH: &str = "stock_tickers.txt";
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;
/// One hundred years.
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("parse config TOML: {0}")]
    Parse(String),

    #[error("serialize config: {0}")]
    Serialize(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    Unbounded,
    #[default]
    Lru,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub policy: CachePolicy,
    /// Entry limit for the `lru` policy.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy: CachePolicy::Lru,
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Yahoo,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Directory of `{TICKER}.csv` files for the `csv` provider.
    pub data_dir: PathBuf,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub base_url: String,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Yahoo,
            data_dir: PathBuf::from("data"),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
    /// Log file for the terminal dashboard.
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file: PathBuf::from("stockdash.log"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub catalog_path: PathBuf,
    /// Default date range length ending today.
    pub lookback_days: i64,
    pub cache: CacheConfig,
    pub provider: ProviderConfig,
    pub logging: LoggingConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            cache: CacheConfig::default(),
            provider: ProviderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// `{config_dir}/stockdash/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("stockdash").join("config.toml"))
    }

    /// Resolve configuration.
    ///
    /// An explicit path must exist. The default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            tracing::debug!(path = %path.display(), "loading config");
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(ConfigError::Invalid(format!(
                "lookback_days must be between 1 and {MAX_LOOKBACK_DAYS}, got {}",
                self.lookback_days
            )));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Invalid("provider.timeout_secs must be >= 1".into()));
        }
        Ok(())
    }
}
