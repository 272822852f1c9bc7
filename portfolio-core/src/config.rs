//! Configuration management

use crate::error::{ErrorContext, PortfolioError, PortfolioResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Well-known key under which the bearer token is persisted
pub const TOKEN_STORAGE_KEY: &str = "authToken";

/// Identity service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the identity service
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: 30,
            user_agent: "portfolio/0.1".to_string(),
        }
    }
}

/// Client-side storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding persisted client state
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.portfolio".to_string(),
        }
    }
}

impl StorageConfig {
    /// Resolve the data directory, expanding a leading `~`
    pub fn resolved_data_dir(&self) -> PathBuf {
        if let Some(rest) = self.data_dir.strip_prefix("~") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest.trim_start_matches('/'));
            }
        }
        PathBuf::from(&self.data_dir)
    }

    /// Path of the persisted token slot
    pub fn token_path(&self) -> PathBuf {
        self.resolved_data_dir().join(TOKEN_STORAGE_KEY)
    }
}

/// Top-level client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PortfolioConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> PortfolioResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PortfolioError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: PortfolioConfig =
            toml::from_str(&content).map_err(|e| PortfolioError::Config {
                message: format!("Failed to parse config: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("config")
                    .with_operation("parse_toml")
                    .with_suggestion("Check TOML syntax in config file"),
            })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> PortfolioResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| PortfolioError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| PortfolioError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// `PORTFOLIO_API_URL` overrides the identity service base URL, mirroring
    /// the deployment knob the web frontend uses.
    pub fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var("PORTFOLIO_API_URL") {
            self.service.base_url = url;
        }
        if let Ok(dir) = std::env::var("PORTFOLIO_DATA_DIR") {
            self.storage.data_dir = dir;
        }
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> PortfolioResult<()> {
        if self.service.base_url.is_empty() {
            return Err(PortfolioError::Validation {
                message: "Identity service base URL must not be empty".to_string(),
                field: Some("service.base_url".to_string()),
                context: ErrorContext::new("config").with_operation("validate"),
            });
        }

        if !self.service.base_url.starts_with("http://")
            && !self.service.base_url.starts_with("https://")
        {
            return Err(PortfolioError::Validation {
                message: format!("Invalid identity service URL: {}", self.service.base_url),
                field: Some("service.base_url".to_string()),
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("The base URL must start with http:// or https://"),
            });
        }

        if self.service.timeout_seconds == 0 {
            return Err(PortfolioError::Validation {
                message: "Request timeout must be at least one second".to_string(),
                field: Some("service.timeout_seconds".to_string()),
                context: ErrorContext::new("config").with_operation("validate"),
            });
        }

        Ok(())
    }
}
