use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Log configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogConfig {
    /// Log file path, if not set, logs will be printed to stdout
    pub file: Option<PathBuf>,
    /// Log level, default is "info"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: default_log_level(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Listening address
    #[serde(default = "default_server_addr")]
    pub addr: String,
    /// Largest accepted request body, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_server_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Promotion source configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourceConfig {
    /// File loaded at startup and overwritten by uploads
    #[serde(default = "default_source_path")]
    pub path: PathBuf,
    /// Refuse to start when the initial load fails
    #[serde(default)]
    pub required: bool,
}

fn default_source_path() -> PathBuf {
    PathBuf::from("data/promotions.csv")
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
            required: false,
        }
    }
}

/// promostore configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub source: SourceConfig,

    /// Log configuration
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml(&config_str).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("'{}': {}", path.display(), msg)),
            other => other,
        })
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.addr.trim().is_empty() {
            return Err(Error::Config("server.addr must not be empty".to_string()));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(Error::Config(
                "server.max_upload_bytes must be greater than 0".to_string(),
            ));
        }
        if self.source.path.as_os_str().is_empty() {
            return Err(Error::Config("source.path must not be empty".to_string()));
        }
        Ok(())
    }
}
