//! Server configuration
//!
//! Values are layered, later layers winning:
//!
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. `RENTBOOK_*` environment variables
//! 4. command-line flags (applied by the binary)

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(ConfigError::Invalid(format!("unknown log format '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory of the sled database; in-memory storage when unset
    pub data_dir: Option<PathBuf>,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
    pub default_page_limit: usize,
    pub max_page_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            data_dir: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            default_page_limit: 100,
            max_page_limit: 1000,
        }
    }
}

fn parse<T: FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{} has an invalid value '{}'", var, value)))
}

impl ServerConfig {
    /// Defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay `RENTBOOK_*` variables read through `lookup`
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("RENTBOOK_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("RENTBOOK_PORT") {
            self.port = parse("RENTBOOK_PORT", &port)?;
        }
        if let Some(dir) = lookup("RENTBOOK_DATA_DIR") {
            self.data_dir = (!dir.trim().is_empty()).then(|| PathBuf::from(dir));
        }
        if let Some(level) = lookup("RENTBOOK_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(format) = lookup("RENTBOOK_LOG_FORMAT") {
            self.log_format = format.parse()?;
        }
        if let Some(limit) = lookup("RENTBOOK_DEFAULT_PAGE_LIMIT") {
            self.default_page_limit = parse("RENTBOOK_DEFAULT_PAGE_LIMIT", &limit)?;
        }
        if let Some(limit) = lookup("RENTBOOK_MAX_PAGE_LIMIT") {
            self.max_page_limit = parse("RENTBOOK_MAX_PAGE_LIMIT", &limit)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_limit == 0 || self.max_page_limit == 0 {
            return Err(ConfigError::Invalid("page limits must be greater than 0".into()));
        }
        if self.default_page_limit > self.max_page_limit {
            return Err(ConfigError::Invalid(format!(
                "default_page_limit ({}) exceeds max_page_limit ({})",
                self.default_page_limit, self.max_page_limit
            )));
        }
        self.socket_addr().map(|_| ())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid listen address {}:{}", self.host, self.port)))
    }
}
