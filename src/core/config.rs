//! Configuration management for the docdex engine.
//!
//! This module handles loading configuration from TOML files and
//! environment variables, with sensible defaults for all settings.

use crate::core::error::{DocdexError, Result};
use crate::core::xdg::XdgDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory for the Tantivy index
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,

    /// Root directory for stored documents
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Search configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Default number of results when the request omits a limit
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Maximum results per query
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// Maximum query string length
    #[serde(default = "default_max_query_length")]
    pub max_query_length: usize,
}

// Default value functions
fn default_index_dir() -> PathBuf {
    PathBuf::from("./data/index")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data/documents")
}

fn default_limit() -> usize {
    10
}

fn default_max_limit() -> usize {
    100
}

fn default_max_query_length() -> usize {
    500
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_dir: default_index_dir(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            max_query_length: default_max_query_length(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| DocdexError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load config with priority: env vars > TOML > defaults
    ///
    /// This method uses XDG Base Directory specification for file locations.
    pub fn load() -> Result<Self> {
        let xdg = XdgDirs::new();
        Self::load_with_xdg(&xdg)
    }

    /// Load config with explicit XDG directories
    ///
    /// Priority order:
    /// 1. DOCDEX_CONFIG env var
    /// 2. XDG config file (~/.config/docdex/config.toml)
    /// 3. Defaults
    pub fn load_with_xdg(xdg: &XdgDirs) -> Result<Self> {
        xdg.log_paths();

        let mut config = if let Ok(config_path) = env::var("DOCDEX_CONFIG") {
            Self::from_file(config_path)?
        } else {
            let xdg_config = xdg.config_file();
            if xdg_config.exists() {
                Self::from_file(xdg_config)?
            } else {
                Self::default()
            }
        };

        // Anchor default storage paths under the XDG data directory when
        // not explicitly configured
        if env::var("DOCDEX_DATA_DIR").is_err() {
            if config.storage.index_dir == default_index_dir() {
                config.storage.index_dir = xdg.index_dir();
            }
            if config.storage.data_dir == default_data_dir() {
                config.storage.data_dir = xdg.documents_dir();
            }
        }

        config.merge_env();
        config.validate()?;

        Ok(config)
    }

    /// Merge configuration with environment variables
    pub fn merge_env(&mut self) {
        if let Ok(data_dir) = env::var("DOCDEX_DATA_DIR") {
            let base = PathBuf::from(data_dir);
            self.storage.index_dir = base.join("index");
            self.storage.data_dir = base.join("documents");
        }

        if let Ok(default_limit) = env::var("DOCDEX_DEFAULT_LIMIT") {
            if let Ok(n) = default_limit.parse() {
                self.search.default_limit = n;
            }
        }
        if let Ok(max_limit) = env::var("DOCDEX_MAX_LIMIT") {
            if let Ok(n) = max_limit.parse() {
                self.search.max_limit = n;
            }
        }
        if let Ok(max_query_len) = env::var("DOCDEX_MAX_QUERY_LENGTH") {
            if let Ok(len) = max_query_len.parse() {
                self.search.max_query_length = len;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.search.default_limit == 0 {
            return Err(DocdexError::ConfigError(
                "Default limit must be non-zero".to_string(),
            ));
        }

        if self.search.default_limit > self.search.max_limit {
            return Err(DocdexError::ConfigError(
                "Default limit cannot exceed max limit".to_string(),
            ));
        }

        if self.search.max_query_length == 0 {
            return Err(DocdexError::ConfigError(
                "Max query length must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Log configuration
    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Index dir: {:?}", self.storage.index_dir);
        tracing::info!("  Data dir: {:?}", self.storage.data_dir);
        tracing::info!("  Default limit: {}", self.search.default_limit);
        tracing::info!("  Max limit: {}", self.search.max_limit);
        tracing::info!("  Max query length: {}", self.search.max_query_length);
    }
}
