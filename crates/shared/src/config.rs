//! Configuration management for the MAL meta-provider.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Data directory settings
    #[serde(default)]
    pub data: DataConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Upstream service base URLs
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Meta-provider settings
    #[serde(default)]
    pub meta: MetaConfig,
}

/// Data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root data directory path
    pub root_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log directory path (relative to data directory or absolute)
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User agent sent to every upstream site
    pub user_agent: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Base URLs of the scraped sites and lookup services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// MyAnimeList site
    pub mal: String,

    /// MALSync cross-reference API
    pub malsync: String,

    /// Kitsu GraphQL endpoint
    pub kitsu: String,

    /// Filler list raw file root
    pub filler: String,

    /// Enime API
    pub enime: String,

    /// MangaKakalot site
    pub mangakakalot: String,

    /// Manganato mirror used by MangaKakalot
    pub manganato: String,
}

/// Meta-provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    /// Content provider used for episode resolution
    pub provider: String,

    /// Manga provider used for chapter lookups
    pub manga_provider: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root_dir: "data".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            default_level: "info".to_string(),
            console: true,
            file: false,
            json_format: false,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/107.0.0.0 Safari/537.36 Edg/107.0.1418.35".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            mal: "https://myanimelist.net".to_string(),
            malsync: "https://api.malsync.moe".to_string(),
            kitsu: "https://kitsu.io/api/graphql".to_string(),
            filler: "https://raw.githubusercontent.com/saikou-app/mal-id-filler-list/main/fillers"
                .to_string(),
            enime: "https://api.enime.moe".to_string(),
            mangakakalot: "https://mangakakalot.com".to_string(),
            manganato: "https://readmanganato.com".to_string(),
        }
    }
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            provider: "enime".to_string(),
            manga_provider: "mangakakalot".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration saved successfully"
        );

        Ok(())
    }

    /// Get the path for the data directory
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data.root_dir)
    }

    /// Get the absolute path for the log directory
    pub fn log_dir(&self) -> PathBuf {
        let log_path = Path::new(&self.logging.log_dir);
        if log_path.is_absolute() {
            log_path.to_path_buf()
        } else {
            self.data_dir().join(log_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.root_dir, "data");
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.endpoints.malsync, "https://api.malsync.moe");
        assert_eq!(config.meta.provider, "enime");
    }

    #[test]
    fn test_save_and_load_config() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");

        let mut original_config = Config::default();
        original_config.meta.provider = "custom".to_string();
        original_config.save(&config_path)?;

        assert!(config_path.exists());

        let loaded_config = Config::from_file(&config_path)?;
        assert_eq!(loaded_config.meta.provider, "custom");
        assert_eq!(
            loaded_config.endpoints.kitsu,
            original_config.endpoints.kitsu
        );

        Ok(())
    }

    #[test]
    fn test_partial_config_fills_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[http]\nuser_agent = \"test-agent\"\ntimeout_secs = 5\n")?;

        let config = Config::from_file(&config_path)?;
        assert_eq!(config.http.user_agent, "test-agent");
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.endpoints.mal, "https://myanimelist.net");

        Ok(())
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        // Should return default config without error
        assert_eq!(config.data.root_dir, "data");
    }

    #[test]
    fn test_path_resolution() {
        let config = Config::default();
        assert!(config.log_dir().ends_with("data/logs"));
    }
}
