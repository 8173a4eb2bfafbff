//! Application configuration.

use std::path::Path;

use iex_feed::config::DecoderConfig;
use iex_feed::synthetic::SyntheticConfig;
use serde::{Deserialize, Serialize};

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "IEX_DISSECT_CONFIG";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application name
    pub name: String,
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit one JSON object per segment instead of text
    pub json: bool,
    /// Print decoded quotes and anomalies under each summary line
    pub detail: bool,
    /// Decoder configuration
    pub decoder: DecoderConfig,
    /// Synthetic feed configuration
    pub synthetic: SyntheticConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "iex-dissect".to_string(),
            log_level: "info".to_string(),
            json: false,
            detail: false,
            decoder: DecoderConfig::default(),
            synthetic: SyntheticConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from the file named by `IEX_DISSECT_CONFIG`, defaults otherwise
    pub fn from_env() -> anyhow::Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
