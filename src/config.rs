//! Configuration management for farescout
//!
//! Handles loading configuration from a TOML file and environment
//! variables, and provides validation for all settings. The loaded struct
//! is built once at startup and passed by reference into the components
//! that need it.

use crate::FarescoutError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for farescout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarescoutConfig {
    /// Tequila API configuration
    #[serde(default)]
    pub tequila: TequilaConfig,
    /// Fare search settings
    #[serde(default)]
    pub search: SearchConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Tequila API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TequilaConfig {
    /// API key sent as the `apikey` header on every request
    #[serde(default)]
    pub api_key: String,
    /// Base URL for the Tequila API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Fare search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Currency code passed through to the fare search
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the API server binds to
    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions
fn default_base_url() -> String {
    "https://tequila-api.kiwi.com".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for TequilaConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for FarescoutConfig {
    fn default() -> Self {
        Self {
            tequila: TequilaConfig::default(),
            search: SearchConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl FarescoutConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment variable overrides with FARESCOUT_ prefix, e.g.
        // FARESCOUT_TEQUILA__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("FARESCOUT")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: FarescoutConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("farescout").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        if !self.tequila.base_url.starts_with("http://")
            && !self.tequila.base_url.starts_with("https://")
        {
            return Err(FarescoutError::config(
                "Tequila base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        if self.tequila.timeout_seconds == 0 || self.tequila.timeout_seconds > 300 {
            return Err(FarescoutError::config(
                "Tequila request timeout must be between 1 and 300 seconds",
            )
            .into());
        }

        if self.search.currency.len() != 3
            || !self
                .search
                .currency
                .chars()
                .all(|c| c.is_ascii_uppercase())
        {
            return Err(FarescoutError::config(format!(
                "Invalid currency code '{}'. Must be a 3-letter uppercase code like USD.",
                self.search.currency
            ))
            .into());
        }

        Ok(())
    }
}
