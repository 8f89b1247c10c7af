// Configuration Management
//
// This crate handles all configuration loading for the SSO portal.
// It provides:
// - Configuration structs and deserialization
// - File loading logic with environment-variable fallbacks
// - Default configuration values
//
// This keeps configuration concerns separate from the auth core.

use std::path::Path;
use thiserror::Error;

pub mod types;

// Re-export all configuration types
pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found. Tried paths: {paths}")]
    FileNotFound { paths: String },

    #[error("Failed to read configuration file: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {source}")]
    ParseError {
        #[from]
        source: serde_yaml::Error,
    },

    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
}

/// Main configuration loading interface
impl AppConfig {
    /// Load configuration from YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from default locations, falling back to the
    /// environment when no config file exists
    pub fn load() -> Result<Self, ConfigError> {
        // Try different config locations in order
        let config_paths = ["config/config.yaml", "config.yaml", "config/default.yaml"];

        for path in &config_paths {
            if std::path::Path::new(path).exists() {
                return Self::load_from_file(path);
            }
        }

        // No config file found; provider credentials may still be present
        // in the environment. If that fails too, report the paths we tried
        // alongside the environment failure.
        Self::from_env().map_err(|env_err| ConfigError::FileNotFound {
            paths: format!(
                "{} (environment fallback failed: {env_err})",
                config_paths.join(", ")
            ),
        })
    }
}
