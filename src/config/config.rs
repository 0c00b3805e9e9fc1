//! Config file handling

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::encoding::{xml, JSON};
use crate::errors::{CodecflowError, Result};

/// Codec defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecsConfig {
    /// Format used when a requested identifier is not registered
    pub default_format: String,
    /// Root element wrapped around values that do not name their own
    pub xml_root: String,
}

impl Default for CodecsConfig {
    fn default() -> Self {
        Self {
            default_format: JSON.to_string(),
            xml_root: xml::DEFAULT_ROOT.to_string(),
        }
    }
}

/// Pipeline behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Check the execution context before each handler and stop early
    /// once it is cancelled or past its deadline
    pub check_context_between_handlers: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging setup, see [`crate::logging::init`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` takes precedence
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// codecflow configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub codecs: CodecsConfig,
    pub runtime: RuntimeConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default config file (TOML format)
    ///
    /// A missing file is not an error and yields the defaults.
    pub fn load() -> Result<Self> {
        let config_file = Self::config_file();

        if !config_file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_file)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CodecflowError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| CodecflowError::Config(format!("Invalid config TOML: {}", e)))
    }

    /// Get the default config directory
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("codecflow"))
            .unwrap_or_else(|| PathBuf::from(".codecflow"))
    }

    /// Get the default config file path
    pub fn config_file() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }
}
