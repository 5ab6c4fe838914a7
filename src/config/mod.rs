//! Configuration management for vqlsh
//!
//! This module handles loading, parsing, and managing configuration from:
//! - Configuration files (TOML format)
//! - Command-line arguments
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Configuration file
//! 3. Default values
//!
//! Once merged, the console-facing subset is frozen into [`ConsoleSettings`]
//! and passed by reference to every component that needs it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Named query templates
    #[serde(default)]
    pub artifacts: Vec<ArtifactDefinition>,

    /// Console configuration
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Client configuration, visible to statements as `config`
    #[serde(default)]
    pub client: ClientConfig,

    /// Server configuration, visible to statements inside `server_config`
    #[serde(default)]
    pub server: ServerConfig,

    /// Extra scope variables
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Console-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Output format (text, json, csv)
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Directory handed to the uploader for dumped files
    #[serde(default = "default_dump_dir")]
    pub dump_dir: PathBuf,

    /// Path to the history file
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,

    /// Maximum number of completion suggestions shown at once
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Enable colored output
    #[serde(default = "default_color_output")]
    pub color_output: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// ASCII table with a header row
    Text,

    /// Pretty-printed JSON array of rows
    Json,

    /// Comma-separated values with a header line
    Csv,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Client section of the configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server URLs the client talks to
    #[serde(default)]
    pub server_urls: Vec<String>,

    /// Deployment nonce
    #[serde(default)]
    pub nonce: String,
}

/// Server section of the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the frontend binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port the frontend binds to
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
}

/// A named query template declared in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDefinition {
    /// Artifact name, referenced as `Artifact.<name>`
    pub name: String,

    /// One-line description shown in completion
    #[serde(default)]
    pub description: String,

    /// Query text of the template
    pub query: String,
}

/// Immutable console settings built once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleSettings {
    /// Rendering mode for query results
    pub format: OutputFormat,

    /// Directory passed through to the uploader
    pub dump_dir: PathBuf,

    /// History file location
    pub history_file: PathBuf,

    /// Completion menu size
    pub max_suggestions: usize,

    /// Whether output may be colored
    pub color_output: bool,
}

// Default value functions
fn default_format() -> OutputFormat {
    OutputFormat::Json
}

fn default_dump_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_history_file() -> PathBuf {
    std::env::temp_dir().join("vqlsh_history")
}

fn default_max_suggestions() -> usize {
    10
}

fn default_color_output() -> bool {
    true
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_bind_port() -> u16 {
    8000
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            dump_dir: default_dump_dir(),
            history_file: default_history_file(),
            max_suggestions: default_max_suggestions(),
            color_output: default_color_output(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// With no explicit path the default location is tried; a missing default
    /// file yields the default configuration, a missing explicit file is an error.
    ///
    /// # Arguments
    /// * `path` - Optional path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_config_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::FileNotFound(path.display().to_string()).into());
            }
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - Path to default configuration file
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vqlsh")
            .join("config.toml")
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if self.console.history_file.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("console.history_file".to_string()).into());
        }

        if self.console.max_suggestions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "console.max_suggestions".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        for artifact in &self.artifacts {
            if artifact.name.trim().is_empty() || artifact.name.contains(' ') {
                return Err(ConfigError::InvalidValue {
                    field: "artifacts.name".to_string(),
                    value: artifact.name.clone(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Freeze the console section into immutable settings
    pub fn console_settings(&self) -> ConsoleSettings {
        ConsoleSettings {
            format: self.console.format,
            dump_dir: self.console.dump_dir.clone(),
            history_file: self.console.history_file.clone(),
            max_suggestions: self.console.max_suggestions,
            color_output: self.console.color_output,
        }
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl OutputFormat {
    /// Name used on the command line and in the config file
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Config::default().console_settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.console.format, OutputFormat::Json);
        assert_eq!(config.console.dump_dir, PathBuf::from("."));
        assert_eq!(config.console.max_suggestions, 10);
        assert!(config.console.history_file.ends_with("vqlsh_history"));
        assert!(config.artifacts.is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let config = Config::from_toml(
            r#"
            [console]
            format = "csv"
            dump_dir = "/tmp/dumps"

            [env]
            Hostname = "workstation"

            [[artifacts]]
            name = "Generic.Client.Info"
            description = "Collect basic client information"
            query = "SELECT * FROM info()"
            "#,
        )
        .unwrap();

        assert_eq!(config.console.format, OutputFormat::Csv);
        assert_eq!(config.console.dump_dir, PathBuf::from("/tmp/dumps"));
        assert_eq!(config.console.max_suggestions, 10);
        assert_eq!(config.env.get("Hostname").map(String::as_str), Some("workstation"));
        assert_eq!(config.artifacts.len(), 1);
        assert_eq!(config.artifacts[0].name, "Generic.Client.Info");
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_invalid_toml_is_format_error() {
        let result = Config::from_toml("[console]\nformat = \"xml\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_zero_suggestions() {
        let mut config = Config::default();
        config.console.max_suggestions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_artifact_name_with_space() {
        let mut config = Config::default();
        config.artifacts.push(ArtifactDefinition {
            name: "Bad Name".to_string(),
            description: String::new(),
            query: "SELECT * FROM info()".to_string(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = Config::load_from_file(Some(Path::new("/nonexistent/vqlsh/config.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        let parsed = Config::from_toml(&rendered).unwrap();
        assert_eq!(parsed.console_settings(), config.console_settings());
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(LogLevel::Debug.to_tracing_level(), tracing::Level::DEBUG);
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
    }
}
