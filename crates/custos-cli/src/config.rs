//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use custos_gatekeeper::AdmissionConfig;
use custos_memory::DEFAULT_DIMENSION;
use custos_worker::WorkerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the configured database path
pub const DB_PATH_ENV: &str = "CUSTOS_DB_PATH";

/// CLI configuration.
///
/// Every section has defaults, so a partial file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Worker loop settings
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Admission gate settings
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Semantic memory settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Output settings
    #[serde(default)]
    pub settings: Settings,
}

/// Database settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub path: String,
}

/// Semantic memory settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Submit captures to the in-process memory index
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Embedding dimension
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directives used when RUST_LOG is unset
    #[serde(default = "default_filter")]
    pub filter: String,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".custos").join("config.toml"))
    }

    /// Load configuration from `path`, or the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load_from(&Self::default_path()?),
        }
    }

    /// Load configuration from a file, falling back to defaults when it is absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Database path after applying the CUSTOS_DB_PATH override.
    pub fn database_path(&self) -> String {
        self.database_path_with(std::env::var(DB_PATH_ENV).ok())
    }

    /// Database path with an explicit override value.
    pub fn database_path_with(&self, env_override: Option<String>) -> String {
        env_override
            .filter(|path| !path.trim().is_empty())
            .unwrap_or_else(|| self.database.path.clone())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dimension: DEFAULT_DIMENSION,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_database_path() -> String {
    "custos.db".to_string()
}

fn default_true() -> bool {
    true
}

fn default_dimension() -> usize {
    DEFAULT_DIMENSION
}

fn default_filter() -> String {
    "info".to_string()
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.path, "custos.db");
        assert_eq!(config.worker.poll_interval_secs, 2);
        assert_eq!(config.admission.lookback_secs, 120);
        assert!(config.memory.enabled);
        assert_eq!(config.memory.dimension, 384);
        assert_eq!(config.logging.filter, "info");
        assert!(config.settings.color);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [worker]
            backoff_secs = 60

            [settings]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.worker.backoff_secs, 60);
        assert_eq!(config.worker.recent_success_window_secs, 300);
        assert_eq!(config.settings.format, OutputFormat::Json);
        assert_eq!(config.database.path, "custos.db");
    }

    #[test]
    fn test_database_override() {
        let config = Config::default();
        assert_eq!(config.database_path_with(None), "custos.db");
        assert_eq!(config.database_path_with(Some("/tmp/other.db".into())), "/tmp/other.db");
        assert_eq!(config.database_path_with(Some("  ".into())), "custos.db");
    }
}
