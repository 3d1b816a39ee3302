//! Configuration management with layered hierarchy

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default database file name inside the data directory
const DEFAULT_DATABASE: &str = "warehouse.db";

/// Warehouse configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file backing the inventory
    pub database: Option<PathBuf>,

    /// Default tracing filter when RUST_LOG is unset
    pub log_level: Option<String>,
}

/// Errors reading an explicitly requested config file
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    #[diagnostic(code(warehouse::config::io))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {reason}", path.display())]
    #[diagnostic(code(warehouse::config::parse))]
    Parse { path: PathBuf, reason: String },
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/warehouse/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                if let Ok(global) = Self::from_file(&global_path) {
                    config.merge(global);
                }
            }
        }

        // 3. Explicit --config file, which must exist and parse
        if let Some(path) = explicit {
            config.merge(Self::from_file(path)?);
        }

        // 4. Environment variables
        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Parse a single YAML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yml::from_str::<Config>(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "warehouse")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Apply WAREHOUSE_DB / WAREHOUSE_LOG overrides
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db) = lookup("WAREHOUSE_DB").filter(|v| !v.is_empty()) {
            self.database = Some(PathBuf::from(db));
        }
        if let Some(level) = lookup("WAREHOUSE_LOG").filter(|v| !v.is_empty()) {
            self.log_level = Some(level);
        }
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
    }

    /// Database path, falling back to the user data directory
    pub fn database_path(&self) -> PathBuf {
        if let Some(ref path) = self.database {
            return path.clone();
        }
        directories::ProjectDirs::from("", "", "warehouse")
            .map(|dirs| dirs.data_dir().join(DEFAULT_DATABASE))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
    }

    /// Tracing filter, defaulting to `info`
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}
