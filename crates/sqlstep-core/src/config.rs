//! Configuration types and parsing for sqlstep.yml

use crate::error::{ConfigError, ConfigResult};
use crate::source::{DirSource, DEFAULT_EXTENSION};
use serde::{Deserialize, Serialize};
use sqlstep_db::{DbResult, DuckDbBackend, Executor, SqliteBackend};
use std::path::{Path, PathBuf};

/// Config file names looked up in a project directory, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["sqlstep.yml", "sqlstep.yaml"];

/// Main project configuration from sqlstep.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Directory holding `<integer>.sql` migration scripts
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,

    /// Recognized script extensions, without leading dots
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

/// Database type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// DuckDB (default)
    #[default]
    DuckDb,
    /// SQLite
    Sqlite,
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::DuckDb => write!(f, "duckdb"),
            DbType::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database type (duckdb or sqlite)
    #[serde(rename = "type", default)]
    pub db_type: DbType,

    /// Database file path, relative to the project directory, or `:memory:`
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DbType::default(),
            path: default_db_path(),
        }
    }
}

impl DatabaseConfig {
    /// Resolve `path` against `root`, leaving `:memory:` and absolute paths alone.
    pub fn path_absolute(&self, root: &Path) -> String {
        if self.path == MEMORY_PATH || Path::new(&self.path).is_absolute() {
            self.path.clone()
        } else {
            root.join(&self.path).display().to_string()
        }
    }

    /// Open the configured database.
    pub fn connect(&self, root: &Path) -> DbResult<Box<dyn Executor>> {
        let path = self.path_absolute(root);
        log::debug!("Opening {} database at {}", self.db_type, path);
        match self.db_type {
            DbType::DuckDb => Ok(Box::new(DuckDbBackend::new(&path)?)),
            DbType::Sqlite => Ok(Box::new(SqliteBackend::new(&path)?)),
        }
    }
}

const MEMORY_PATH: &str = ":memory:";

const DEFAULT_DB_PATH: &str = "sqlstep.duckdb";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

fn default_extensions() -> Vec<String> {
    vec![DEFAULT_EXTENSION.to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            migrations_dir: default_migrations_dir(),
            extensions: default_extensions(),
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        let parse_error = |message: String| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| parse_error(e.to_string()))?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for sqlstep.yml or sqlstep.yaml
    pub fn load_from_dir(dir: &Path) -> ConfigResult<Self> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
            .map(|path| Self::load(&path))
            .unwrap_or_else(|| {
                Err(ConfigError::NotFound {
                    path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
                })
            })
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "database.path cannot be empty".to_string(),
            });
        }

        if self.migrations_dir.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "migrations_dir cannot be empty".to_string(),
            });
        }

        if self.extensions.is_empty() {
            return Err(ConfigError::Invalid {
                message: "extensions must list at least one extension".to_string(),
            });
        }

        if let Some(bad) = self
            .extensions
            .iter()
            .find(|e| e.is_empty() || e.starts_with('.'))
        {
            return Err(ConfigError::Invalid {
                message: format!("extension '{bad}' must be non-empty and have no leading dot"),
            });
        }

        Ok(())
    }

    /// Absolute migrations directory for a project rooted at `root`
    pub fn migrations_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migrations_dir)
    }

    /// Directory source over this project's migrations
    pub fn source(&self, root: &Path) -> DirSource {
        DirSource::new(self.migrations_dir_absolute(root)).with_extensions(self.extensions.clone())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
