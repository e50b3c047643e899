//! Error types for sqlstep-core

use sqlstep_db::DbError;
use thiserror::Error;

/// Errors returned by the migration engine and the migration sources.
///
/// Each engine variant names the stage that failed and holds the
/// collaborator's error unchanged. Its `Display` is exactly that error's
/// message; the variant adds no text of its own.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// S001: The ledger table could not be created
    #[error(transparent)]
    Setup(DbError),

    /// S002: The highest applied migration id could not be read
    #[error(transparent)]
    Watermark(DbError),

    /// S003: The ledger insert for a migration failed; its action never ran
    #[error("{error}")]
    Record { id: i64, error: DbError },

    /// S004: A migration's own action failed after it was recorded
    #[error("{error}")]
    Action {
        id: i64,
        name: String,
        error: ActionError,
    },

    /// S005: Migration discovery could not traverse the source tree
    #[error("[S005] Migration discovery failed at {path}")]
    Discovery {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Failure reported by a migration's action.
#[derive(Error, Debug)]
pub enum ActionError {
    /// The migration script could not be read
    #[error("Cannot read migration script {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The database rejected the migration's statements
    #[error(transparent)]
    Db(#[from] DbError),

    /// Any other failure raised by a hand-written action
    #[error("{0}")]
    Failed(String),
}

/// Result type alias for [`ActionError`].
pub type ActionResult = Result<(), ActionError>;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    NotFound { path: String },

    /// C002: Failed to read or parse configuration file
    #[error("[C002] Failed to parse config {path}: {message}")]
    Parse { path: String, message: String },

    /// C003: Invalid configuration value
    #[error("[C003] Invalid config: {message}")]
    Invalid { message: String },
}

/// Result type alias for [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;
