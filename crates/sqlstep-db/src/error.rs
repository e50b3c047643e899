//! Error types for sqlstep-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Statement or script execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Unique/primary key or NOT NULL constraint rejected a write (D003)
    #[error("[D003] Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Query or row decoding error (D004)
    #[error("[D004] Query failed: {0}")]
    QueryError(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error does not expose structured constraint variants, so
        // the message prefix is the only reliable signal.
        let msg = err.to_string();
        if msg.contains("Constraint Error") {
            DbError::ConstraintViolation(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DbError::ConstraintViolation(err.to_string())
            }
            _ => DbError::ExecutionError(err.to_string()),
        }
    }
}
