//! Executor trait definition

use crate::error::DbResult;
use std::fmt;

/// SQL dialect spoken by an [`Executor`].
///
/// Statements with portable shapes are shared across dialects; the dialect is
/// only consulted where the syntax genuinely differs (auto-increment keys).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// DuckDB
    DuckDb,
    /// SQLite
    Sqlite,
    /// MySQL / MariaDB. No backend here speaks it; it exists for
    /// `Executor` implementations outside this crate.
    MySql,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::DuckDb => write!(f, "duckdb"),
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::MySql => write!(f, "mysql"),
        }
    }
}

/// A bound parameter or a decoded column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Any integer column, widened to 64 bits
    Int(i64),
    /// Any character column
    Text(String),
}

impl Value {
    /// The integer payload, if this is an [`Value::Int`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The text payload, if this is a [`Value::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Blocking SQL execution capability.
///
/// Every call runs to completion (or fails) before returning. Placeholders
/// are positional `?`. Implementations are not required to be `Sync`; a
/// single executor is driven from one thread at a time.
pub trait Executor {
    /// Execute one parameterized statement, returns affected rows
    fn execute(&self, sql: &str, params: &[Value]) -> DbResult<usize>;

    /// Execute a script of one or more statements without parameters
    fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Run a single-row query and read its first column as a nullable integer.
    ///
    /// A query that yields no row is an error; a row holding SQL NULL is
    /// `Ok(None)`.
    fn query_row_i64(&self, sql: &str, params: &[Value]) -> DbResult<Option<i64>>;

    /// Run a query and decode every row into [`Value`]s
    fn query_rows(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Vec<Value>>>;

    /// Dialect this executor speaks
    fn dialect(&self) -> Dialect;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
