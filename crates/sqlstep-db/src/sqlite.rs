//! SQLite database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Dialect, Executor, Value};
use rusqlite::types::Value as SqliteValue;
use rusqlite::Connection;
use std::path::Path;

/// SQLite database backend
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Create a new in-memory SQLite connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Create a new SQLite connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self { conn })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Borrow the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn to_sqlite(value: &Value) -> SqliteValue {
    match value {
        Value::Null => SqliteValue::Null,
        Value::Int(n) => SqliteValue::Integer(*n),
        Value::Text(s) => SqliteValue::Text(s.clone()),
    }
}

fn from_sqlite(value: SqliteValue) -> Value {
    match value {
        SqliteValue::Integer(n) => Value::Int(n),
        SqliteValue::Text(s) => Value::Text(s),
        SqliteValue::Real(f) => Value::Text(f.to_string()),
        SqliteValue::Blob(_) | SqliteValue::Null => Value::Null,
    }
}

impl Executor for SqliteBackend {
    fn execute(&self, sql: &str, params: &[Value]) -> DbResult<usize> {
        let bound = rusqlite::params_from_iter(params.iter().map(to_sqlite));
        Ok(self.conn.execute(sql, bound)?)
    }

    fn execute_batch(&self, sql: &str) -> DbResult<()> {
        Ok(self.conn.execute_batch(sql)?)
    }

    fn query_row_i64(&self, sql: &str, params: &[Value]) -> DbResult<Option<i64>> {
        let bound = rusqlite::params_from_iter(params.iter().map(to_sqlite));
        self.conn
            .query_row(sql, bound, |row| row.get::<_, Option<i64>>(0))
            .map_err(|e| DbError::QueryError(e.to_string()))
    }

    fn query_rows(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Vec<Value>>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| DbError::QueryError(format!("{e}: {sql}")))?;
        let col_count = stmt.column_count();
        let bound = rusqlite::params_from_iter(params.iter().map(to_sqlite));
        let rows = stmt
            .query_map(bound, |row| {
                (0..col_count)
                    .map(|i| row.get::<_, SqliteValue>(i).map(from_sqlite))
                    .collect::<Result<Vec<_>, _>>()
            })
            .map_err(|e| DbError::QueryError(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DbError::QueryError(format!("row error: {e}")))?;
        Ok(rows)
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn db_type(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;
