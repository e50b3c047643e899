//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Dialect, Executor, Value};
use duckdb::types::Value as DuckValue;
use duckdb::Connection;
use std::path::Path;

/// DuckDB database backend
///
/// Single-threaded; holds the connection directly, without a `Mutex`.
pub struct DuckDbBackend {
    conn: Connection,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Create a new DuckDB connection from a file path
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

    /// Borrow the underlying DuckDB connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn to_duckdb(value: &Value) -> DuckValue {
    match value {
        Value::Null => DuckValue::Null,
        Value::Int(n) => DuckValue::BigInt(*n),
        Value::Text(s) => DuckValue::Text(s.clone()),
    }
}

/// Read a column as a [`Value`], trying the types the ledger stores.
///
/// DuckDB refuses cross-type reads, so try String -> i64 -> NULL.
fn read_column(row: &duckdb::Row<'_>, idx: usize) -> Value {
    if let Ok(Some(s)) = row.get::<_, Option<String>>(idx) {
        return Value::Text(s);
    }
    if let Ok(Some(n)) = row.get::<_, Option<i64>>(idx) {
        return Value::Int(n);
    }
    Value::Null
}

impl Executor for DuckDbBackend {
    fn execute(&self, sql: &str, params: &[Value]) -> DbResult<usize> {
        let bound = duckdb::params_from_iter(params.iter().map(to_duckdb));
        Ok(self.conn.execute(sql, bound)?)
    }

    fn execute_batch(&self, sql: &str) -> DbResult<()> {
        Ok(self.conn.execute_batch(sql)?)
    }

    fn query_row_i64(&self, sql: &str, params: &[Value]) -> DbResult<Option<i64>> {
        let bound = duckdb::params_from_iter(params.iter().map(to_duckdb));
        self.conn
            .query_row(sql, bound, |row| row.get::<_, Option<i64>>(0))
            .map_err(|e| DbError::QueryError(e.to_string()))
    }

    fn query_rows(&self, sql: &str, params: &[Value]) -> DbResult<Vec<Vec<Value>>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| DbError::QueryError(format!("{e}: {sql}")))?;
        let bound = duckdb::params_from_iter(params.iter().map(to_duckdb));
        // DuckDB panics on `stmt.column_count()` before execution, so read
        // the count from each row instead.
        let rows = stmt
            .query_map(bound, |row| {
                let col_count = row.as_ref().column_count();
                Ok((0..col_count).map(|i| read_column(row, i)).collect())
            })
            .map_err(|e| DbError::QueryError(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DbError::QueryError(format!("row error: {e}")))?;
        Ok(rows)
    }

    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
