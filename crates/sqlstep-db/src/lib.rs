//! sqlstep-db - Execution layer for sqlstep
//!
//! This crate provides the blocking `Executor` trait that migrations and the
//! ledger run against, with DuckDB and SQLite implementations.

pub mod duckdb;
pub mod error;
pub mod sqlite;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use sqlite::SqliteBackend;
pub use traits::{Dialect, Executor, Value};

