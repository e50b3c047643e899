//! The migration ledger.
//!
//! One row per applied migration in the `migrations` table. The engine only
//! ever asks three things of it: make sure the table exists, report the
//! highest recorded id, and record a migration. Listing records is used for
//! reporting.

use crate::migration::Migration;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlstep_db::{DbError, DbResult, Dialect, Executor, Value};

/// Highest recorded migration id; `NULL` when the ledger is empty.
pub const WATERMARK_SQL: &str = "SELECT MAX(migration_id) AS last_migration FROM migrations";

/// Ledger insert for one migration.
pub const RECORD_SQL: &str =
    "INSERT INTO migrations (migration_id, name, created_at) VALUES (?, ?, ?)";

/// Every ledger row, ascending by migration id.
pub const RECORDS_SQL: &str =
    "SELECT migration_id, name, created_at FROM migrations ORDER BY migration_id";

/// `CREATE TABLE IF NOT EXISTS` script for the ledger in `dialect`.
///
/// The shape is the same everywhere; only the auto-increment key differs.
pub fn ledger_ddl(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::DuckDb => {
            "CREATE SEQUENCE IF NOT EXISTS migrations_id_seq;
             CREATE TABLE IF NOT EXISTS migrations (
                 id           BIGINT DEFAULT nextval('migrations_id_seq') PRIMARY KEY,
                 migration_id BIGINT NOT NULL UNIQUE,
                 name         VARCHAR(128) NOT NULL,
                 created_at   BIGINT NOT NULL
             );"
        }
        Dialect::Sqlite => {
            "CREATE TABLE IF NOT EXISTS migrations (
                 id           INTEGER PRIMARY KEY AUTOINCREMENT,
                 migration_id INTEGER NOT NULL UNIQUE,
                 name         VARCHAR(128) NOT NULL,
                 created_at   INTEGER NOT NULL
             );"
        }
        Dialect::MySql => {
            "CREATE TABLE IF NOT EXISTS migrations (id BIGINT AUTO_INCREMENT PRIMARY KEY, \
             migration_id BIGINT NOT NULL UNIQUE, name varchar(128) NOT NULL, \
             created_at BIGINT NOT NULL) ENGINE=INNODB"
        }
    }
}

/// A persisted ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerRecord {
    pub migration_id: i64,
    pub name: String,
    /// Epoch seconds at the time the migration was recorded
    pub created_at: i64,
}

impl LedgerRecord {
    /// `created_at` as a UTC timestamp, if it is in range.
    pub fn applied_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_at, 0)
    }

    fn from_row(row: &[Value]) -> DbResult<Self> {
        match row {
            [Value::Int(migration_id), Value::Text(name), Value::Int(created_at)] => Ok(Self {
                migration_id: *migration_id,
                name: name.clone(),
                created_at: *created_at,
            }),
            other => Err(DbError::QueryError(format!(
                "unexpected ledger row shape: {other:?}"
            ))),
        }
    }
}

/// Storage the engine records applied migrations in.
pub trait Ledger {
    /// Create the ledger if it does not exist yet.
    fn ensure(&self) -> DbResult<()>;

    /// Highest recorded migration id, `None` when nothing has been recorded.
    fn watermark(&self) -> DbResult<Option<i64>>;

    /// Record `migration` as applied, stamped with the current time.
    fn record(&self, migration: &Migration) -> DbResult<()>;

    /// All recorded migrations, ascending by id.
    fn records(&self) -> DbResult<Vec<LedgerRecord>>;
}

/// [`Ledger`] kept in the `migrations` table of the target database.
pub struct SqlLedger<'a> {
    db: &'a dyn Executor,
}

impl<'a> SqlLedger<'a> {
    pub fn new(db: &'a dyn Executor) -> Self {
        Self { db }
    }
}

impl Ledger for SqlLedger<'_> {
    fn ensure(&self) -> DbResult<()> {
        self.db.execute_batch(ledger_ddl(self.db.dialect()))
    }

    fn watermark(&self) -> DbResult<Option<i64>> {
        self.db.query_row_i64(WATERMARK_SQL, &[])
    }

    fn record(&self, migration: &Migration) -> DbResult<()> {
        self.db.execute(
            RECORD_SQL,
            &[
                Value::Int(migration.id()),
                Value::from(migration.name()),
                Value::Int(Utc::now().timestamp()),
            ],
        )?;
        Ok(())
    }

    fn records(&self) -> DbResult<Vec<LedgerRecord>> {
        self.db
            .query_rows(RECORDS_SQL, &[])?
            .iter()
            .map(|row| LedgerRecord::from_row(row))
            .collect()
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
