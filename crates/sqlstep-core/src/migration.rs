//! The unit of schema change.

use crate::error::ActionResult;
use sqlstep_db::Executor;
use std::fmt;

type Action = Box<dyn Fn(&dyn Executor) -> ActionResult>;

/// An identified, named, one-shot database change.
///
/// `id` is both the identity and the ordering key. Id `0` is the ledger's
/// "nothing applied" sentinel, so a migration with id `0` is always skipped;
/// real migrations start at `1`.
pub struct Migration {
    id: i64,
    name: String,
    action: Action,
}

impl Migration {
    /// Create a migration from an arbitrary action.
    pub fn new<F>(id: i64, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&dyn Executor) -> ActionResult + 'static,
    {
        Self {
            id,
            name: name.into(),
            action: Box::new(action),
        }
    }

    /// Create a migration that runs `sql` as a single script.
    pub fn from_sql(id: i64, name: impl Into<String>, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        Self::new(id, name, move |db| Ok(db.execute_batch(&sql)?))
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the migration's action against `db`.
    pub fn apply(&self, db: &dyn Executor) -> ActionResult {
        (self.action)(db)
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.id, self.name)
    }
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
