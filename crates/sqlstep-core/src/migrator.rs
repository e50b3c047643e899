//! The migration engine.
//!
//! [`Migrator::apply`] brings a database up to date with a list of
//! migrations:
//!
//! 1. ensure the ledger exists,
//! 2. read the watermark (highest recorded id, `0` when empty) once,
//! 3. walk the list in the order given, skipping every migration whose id is
//!    `<=` the watermark and migrating the rest, stopping at the first error.
//!
//! # Record before apply
//!
//! Migrating one entry first records it in the ledger and only then invokes
//! its action. If the action fails, the ledger row stays: the next `apply`
//! treats the migration as done and skips it. A migration whose statements
//! may have partially run is never run a second time; repairing it is
//! manual.
//!
//! The list is not sorted here. Discovered sources arrive sorted; callers
//! building lists by hand must keep them ascending. Because every id is
//! compared against the same watermark, an out-of-order id that is still
//! above the watermark is applied out of order.
//!
//! Concurrent `apply` calls against one database are not coordinated. The
//! ledger's unique key turns a duplicate apply race into
//! [`MigrateError::Record`] for the losing caller.

use crate::error::{MigrateError, MigrateResult};
use crate::ledger::{Ledger, SqlLedger};
use crate::migration::Migration;
use crate::progress::{ProgressEvent, ProgressSink};
use sqlstep_db::Executor;

/// Watermark used when the ledger holds no rows.
pub const NONE_APPLIED: i64 = 0;

/// Applies pending migrations against a ledger and an executor.
pub struct Migrator<'a, L: Ledger> {
    db: &'a dyn Executor,
    ledger: L,
    sink: Option<Box<dyn ProgressSink + 'a>>,
}

impl<'a> Migrator<'a, SqlLedger<'a>> {
    /// Migrator keeping its ledger in the `migrations` table of `db`.
    pub fn new(db: &'a dyn Executor) -> Self {
        Self::with_ledger(db, SqlLedger::new(db))
    }
}

impl<'a, L: Ledger> Migrator<'a, L> {
    /// Migrator with an explicit ledger implementation.
    pub fn with_ledger(db: &'a dyn Executor, ledger: L) -> Self {
        Self {
            db,
            ledger,
            sink: None,
        }
    }

    /// Send progress events to `sink`. Without a sink events are dropped.
    pub fn with_sink(mut self, sink: impl ProgressSink + 'a) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    fn emit(&mut self, event: ProgressEvent<'_>) {
        if let Some(sink) = self.sink.as_mut() {
            sink.emit(&event);
        }
    }

    /// Apply every migration above the ledger's watermark, in the given order.
    ///
    /// Returns the first error unmodified apart from naming the stage that
    /// failed. Nothing already committed to the ledger is undone.
    pub fn apply(&mut self, migrations: &[Migration]) -> MigrateResult<()> {
        self.setup()?;
        let watermark = self.starting_point()?;

        self.emit(ProgressEvent::Starting { watermark });
        let mut previous: Option<i64> = None;
        for entry in migrations {
            if let Some(prev) = previous.filter(|prev| entry.id() < *prev) {
                log::warn!(
                    "Migration {} follows {} out of order; lists are applied as given",
                    entry.id(),
                    prev
                );
            }
            previous = Some(entry.id());

            if entry.id() <= watermark {
                self.emit(ProgressEvent::Skipped { id: entry.id() });
                continue;
            }

            self.migrate(entry)?;
        }

        self.emit(ProgressEvent::Finished);
        Ok(())
    }

    /// Migrations `apply` would attempt right now, without running anything.
    ///
    /// Ensures the ledger exists so a fresh database reports everything as
    /// pending.
    pub fn pending<'m>(
        &mut self,
        migrations: &'m [Migration],
    ) -> MigrateResult<Vec<&'m Migration>> {
        self.setup()?;
        let watermark = self.starting_point()?;
        Ok(migrations.iter().filter(|m| m.id() > watermark).collect())
    }

    /// Record `entry` in the ledger, then run its action.
    fn migrate(&mut self, entry: &Migration) -> MigrateResult<()> {
        self.emit(ProgressEvent::Recording {
            id: entry.id(),
            name: entry.name(),
        });
        if let Err(error) = self.ledger.record(entry) {
            self.emit(ProgressEvent::RecordFailed {
                id: entry.id(),
                error: &error,
            });
            return Err(MigrateError::Record {
                id: entry.id(),
                error,
            });
        }

        self.emit(ProgressEvent::Applying {
            id: entry.id(),
            name: entry.name(),
        });
        if let Err(error) = entry.apply(self.db) {
            self.emit(ProgressEvent::ApplyFailed {
                migration: entry,
                error: &error,
            });
            return Err(MigrateError::Action {
                id: entry.id(),
                name: entry.name().to_string(),
                error,
            });
        }

        self.emit(ProgressEvent::Applied { id: entry.id() });
        Ok(())
    }

    fn setup(&mut self) -> MigrateResult<()> {
        self.emit(ProgressEvent::SettingUpTable);
        if let Err(error) = self.ledger.ensure() {
            self.emit(ProgressEvent::SetupFailed(&error));
            return Err(MigrateError::Setup(error));
        }
        Ok(())
    }

    fn starting_point(&mut self) -> MigrateResult<i64> {
        self.emit(ProgressEvent::DeterminingWatermark);
        match self.ledger.watermark().map_err(MigrateError::Watermark)? {
            Some(id) => Ok(id),
            None => {
                self.emit(ProgressEvent::NoneApplied);
                Ok(NONE_APPLIED)
            }
        }
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
