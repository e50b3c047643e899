//! Engine tests against a scripted in-memory ledger.

use super::*;
use crate::error::ActionError;
use crate::ledger::LedgerRecord;
use sqlstep_db::{DbError, DbResult, DuckDbBackend};
use std::cell::RefCell;
use std::rc::Rc;

// ── Helpers ────────────────────────────────────────────────────────────

/// Ledger whose answers are fixed up front and which remembers every call.
#[derive(Default)]
struct ScriptedLedger {
    setup_error: Option<&'static str>,
    watermark_error: Option<&'static str>,
    watermark: Option<i64>,
    reject_record: Option<i64>,
    calls: RefCell<Vec<&'static str>>,
    recorded: RefCell<Vec<i64>>,
}

impl ScriptedLedger {
    fn at(watermark: i64) -> Self {
        Self {
            watermark: Some(watermark),
            ..Default::default()
        }
    }

    fn recorded(&self) -> Vec<i64> {
        self.recorded.borrow().clone()
    }
}

impl Ledger for ScriptedLedger {
    fn ensure(&self) -> DbResult<()> {
        self.calls.borrow_mut().push("ensure");
        match self.setup_error {
            Some(msg) => Err(DbError::ExecutionError(msg.to_string())),
            None => Ok(()),
        }
    }

    fn watermark(&self) -> DbResult<Option<i64>> {
        self.calls.borrow_mut().push("watermark");
        match self.watermark_error {
            Some(msg) => Err(DbError::QueryError(msg.to_string())),
            None => Ok(self.watermark),
        }
    }

    fn record(&self, migration: &Migration) -> DbResult<()> {
        self.calls.borrow_mut().push("record");
        if self.reject_record == Some(migration.id()) {
            return Err(DbError::ConstraintViolation(format!(
                "duplicate migration_id {}",
                migration.id()
            )));
        }
        self.recorded.borrow_mut().push(migration.id());
        Ok(())
    }

    fn records(&self) -> DbResult<Vec<LedgerRecord>> {
        Ok(self
            .recorded
            .borrow()
            .iter()
            .map(|id| LedgerRecord {
                migration_id: *id,
                name: format!("m{id}"),
                created_at: 0,
            })
            .collect())
    }
}

type Shared<T> = Rc<RefCell<Vec<T>>>;

/// Migration whose action appends its id to `invoked`.
fn tracked(id: i64, name: &str, invoked: &Shared<i64>) -> Migration {
    let invoked = Rc::clone(invoked);
    Migration::new(id, name, move |_| {
        invoked.borrow_mut().push(id);
        Ok(())
    })
}

fn failing(id: i64, name: &str, invoked: &Shared<i64>) -> Migration {
    let invoked = Rc::clone(invoked);
    Migration::new(id, name, move |_| {
        invoked.borrow_mut().push(id);
        Err(ActionError::Failed("migration has failed".to_string()))
    })
}

fn five(invoked: &Shared<i64>) -> Vec<Migration> {
    vec![
        tracked(1, "first", invoked),
        tracked(2, "second", invoked),
        tracked(3, "third", invoked),
        tracked(4, "fourth", invoked),
        tracked(5, "fifth", invoked),
    ]
}

fn event_log() -> (Shared<String>, impl FnMut(&ProgressEvent<'_>)) {
    let events: Shared<String> = Rc::default();
    let sink_events = Rc::clone(&events);
    let sink = move |event: &ProgressEvent<'_>| sink_events.borrow_mut().push(event.to_string());
    (events, sink)
}

// ── Setup & watermark ──────────────────────────────────────────────────

#[test]
fn setup_failure_aborts_before_watermark() {
    let db = DuckDbBackend::in_memory().unwrap();
    let invoked: Shared<i64> = Rc::default();
    let (events, sink) = event_log();
    let ledger = ScriptedLedger {
        setup_error: Some("result from setup"),
        ..Default::default()
    };
    let mut migrator = Migrator::with_ledger(&db, ledger).with_sink(sink);

    let err = migrator.apply(&five(&invoked)).unwrap_err();

    assert_eq!(
        err.to_string(),
        "[D002] SQL execution failed: result from setup"
    );
    match err {
        MigrateError::Setup(DbError::ExecutionError(msg)) => assert_eq!(msg, "result from setup"),
        other => panic!("expected setup error, got {other:?}"),
    }
    assert_eq!(*migrator.ledger().calls.borrow(), vec!["ensure"]);
    assert!(invoked.borrow().is_empty());
    assert_eq!(
        *events.borrow(),
        vec![
            "Setting up migrations table".to_string(),
            "migration table initialization has failed, error: [D002] SQL execution failed: result from setup".to_string(),
        ]
    );
}

#[test]
fn watermark_failure_aborts_before_any_migration() {
    let db = DuckDbBackend::in_memory().unwrap();
    let invoked: Shared<i64> = Rc::default();
    let ledger = ScriptedLedger {
        watermark_error: Some("result from watermark"),
        ..Default::default()
    };
    let mut migrator = Migrator::with_ledger(&db, ledger);

    let err = migrator.apply(&five(&invoked)).unwrap_err();

    assert_eq!(err.to_string(), "[D004] Query failed: result from watermark");
    assert!(matches!(
        err,
        MigrateError::Watermark(DbError::QueryError(ref msg)) if msg == "result from watermark"
    ));
    assert_eq!(*migrator.ledger().calls.borrow(), vec!["ensure", "watermark"]);
    assert!(invoked.borrow().is_empty());
}

#[test]
fn watermark_is_reported() {
    let db = DuckDbBackend::in_memory().unwrap();
    let (events, sink) = event_log();
    let mut migrator = Migrator::with_ledger(&db, ScriptedLedger::at(228)).with_sink(sink);

    migrator.apply(&[]).unwrap();

    assert!(events
        .borrow()
        .contains(&"Applying migrations.. starting from: 228".to_string()));
}

#[test]
fn empty_ledger_starts_from_zero() {
    let db = DuckDbBackend::in_memory().unwrap();
    let (events, sink) = event_log();
    let mut migrator = Migrator::with_ledger(&db, ScriptedLedger::default()).with_sink(sink);

    migrator.apply(&[]).unwrap();

    assert_eq!(
        *events.borrow(),
        vec![
            "Setting up migrations table",
            "Determining the latest migration applied to the database..",
            "Migration id was not found, starting from 0",
            "Applying migrations.. starting from: 0",
            "All finished successfully",
        ]
    );
}

// ── Skip / apply decisions ─────────────────────────────────────────────

#[test]
fn empty_list_only_sets_up_and_reads_watermark() {
    let db = DuckDbBackend::in_memory().unwrap();
    let mut migrator = Migrator::with_ledger(&db, ScriptedLedger::at(3));

    migrator.apply(&[]).unwrap();

    assert_eq!(*migrator.ledger().calls.borrow(), vec!["ensure", "watermark"]);
    assert!(migrator.ledger().recorded().is_empty());
}

#[test]
fn skips_up_to_watermark_and_applies_the_rest() {
    let db = DuckDbBackend::in_memory().unwrap();
    let invoked: Shared<i64> = Rc::default();
    let (events, sink) = event_log();
    let mut migrator = Migrator::with_ledger(&db, ScriptedLedger::at(3)).with_sink(sink);

    migrator.apply(&five(&invoked)).unwrap();

    assert_eq!(*invoked.borrow(), vec![4, 5]);
    assert_eq!(migrator.ledger().recorded(), vec![4, 5]);
    assert_eq!(
        *events.borrow(),
        vec![
            "Setting up migrations table",
            "Determining the latest migration applied to the database..",
            "Applying migrations.. starting from: 3",
            "Skipped ID: 1",
            "Skipped ID: 2",
            "Skipped ID: 3",
            "Updating database for: 4 - fourth",
            "Applying migration for: 4 - fourth",
            "Migration with id: 4 successfully applied!",
            "Updating database for: 5 - fifth",
            "Applying migration for: 5 - fifth",
            "Migration with id: 5 successfully applied!",
            "All finished successfully",
        ]
    );
}

#[test]
fn every_watermark_splits_skip_and_apply() {
    let db = DuckDbBackend::in_memory().unwrap();
    for watermark in 0..=6 {
        let invoked: Shared<i64> = Rc::default();
        let (events, sink) = event_log();
        let mut migrator =
            Migrator::with_ledger(&db, ScriptedLedger::at(watermark)).with_sink(sink);

        migrator.apply(&five(&invoked)).unwrap();

        let expected: Vec<i64> = (1..=5).filter(|id| *id > watermark).collect();
        assert_eq!(*invoked.borrow(), expected, "watermark {watermark}");
        assert_eq!(migrator.ledger().recorded(), expected, "watermark {watermark}");
        let skips = events
            .borrow()
            .iter()
            .filter(|e| e.starts_with("Skipped ID:"))
            .count();
        assert_eq!(skips as i64, watermark.min(5), "watermark {watermark}");
    }
}

#[test]
fn id_zero_is_always_skipped() {
    let db = DuckDbBackend::in_memory().unwrap();
    let invoked: Shared<i64> = Rc::default();
    let mut migrator = Migrator::with_ledger(&db, ScriptedLedger::default());

    migrator
        .apply(&[tracked(0, "zero", &invoked), tracked(1, "one", &invoked)])
        .unwrap();

    assert_eq!(*invoked.borrow(), vec![1]);
}

#[test]
fn given_order_is_not_sorted() {
    let db = DuckDbBackend::in_memory().unwrap();
    let invoked: Shared<i64> = Rc::default();
    let mut migrator = Migrator::with_ledger(&db, ScriptedLedger::at(3));

    migrator
        .apply(&[
            tracked(5, "five", &invoked),
            tracked(2, "two", &invoked),
            tracked(4, "four", &invoked),
        ])
        .unwrap();

    // 2 is skipped against the captured watermark, 4 still runs after 5.
    assert_eq!(*invoked.borrow(), vec![5, 4]);
}

#[test]
fn runs_without_a_sink() {
    let db = DuckDbBackend::in_memory().unwrap();
    let invoked: Shared<i64> = Rc::default();
    let mut migrator = Migrator::with_ledger(&db, ScriptedLedger::default());

    migrator.apply(&five(&invoked)).unwrap();

    assert_eq!(*invoked.borrow(), vec![1, 2, 3, 4, 5]);
}

// ── Failure semantics ──────────────────────────────────────────────────

#[test]
fn action_failure_returns_error_and_stays_recorded() {
    let db = DuckDbBackend::in_memory().unwrap();
    let invoked: Shared<i64> = Rc::default();
    let (events, sink) = event_log();
    let mut migrator = Migrator::with_ledger(&db, ScriptedLedger::default()).with_sink(sink);

    let err = migrator
        .apply(&[failing(12, "fault migration", &invoked)])
        .unwrap_err();

    assert_eq!(err.to_string(), "migration has failed");
    match err {
        MigrateError::Action { id, name, error } => {
            assert_eq!(id, 12);
            assert_eq!(name, "fault migration");
            assert!(matches!(error, ActionError::Failed(_)));
        }
        other => panic!("expected action error, got {other:?}"),
    }
    assert_eq!(migrator.ledger().recorded(), vec![12]);
    assert_eq!(
        events.borrow().last().unwrap(),
        "Applying migration has failed, aborting migration! Error: migration has failed Entry: 12 - fault migration"
    );
}

#[test]
fn action_failure_stops_the_batch() {
    let db = DuckDbBackend::in_memory().unwrap();
    let invoked: Shared<i64> = Rc::default();
    let mut migrator = Migrator::with_ledger(&db, ScriptedLedger::default());

    let result = migrator.apply(&[
        tracked(1, "one", &invoked),
        failing(2, "two", &invoked),
        tracked(3, "three", &invoked),
    ]);

    assert!(matches!(result, Err(MigrateError::Action { id: 2, .. })));
    assert_eq!(*invoked.borrow(), vec![1, 2]);
    assert_eq!(migrator.ledger().recorded(), vec![1, 2]);
}

#[test]
fn record_failure_prevents_action() {
    let db = DuckDbBackend::in_memory().unwrap();
    let invoked: Shared<i64> = Rc::default();
    let (events, sink) = event_log();
    let ledger = ScriptedLedger {
        reject_record: Some(2),
        ..Default::default()
    };
    let mut migrator = Migrator::with_ledger(&db, ledger).with_sink(sink);

    let err = migrator
        .apply(&[
            tracked(1, "one", &invoked),
            tracked(2, "two", &invoked),
            tracked(3, "three", &invoked),
        ])
        .unwrap_err();

    match err {
        MigrateError::Record { id, error } => {
            assert_eq!(id, 2);
            assert!(matches!(error, DbError::ConstraintViolation(_)));
        }
        other => panic!("expected record error, got {other:?}"),
    }
    assert_eq!(*invoked.borrow(), vec![1]);
    assert_eq!(
        events.borrow().last().unwrap(),
        "Database update has failed, aborting migration! Error: [D003] Constraint violation: duplicate migration_id 2"
    );
}

// ── pending ────────────────────────────────────────────────────────────

#[test]
fn pending_lists_migrations_above_watermark() {
    let db = DuckDbBackend::in_memory().unwrap();
    let invoked: Shared<i64> = Rc::default();
    let migrations = five(&invoked);
    let mut migrator = Migrator::with_ledger(&db, ScriptedLedger::at(3));

    let pending: Vec<i64> = migrator
        .pending(&migrations)
        .unwrap()
        .iter()
        .map(|m| m.id())
        .collect();

    assert_eq!(pending, vec![4, 5]);
    assert!(invoked.borrow().is_empty());
    assert!(migrator.ledger().recorded().is_empty());
}

// ── SqlLedger wiring ───────────────────────────────────────────────────

#[test]
fn new_uses_the_executor_as_ledger() {
    let db = DuckDbBackend::in_memory().unwrap();
    let invoked: Shared<i64> = Rc::default();

    Migrator::new(&db).apply(&five(&invoked)).unwrap();
    Migrator::new(&db).apply(&five(&invoked)).unwrap();

    assert_eq!(*invoked.borrow(), vec![1, 2, 3, 4, 5]);
    assert_eq!(Migrator::new(&db).ledger().records().unwrap().len(), 5);
}
