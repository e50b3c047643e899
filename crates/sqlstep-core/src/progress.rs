//! Progress events emitted by the [`crate::Migrator`].
//!
//! Events render to fixed human-readable messages via `Display`. Their order
//! is part of the engine's observable behaviour.

use crate::error::ActionError;
use crate::migration::Migration;
use sqlstep_db::DbError;
use std::fmt;

/// One step of an `apply` call.
#[derive(Debug)]
pub enum ProgressEvent<'a> {
    SettingUpTable,
    SetupFailed(&'a DbError),
    DeterminingWatermark,
    /// The ledger was empty; the watermark defaults to 0
    NoneApplied,
    Starting { watermark: i64 },
    Skipped { id: i64 },
    Recording { id: i64, name: &'a str },
    RecordFailed { id: i64, error: &'a DbError },
    Applying { id: i64, name: &'a str },
    ApplyFailed {
        migration: &'a Migration,
        error: &'a ActionError,
    },
    Applied { id: i64 },
    Finished,
}

impl ProgressEvent<'_> {
    /// Whether this event reports a failure.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ProgressEvent::SetupFailed(_)
                | ProgressEvent::RecordFailed { .. }
                | ProgressEvent::ApplyFailed { .. }
        )
    }
}

impl fmt::Display for ProgressEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::SettingUpTable => write!(f, "Setting up migrations table"),
            ProgressEvent::SetupFailed(err) => {
                write!(f, "migration table initialization has failed, error: {err}")
            }
            ProgressEvent::DeterminingWatermark => write!(
                f,
                "Determining the latest migration applied to the database.."
            ),
            ProgressEvent::NoneApplied => {
                write!(f, "Migration id was not found, starting from 0")
            }
            ProgressEvent::Starting { watermark } => {
                write!(f, "Applying migrations.. starting from: {watermark}")
            }
            ProgressEvent::Skipped { id } => write!(f, "Skipped ID: {id}"),
            ProgressEvent::Recording { id, name } => {
                write!(f, "Updating database for: {id} - {name}")
            }
            ProgressEvent::RecordFailed { error, .. } => write!(
                f,
                "Database update has failed, aborting migration! Error: {error}"
            ),
            ProgressEvent::Applying { id, name } => {
                write!(f, "Applying migration for: {id} - {name}")
            }
            ProgressEvent::ApplyFailed { migration, error } => write!(
                f,
                "Applying migration has failed, aborting migration! Error: {error} Entry: {migration}"
            ),
            ProgressEvent::Applied { id } => {
                write!(f, "Migration with id: {id} successfully applied!")
            }
            ProgressEvent::Finished => write!(f, "All finished successfully"),
        }
    }
}

/// Receiver of progress events.
pub trait ProgressSink {
    fn emit(&mut self, event: &ProgressEvent<'_>);
}

impl<F> ProgressSink for F
where
    F: FnMut(&ProgressEvent<'_>),
{
    fn emit(&mut self, event: &ProgressEvent<'_>) {
        self(event)
    }
}

/// Forwards events to the `log` facade under the `sqlstep::migrator` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&mut self, event: &ProgressEvent<'_>) {
        if event.is_failure() {
            log::error!(target: "sqlstep::migrator", "{event}");
        } else {
            log::info!(target: "sqlstep::migrator", "{event}");
        }
    }
}

#[cfg(test)]
#[path = "progress_test.rs"]
mod tests;
