//! Status command implementation

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlstep_core::{Ledger, LedgerRecord, SqlLedger};
use std::collections::BTreeMap;
use std::fmt;

use crate::cli::{GlobalArgs, OutputFormat, StatusArgs};
use crate::commands::common::{load_project, Project};
use crate::commands::ls::list_scripts;

/// Execute the status command
pub fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let rows = collect_status(&project)?;

    match args.output {
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Json => print_json(&rows)?,
    }

    Ok(())
}

/// State of one migration relative to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum MigrationState {
    /// Recorded in the ledger
    Applied,
    /// Above the watermark; the next apply runs it
    Pending,
    /// Never recorded but at or below the watermark; apply will not run it
    Ignored,
    /// Recorded in the ledger with no matching script
    Missing,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationState::Applied => write!(f, "applied"),
            MigrationState::Pending => write!(f, "pending"),
            MigrationState::Ignored => write!(f, "ignored"),
            MigrationState::Missing => write!(f, "missing"),
        }
    }
}

/// One status line
#[derive(Debug, Serialize)]
pub(crate) struct StatusRow {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) state: MigrationState,
    pub(crate) applied_at: Option<DateTime<Utc>>,
}

/// Join discovered scripts with ledger records, ordered by id.
pub(crate) fn collect_status(project: &Project) -> Result<Vec<StatusRow>> {
    let scripts = list_scripts(project)?;
    let db = project.connect()?;
    let ledger = SqlLedger::new(db.as_ref());
    ledger.ensure().context("Failed to set up migration ledger")?;
    let records: BTreeMap<i64, LedgerRecord> = ledger
        .records()
        .context("Failed to read migration ledger")?
        .into_iter()
        .map(|r| (r.migration_id, r))
        .collect();
    let watermark = records.keys().next_back().copied().unwrap_or(0);

    let mut rows: BTreeMap<i64, StatusRow> = BTreeMap::new();
    for script in scripts {
        let (state, applied_at) = match records.get(&script.id) {
            Some(record) => (MigrationState::Applied, record.applied_at()),
            None if script.id > watermark => (MigrationState::Pending, None),
            None => (MigrationState::Ignored, None),
        };
        rows.insert(
            script.id,
            StatusRow {
                id: script.id,
                name: script.name,
                state,
                applied_at,
            },
        );
    }
    for (id, record) in records {
        rows.entry(id).or_insert_with(|| StatusRow {
            id,
            applied_at: record.applied_at(),
            name: record.name,
            state: MigrationState::Missing,
        });
    }

    Ok(rows.into_values().collect())
}

/// Print status in table format
fn print_table(rows: &[StatusRow]) {
    let id_width = rows
        .iter()
        .map(|r| r.id.to_string().len())
        .max()
        .unwrap_or(2)
        .max(2);
    let name_width = rows
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let state_width = 7;

    println!(
        "{:>id_width$}  {:<name_width$}  {:<state_width$}  APPLIED_AT",
        "ID",
        "NAME",
        "STATE",
        id_width = id_width,
        name_width = name_width,
        state_width = state_width
    );
    println!(
        "{:->id_width$}  {:-<name_width$}  {:-<state_width$}  {}",
        "",
        "",
        "",
        "-".repeat(25),
        id_width = id_width,
        name_width = name_width,
        state_width = state_width
    );

    for row in rows {
        let applied_at = row
            .applied_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>id_width$}  {:<name_width$}  {:<state_width$}  {}",
            row.id,
            row.name,
            row.state.to_string(),
            applied_at,
            id_width = id_width,
            name_width = name_width,
            state_width = state_width
        );
    }

    let count = |state: MigrationState| rows.iter().filter(|r| r.state == state).count();
    println!();
    println!(
        "{} applied, {} pending",
        count(MigrationState::Applied),
        count(MigrationState::Pending)
    );
    let ignored = count(MigrationState::Ignored);
    if ignored > 0 {
        println!(
            "{} migration(s) below the latest applied id will never run",
            ignored
        );
    }
}

/// Print status as JSON
fn print_json(rows: &[StatusRow]) -> Result<()> {
    let json = serde_json::to_string_pretty(rows).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
