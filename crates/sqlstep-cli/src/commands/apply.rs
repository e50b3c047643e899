//! Apply command implementation

use anyhow::{Context, Result};
use sqlstep_core::{LogSink, Migrator};

use crate::cli::{ApplyArgs, GlobalArgs};
use crate::commands::common::{load_project, Project};

/// Execute the apply command
pub fn execute(args: &ApplyArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;

    if args.dry_run {
        let pending = pending_ids(&project)?;
        if pending.is_empty() {
            println!("Database is up to date");
        } else {
            println!("Would apply {} migration(s):", pending.len());
            for (id, name) in &pending {
                println!("  {} - {}", id, name);
            }
        }
        return Ok(());
    }

    run(&project)
}

/// Apply every discovered migration above the ledger's watermark.
pub(crate) fn run(project: &Project) -> Result<()> {
    let migrations = project.discover()?;
    let db = project.connect()?;

    Migrator::new(db.as_ref())
        .with_sink(LogSink)
        .apply(&migrations)
        .context("Migration aborted")?;

    Ok(())
}

/// Ids and names `run` would attempt.
pub(crate) fn pending_ids(project: &Project) -> Result<Vec<(i64, String)>> {
    let migrations = project.discover()?;
    let db = project.connect()?;

    let pending = Migrator::new(db.as_ref())
        .pending(&migrations)
        .context("Failed to read migration ledger")?;
    Ok(pending
        .into_iter()
        .map(|m| (m.id(), m.name().to_string()))
        .collect())
}

#[cfg(test)]
#[path = "apply_test.rs"]
mod tests;
