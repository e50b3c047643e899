//! New command implementation

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::fs;
use std::path::PathBuf;

use crate::cli::{GlobalArgs, NewArgs};
use crate::commands::common::{load_project, Project};
use crate::commands::ls::list_scripts;

/// Execute the new command
pub fn execute(args: &NewArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let path = create_script(&project, &args.name)?;
    println!("Created {}", path.display());
    Ok(())
}

/// Write an empty `<next id>.<ext>` script whose header names the change.
pub(crate) fn create_script(project: &Project, name: &str) -> Result<PathBuf> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Migration name cannot be empty");
    }

    let next_id = list_scripts(project)?
        .last()
        .map(|s| s.id)
        .unwrap_or(0)
        .checked_add(1)
        .context("Migration id overflow")?;

    let dir = project.migrations_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let extension = project
        .config
        .extensions
        .first()
        .context("No migration extension configured")?;
    let path = dir.join(format!("{next_id}.{extension}"));
    if path.exists() {
        bail!("Migration script already exists: {}", path.display());
    }

    let header = format!(
        "-- Migration {next_id}: {name}\n-- Created {}\n\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    fs::write(&path, header)
        .with_context(|| format!("Failed to write migration: {}", path.display()))?;
    log::debug!("Created migration {} at {}", next_id, path.display());

    Ok(path)
}

#[cfg(test)]
#[path = "new_test.rs"]
mod tests;
