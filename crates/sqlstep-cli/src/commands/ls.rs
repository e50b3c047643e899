//! List command implementation

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::cli::{GlobalArgs, LsArgs, OutputFormat};
use crate::commands::common::{load_project, Project};

/// Execute the ls command
pub fn execute(args: &LsArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let scripts = list_scripts(&project)?;

    match args.output {
        OutputFormat::Table => print_table(&scripts),
        OutputFormat::Json => print_json(&scripts)?,
    }

    Ok(())
}

/// Discovered script information for display
#[derive(Debug, serde::Serialize)]
pub(crate) struct ScriptInfo {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) path: PathBuf,
}

/// Scripts in the migrations directory, sorted by id
pub(crate) fn list_scripts(project: &Project) -> Result<Vec<ScriptInfo>> {
    let Some(source) = project.source() else {
        return Ok(Vec::new());
    };
    let scripts = source
        .scan()
        .context("Failed to scan migrations directory")?
        .into_iter()
        .map(|(id, name, path)| ScriptInfo { id, name, path })
        .collect();
    Ok(scripts)
}

/// Print scripts in table format
fn print_table(scripts: &[ScriptInfo]) {
    let id_width = scripts
        .iter()
        .map(|s| s.id.to_string().len())
        .max()
        .unwrap_or(2)
        .max(2);
    let name_width = scripts
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!(
        "{:>id_width$}  {:<name_width$}  PATH",
        "ID",
        "NAME",
        id_width = id_width,
        name_width = name_width
    );
    println!(
        "{:->id_width$}  {:-<name_width$}  {}",
        "",
        "",
        "-".repeat(40),
        id_width = id_width,
        name_width = name_width
    );

    for script in scripts {
        println!(
            "{:>id_width$}  {:<name_width$}  {}",
            script.id,
            script.name,
            script.path.display(),
            id_width = id_width,
            name_width = name_width
        );
    }

    println!();
    println!("{} migrations found", scripts.len());
}

/// Print scripts as JSON
fn print_json(scripts: &[ScriptInfo]) -> Result<()> {
    let json = serde_json::to_string_pretty(scripts).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
#[path = "ls_test.rs"]
mod tests;
