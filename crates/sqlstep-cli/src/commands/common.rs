//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use sqlstep_core::{Config, DirSource, Migration, MigrationSource};
use sqlstep_db::Executor;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// A project directory and its resolved configuration.
#[derive(Debug)]
pub(crate) struct Project {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
}

impl Project {
    pub(crate) fn migrations_dir(&self) -> PathBuf {
        self.config.migrations_dir_absolute(&self.root)
    }

    /// Open the configured database.
    pub(crate) fn connect(&self) -> Result<Box<dyn Executor>> {
        self.config.database.connect(&self.root).with_context(|| {
            format!(
                "Failed to open {} database at {}",
                self.config.database.db_type,
                self.config.database.path_absolute(&self.root)
            )
        })
    }

    /// Configured directory source. A missing directory yields no scripts.
    pub(crate) fn source(&self) -> Option<DirSource> {
        let dir = self.migrations_dir();
        if !dir.is_dir() {
            log::warn!("Migrations directory {} does not exist", dir.display());
            return None;
        }
        Some(self.config.source(&self.root))
    }

    /// Discover migrations, sorted by id.
    pub(crate) fn discover(&self) -> Result<Vec<Migration>> {
        let Some(source) = self.source() else {
            return Ok(Vec::new());
        };
        let migrations = source.load().context("Failed to discover migrations")?;
        log::debug!(
            "Discovered {} migration(s) in {}",
            migrations.len(),
            self.migrations_dir().display()
        );
        Ok(migrations)
    }
}

/// Load the project named by the global arguments, applying overrides.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    let mut config = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(&root),
    }
    .context("Failed to load config")?;

    if let Some(database) = &global.database {
        config.database.path = database.clone();
    }

    Ok(Project { root, config })
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
