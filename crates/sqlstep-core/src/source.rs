//! Migration sources
//!
//! A source turns some representation of migrations into the ordered
//! `Vec<Migration>` handed to [`crate::Migrator::apply`].
//!
//! - [`InlineSource`] yields a caller-built list exactly as given. It does not
//!   sort; callers building lists by hand own the ordering.
//! - [`DirSource`] scans a directory tree for `<integer>.<ext>` scripts.
//! - [`EmbeddedSource`] does the same over a compile-time table of scripts.
//!
//! Both discovering sources drop names whose stem is not a non-negative
//! integer, sort ascending by id, and resolve duplicate ids by keeping the
//! lexicographically first path.

use crate::error::{ActionError, MigrateError, MigrateResult};
use crate::migration::Migration;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default recognized script extension.
pub const DEFAULT_EXTENSION: &str = "sql";

/// Anything that can produce the migration list for one `apply` call.
pub trait MigrationSource {
    /// Consume the source and produce its migrations.
    fn load(self) -> MigrateResult<Vec<Migration>>;
}

/// Caller-ordered list of migrations.
pub struct InlineSource {
    migrations: Vec<Migration>,
}

impl InlineSource {
    pub fn new(migrations: Vec<Migration>) -> Self {
        Self { migrations }
    }
}

impl MigrationSource for InlineSource {
    fn load(self) -> MigrateResult<Vec<Migration>> {
        Ok(self.migrations)
    }
}

/// Parse the migration id out of a file name such as `12.sql`.
///
/// The extension must be one of `extensions` (without the leading dot). The
/// id is everything before the first `.`, and must be ASCII digits only.
pub fn parse_migration_id(file_name: &str, extensions: &[String]) -> Option<i64> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    if !extensions.iter().any(|e| e == ext) {
        return None;
    }

    let stem = file_name.split('.').next()?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// Key candidates by id, keeping the first path seen for each id.
///
/// `candidates` must already be in lexicographic path order.
fn dedupe_by_id<T>(
    candidates: impl IntoIterator<Item = (i64, String, T)>,
) -> BTreeMap<i64, (String, T)> {
    let mut by_id: BTreeMap<i64, (String, T)> = BTreeMap::new();
    for (id, path, item) in candidates {
        if let Some((kept, _)) = by_id.get(&id) {
            log::warn!("Duplicate migration id {id}: keeping {kept}, ignoring {path}");
            continue;
        }
        by_id.insert(id, (path, item));
    }
    by_id
}

/// Migrations discovered from `<integer>.<ext>` files under a directory.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DirSource {
    /// Scan `root` for `.sql` scripts.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: vec![DEFAULT_EXTENSION.to_string()],
        }
    }

    /// Replace the recognized extensions (given without leading dots).
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Id, relative name and absolute path of every matching script, sorted
    /// by id with duplicates resolved.
    pub fn scan(&self) -> MigrateResult<Vec<(i64, String, PathBuf)>> {
        let mut files = Vec::new();
        collect_files_recursive(&self.root, &mut files)?;

        let mut candidates: Vec<(i64, String, PathBuf)> = files
            .into_iter()
            .filter_map(|path| {
                let file_name = path.file_name()?.to_str()?;
                let id = parse_migration_id(file_name, &self.extensions)?;
                let relative = relative_name(&self.root, &path);
                Some((id, relative, path))
            })
            .collect();
        candidates.sort_by(|a, b| a.1.cmp(&b.1));

        Ok(dedupe_by_id(candidates)
            .into_iter()
            .map(|(id, (relative, path))| (id, relative, path))
            .collect())
    }
}

impl MigrationSource for DirSource {
    fn load(self) -> MigrateResult<Vec<Migration>> {
        let migrations = self
            .scan()?
            .into_iter()
            .map(|(id, name, path)| {
                Migration::new(id, name, move |db| {
                    let sql = std::fs::read_to_string(&path).map_err(|e| ActionError::Io {
                        path: path.display().to_string(),
                        source: e,
                    })?;
                    db.execute_batch(&sql)?;
                    Ok(())
                })
            })
            .collect();
        Ok(migrations)
    }
}

/// Path of `path` below `root`, `/`-separated.
fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Recursively collect every file below `dir`
fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> MigrateResult<()> {
    let discovery_error = |e: std::io::Error| MigrateError::Discovery {
        path: dir.display().to_string(),
        source: e,
    };

    for entry in std::fs::read_dir(dir).map_err(discovery_error)? {
        let path = entry.map_err(discovery_error)?.path();
        if path.is_dir() {
            collect_files_recursive(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// A script compiled into the binary, usually via `include_str!`.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedFile {
    /// File name (or relative path) following the `<integer>.<ext>` convention
    pub path: &'static str,
    /// Full script text
    pub sql: &'static str,
}

/// Migrations discovered from a static table of [`EmbeddedFile`]s.
#[derive(Debug, Clone)]
pub struct EmbeddedSource {
    files: &'static [EmbeddedFile],
    extensions: Vec<String>,
}

impl EmbeddedSource {
    pub fn new(files: &'static [EmbeddedFile]) -> Self {
        Self {
            files,
            extensions: vec![DEFAULT_EXTENSION.to_string()],
        }
    }

    /// Replace the recognized extensions (given without leading dots).
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }
}

impl MigrationSource for EmbeddedSource {
    fn load(self) -> MigrateResult<Vec<Migration>> {
        let mut candidates: Vec<(i64, String, &'static str)> = self
            .files
            .iter()
            .filter_map(|file| {
                let file_name = file.path.rsplit('/').next()?;
                let id = parse_migration_id(file_name, &self.extensions)?;
                Some((id, file.path.to_string(), file.sql))
            })
            .collect();
        candidates.sort_by(|a, b| a.1.cmp(&b.1));

        Ok(dedupe_by_id(candidates)
            .into_iter()
            .map(|(id, (name, sql))| Migration::from_sql(id, name, sql))
            .collect())
    }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
