//! sqlstep-core - Core library for sqlstep
//!
//! Applies an ordered set of one-shot schema migrations to a database exactly
//! once each. The ledger (a `migrations` table in the target database)
//! records every migration the engine has started, and each `apply` call only
//! runs migrations above the highest recorded id.

pub mod config;
pub mod error;
pub mod ledger;
pub mod migration;
pub mod migrator;
pub mod progress;
pub mod source;

pub use config::{Config, DatabaseConfig, DbType};
pub use error::{ActionError, ActionResult, ConfigError, MigrateError, MigrateResult};
pub use ledger::{Ledger, LedgerRecord, SqlLedger};
pub use migration::Migration;
pub use migrator::Migrator;
pub use progress::{LogSink, ProgressEvent, ProgressSink};
pub use source::{DirSource, EmbeddedFile, EmbeddedSource, InlineSource, MigrationSource};
