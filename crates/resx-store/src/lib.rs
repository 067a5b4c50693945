//! resx store - SQLite persistence and file formats
//!
//! Provides:
//! - SQLite schema with a checksummed migrations framework
//! - A SQLite unit of work implementing the core store seams
//! - History, tag and count queries over committed data
//! - Bundle and schema file parsing (YAML or JSON)

pub mod bundle;
pub mod db;
pub mod errors;
pub mod migrations;
pub mod schema_file;
pub mod sqlite;

pub use errors::Result;
pub use sqlite::{SqliteHistory, SqliteSystemStore, SqliteUnitOfWork};
