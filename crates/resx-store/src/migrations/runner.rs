#![allow(clippy::result_large_err)]

use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};
use crate::migrations::{Migration, MIGRATIONS};
use rusqlite::{params, Connection};
use std::collections::HashMap;

/// What a [`migrate`] call did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub applied: Vec<&'static str>,
    pub already_applied: usize,
}

/// Bring the store schema up to date
///
/// Every recorded migration is verified against its compiled-in checksum
/// before anything new is applied. Each pending migration runs in its own
/// transaction together with its bookkeeping row.
///
/// # Errors
///
/// `ConstraintViolation` when a recorded checksum differs, `Persistence`
/// when a migration's SQL fails.
pub fn migrate(conn: &mut Connection) -> Result<MigrationReport> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS resx_migrations (
            name TEXT PRIMARY KEY,
            checksum TEXT NOT NULL,
            applied_at INTEGER NOT NULL
        )",
    )
    .map_err(from_rusqlite)?;

    let recorded = recorded_checksums(conn)?;
    let mut report = MigrationReport::default();
    for migration in MIGRATIONS {
        match recorded.get(migration.name) {
            Some(found) => {
                let expected = migration.checksum();
                if *found != expected {
                    return Err(checksum_mismatch(migration.name, &expected, found));
                }
                report.already_applied += 1;
            }
            None => {
                apply(conn, migration)?;
                report.applied.push(migration.name);
            }
        }
    }
    Ok(report)
}

fn recorded_checksums(conn: &Connection) -> Result<HashMap<String, String>> {
    let mut stmt = conn
        .prepare("SELECT name, checksum FROM resx_migrations")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<HashMap<String, String>, _>>()
        .map_err(from_rusqlite)?;
    Ok(rows)
}

fn apply(conn: &mut Connection, migration: &Migration) -> Result<()> {
    let tx = conn.transaction().map_err(from_rusqlite)?;
    tx.execute_batch(migration.sql)
        .map_err(|e| migration_error(migration.name, &e.to_string()))?;
    tx.execute(
        "INSERT INTO resx_migrations (name, checksum, applied_at) VALUES (?1, ?2, ?3)",
        params![
            migration.name,
            migration.checksum(),
            chrono::Utc::now().timestamp_millis()
        ],
    )
    .map_err(from_rusqlite)?;
    tx.commit().map_err(from_rusqlite)?;
    tracing::debug!(migration = migration.name, "migration applied");
    Ok(())
}
