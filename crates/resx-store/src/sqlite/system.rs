//! System-level queries over committed data

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::sqlite::codec::{to_millis, EntityRow, VERSION_COLUMNS};
use chrono::{DateTime, Utc};
use resx_core::ops::{HistoryProvider, SystemStore};
use resx_core::{PersistedEntity, Tag};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;

/// Read-only view of a SQLite store
pub struct SqliteSystemStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteSystemStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

/// Lazily paged history window
///
/// The window is pinned to the versions that existed when it was opened.
pub struct SqliteHistory<'c> {
    conn: &'c Connection,
    since: Option<i64>,
    until_vid: i64,
}

impl HistoryProvider for SqliteHistory<'_> {
    fn size(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM resource_versions
                 WHERE vid <= ?1 AND (?2 IS NULL OR updated_at >= ?2)",
                params![self.until_vid, self.since],
                |row| row.get(0),
            )
            .map_err(from_rusqlite)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn page(
        &self,
        offset: usize,
        count: usize,
    ) -> Result<Vec<PersistedEntity>> {
        let sql = format!(
            "SELECT {} FROM resource_versions
             WHERE vid <= ?1 AND (?2 IS NULL OR updated_at >= ?2)
             ORDER BY updated_at DESC, vid DESC
             LIMIT ?3 OFFSET ?4",
            VERSION_COLUMNS
        );
        let limit = i64::try_from(count).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let mut stmt = self.conn.prepare_cached(&sql).map_err(from_rusqlite)?;
        let rows = stmt
            .query_map(
                params![self.until_vid, self.since, limit, offset],
                EntityRow::from_row,
            )
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        rows.into_iter().map(EntityRow::into_entity).collect()
    }
}

impl<'c> SystemStore for SqliteSystemStore<'c> {
    type History<'a> = SqliteHistory<'a> where Self: 'a;

    fn history(&self, since: Option<DateTime<Utc>>) -> Result<SqliteHistory<'_>> {
        let until_vid: i64 = self
            .conn
            .query_row(
                "SELECT COALESCE(MAX(vid), 0) FROM resource_versions",
                [],
                |row| row.get(0),
            )
            .map_err(from_rusqlite)?;

        Ok(SqliteHistory {
            conn: self.conn,
            since: since.map(to_millis),
            until_vid,
        })
    }

    fn all_tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT scheme, term, label FROM tag_definitions")
            .map_err(from_rusqlite)?;
        let mut tags = stmt
            .query_map([], |row| {
                let scheme: String = row.get(0)?;
                Ok(Tag {
                    scheme: Some(scheme).filter(|s| !s.is_empty()),
                    term: row.get(1)?,
                    label: row.get(2)?,
                })
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        tags.sort();
        Ok(tags)
    }

    fn resource_counts(&self) -> Result<BTreeMap<String, u64>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT res_type, COUNT(*) FROM resources
                 WHERE version > 0 AND deleted_at IS NULL
                 GROUP BY res_type",
            )
            .map_err(from_rusqlite)?;
        let counts = stmt
            .query_map([], |row| {
                let count: i64 = row.get(1)?;
                Ok((row.get::<_, String>(0)?, u64::try_from(count).unwrap_or_default()))
            })
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<BTreeMap<_, _>, _>>()
            .map_err(from_rusqlite)?;
        Ok(counts)
    }
}
