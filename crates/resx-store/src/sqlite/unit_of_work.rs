//! SQLite unit of work
//!
//! Wraps one SQLite transaction. Identities are assigned by inserting rows
//! at version 0 during flush; `write_version` then fills them in. Dropping
//! the unit of work rolls the transaction back.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, is_constraint_violation, payload_error, Result};
use crate::sqlite::codec::{now, to_millis, EntityRow, ENTITY_COLUMNS};
use resx_core::errors::{ExError, ExErrorKind};
use resx_core::ops::{PersistenceStore, SearchEngine, StagedWrite};
use resx_core::search::{extract_index, IndexEntry, SearchParameterMap};
use resx_core::{EntryOperation, PersistedEntity, Resource, ResourceId, SchemaRegistry, Tag};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::{BTreeMap, BTreeSet};

/// Open unit of work against a SQLite store
pub struct SqliteUnitOfWork<'c> {
    tx: Transaction<'c>,
    registry: &'c SchemaRegistry,
    staged: Vec<StagedWrite>,
}

impl<'c> SqliteUnitOfWork<'c> {
    /// Start a transaction on `conn`
    ///
    /// # Errors
    ///
    /// When SQLite cannot open a transaction.
    pub fn begin(conn: &'c mut Connection, registry: &'c SchemaRegistry) -> Result<Self> {
        let tx = conn.transaction().map_err(from_rusqlite)?;
        Ok(Self {
            tx,
            registry,
            staged: Vec::new(),
        })
    }

    fn select_current(&self, resource_type: &str, id_part: &str) -> Result<Option<EntityRow>> {
        let sql = format!(
            "SELECT {} FROM resources WHERE res_type = ?1 AND res_id = ?2",
            ENTITY_COLUMNS
        );
        self.tx
            .query_row(&sql, params![resource_type, id_part], EntityRow::from_row)
            .optional()
            .map_err(from_rusqlite)
    }

    fn insert_identity(&mut self, write: &StagedWrite) -> Result<ResourceId> {
        let inserted = self.tx.execute(
            "INSERT INTO resources (res_type, res_id, forced_id, updated_at)
             VALUES (?1, ?2, ?2, ?3)",
            params![write.resource_type, write.forced_id, to_millis(now())],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                return Err(ExError::new(ExErrorKind::ConstraintViolation)
                    .with_op("flush")
                    .with_resource_type(write.resource_type.as_str())
                    .with_resource_id(write.forced_id.clone().unwrap_or_default())
                    .with_message("Resource ID already in use"))
            }
            Err(e) => return Err(from_rusqlite(e)),
        }

        let pid = self.tx.last_insert_rowid();
        let id_part = match &write.forced_id {
            Some(forced) => forced.clone(),
            None => {
                let assigned = pid.to_string();
                self.tx
                    .execute(
                        "UPDATE resources SET res_id = ?1 WHERE pid = ?2",
                        params![assigned, pid],
                    )
                    .map_err(from_rusqlite)?;
                assigned
            }
        };
        Ok(ResourceId::new(write.resource_type.as_str(), id_part))
    }

    fn write_index(&self, pid: i64, stored: &Resource) -> Result<()> {
        self.tx
            .execute("DELETE FROM search_index WHERE pid = ?1", [pid])
            .map_err(from_rusqlite)?;
        if stored.is_deleted() {
            return Ok(());
        }

        let schema = self.registry.schema(&stored.resource_type).ok_or_else(|| {
            ExError::new(ExErrorKind::UnknownResourceType)
                .with_op("write_index")
                .with_resource_type(stored.resource_type.as_str())
        })?;

        let mut stmt = self
            .tx
            .prepare_cached(
                "INSERT INTO search_index (pid, res_type, param_name, system, value)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(from_rusqlite)?;
        for entry in extract_index(schema, stored) {
            stmt.execute(params![
                pid,
                stored.resource_type,
                entry.param,
                entry.system,
                entry.value
            ])
            .map_err(from_rusqlite)?;
        }
        Ok(())
    }

    fn write_tags(&self, pid: i64, tags: &[Tag]) -> Result<()> {
        for tag in tags {
            let scheme = tag.scheme.as_deref().unwrap_or_default();
            self.tx
                .execute(
                    "INSERT INTO tag_definitions (scheme, term, label) VALUES (?1, ?2, ?3)
                     ON CONFLICT (scheme, term) DO NOTHING",
                    params![scheme, tag.term, tag.label],
                )
                .map_err(from_rusqlite)?;
            self.tx
                .execute(
                    "INSERT OR IGNORE INTO resource_tags (pid, tag_id)
                     SELECT ?1, tag_id FROM tag_definitions WHERE scheme = ?2 AND term = ?3",
                    params![pid, scheme, tag.term],
                )
                .map_err(from_rusqlite)?;
        }
        Ok(())
    }
}

impl SearchEngine for SqliteUnitOfWork<'_> {
    fn search(
        &self,
        resource_type: &str,
        params: &SearchParameterMap,
    ) -> Result<BTreeSet<ResourceId>> {
        if !self.registry.is_registered(resource_type) {
            return Err(ExError::new(ExErrorKind::UnknownResourceType)
                .with_op("search")
                .with_resource_type(resource_type));
        }

        let mut stmt = self
            .tx
            .prepare_cached(
                "SELECT r.pid, r.res_id, s.param_name, s.system, s.value
                 FROM resources r
                 LEFT JOIN search_index s ON s.pid = r.pid
                 WHERE r.res_type = ?1 AND r.version > 0 AND r.deleted_at IS NULL
                 ORDER BY r.pid",
            )
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([resource_type], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })
            .map_err(from_rusqlite)?;

        let mut grouped: BTreeMap<i64, (String, Vec<IndexEntry>)> = BTreeMap::new();
        for row in rows {
            let (pid, res_id, param, system, value) = row.map_err(from_rusqlite)?;
            let (_, entries) = grouped.entry(pid).or_insert_with(|| (res_id, Vec::new()));
            if let (Some(param), Some(value)) = (param, value) {
                entries.push(IndexEntry {
                    param,
                    system,
                    value,
                });
            }
        }

        Ok(grouped
            .into_values()
            .filter(|(_, entries)| params.matches(entries))
            .map(|(res_id, _)| ResourceId::new(resource_type, res_id))
            .collect())
    }
}

impl PersistenceStore for SqliteUnitOfWork<'_> {
    fn load(
        &self,
        resource_type: &str,
        id_part: &str,
    ) -> Result<Option<PersistedEntity>> {
        self.select_current(resource_type, id_part)?
            .filter(|row| row.version > 0)
            .map(EntityRow::into_entity)
            .transpose()
    }

    fn stage(&mut self, write: StagedWrite) -> Result<usize> {
        self.staged.push(write);
        Ok(self.staged.len() - 1)
    }

    fn flush(&mut self) -> Result<Vec<ResourceId>> {
        let staged = std::mem::take(&mut self.staged);
        let mut ids = Vec::with_capacity(staged.len());
        for write in staged {
            let id = match (write.operation, write.existing.as_ref()) {
                (EntryOperation::Create, _) => self.insert_identity(&write)?,
                (_, Some(existing)) => existing.to_versionless(),
                (op, None) => {
                    return Err(ExError::new(ExErrorKind::Internal)
                        .with_op("flush")
                        .with_message(format!("{} staged without a target", op)))
                }
            };
            ids.push(id);
        }
        Ok(ids)
    }

    fn write_version(
        &mut self,
        id: &ResourceId,
        operation: EntryOperation,
        resource: &Resource,
    ) -> Result<PersistedEntity> {
        let canonical = id.to_versionless();
        let current = self
            .select_current(canonical.resource_type().unwrap_or_default(), canonical.id_part())?
            .ok_or_else(|| {
                ExError::new(ExErrorKind::NotFound)
                    .with_op("write_version")
                    .with_resource_id(canonical.qualified())
            })?;

        let pid = current.pid;
        let forced_id = current.forced_id.clone();
        let version = u64::try_from(current.version).unwrap_or_default() + 1;
        let previous_tags = if current.version > 0 {
            current.into_entity()?.resource.tags
        } else {
            Vec::new()
        };

        let now = now();
        let deleted_at = match operation {
            EntryOperation::Delete => Some(resource.deleted_at.unwrap_or(now)),
            _ => None,
        };

        let mut tags: BTreeSet<Tag> = previous_tags.into_iter().collect();
        tags.extend(resource.tags.iter().cloned());

        let mut stored = resource.clone();
        stored.id = Some(canonical.clone().with_version(version));
        stored.tags = tags.into_iter().collect();
        stored.updated_at = Some(now);
        stored.deleted_at = deleted_at;

        let payload = serde_json::to_string(&stored.to_json())
            .map_err(|e| payload_error(&canonical.qualified(), e))?;
        let version_column =
            i64::try_from(version).map_err(|e| payload_error(&canonical.qualified(), e))?;
        let deleted_column = deleted_at.map(to_millis);

        self.tx
            .execute(
                "UPDATE resources SET version = ?1, payload = ?2, updated_at = ?3, deleted_at = ?4
                 WHERE pid = ?5",
                params![version_column, payload, to_millis(now), deleted_column, pid],
            )
            .map_err(from_rusqlite)?;
        self.write_index(pid, &stored)?;
        self.write_tags(pid, &stored.tags)?;
        self.tx
            .execute(
                "INSERT INTO resource_versions
                     (pid, res_type, res_id, version, payload, updated_at, deleted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    pid,
                    stored.resource_type,
                    canonical.id_part(),
                    version_column,
                    payload,
                    to_millis(now),
                    deleted_column
                ],
            )
            .map_err(from_rusqlite)?;

        tracing::debug!(resource_id = %canonical, version, %operation, "version written");

        Ok(PersistedEntity {
            pid,
            resource_id: canonical.with_version(version),
            forced_id,
            version,
            updated_at: now,
            deleted_at,
            resource: stored,
        })
    }

    fn commit(self) -> Result<()> {
        self.tx.commit().map_err(from_rusqlite)
    }
}
