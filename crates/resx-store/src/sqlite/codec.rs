//! Row decoding and timestamp conversion shared by the SQLite types

#![allow(clippy::result_large_err)]

use crate::errors::{payload_error, Result};
use chrono::{DateTime, TimeZone, Utc};
use resx_core::{PersistedEntity, Resource, ResourceId};
use rusqlite::Row;

/// Column list matching [`EntityRow::from_row`]
pub(crate) const ENTITY_COLUMNS: &str =
    "pid, res_type, res_id, forced_id, version, payload, updated_at, deleted_at";

/// Same layout over `resource_versions`, which has no forced id column
pub(crate) const VERSION_COLUMNS: &str =
    "pid, res_type, res_id, NULL AS forced_id, version, payload, updated_at, deleted_at";

pub(crate) struct EntityRow {
    pub pid: i64,
    pub res_type: String,
    pub res_id: Option<String>,
    pub forced_id: Option<String>,
    pub version: i64,
    pub payload: String,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl EntityRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            pid: row.get(0)?,
            res_type: row.get(1)?,
            res_id: row.get(2)?,
            forced_id: row.get(3)?,
            version: row.get(4)?,
            payload: row.get(5)?,
            updated_at: row.get(6)?,
            deleted_at: row.get(7)?,
        })
    }

    pub fn resource_id(&self) -> ResourceId {
        ResourceId::new(
            self.res_type.as_str(),
            self.res_id.clone().unwrap_or_else(|| self.pid.to_string()),
        )
    }

    /// Decode the stored payload into an entity
    pub fn into_entity(self) -> Result<PersistedEntity> {
        let id = self.resource_id();
        let qualified = id.qualified();
        let version = u64::try_from(self.version).map_err(|e| payload_error(&qualified, e))?;
        let updated_at = from_millis(self.updated_at, &qualified)?;
        let deleted_at = self
            .deleted_at
            .map(|ms| from_millis(ms, &qualified))
            .transpose()?;

        let body: serde_json::Value =
            serde_json::from_str(&self.payload).map_err(|e| payload_error(&qualified, e))?;
        let mut resource = Resource::from_json(body).map_err(|e| payload_error(&qualified, e))?;
        resource.id = Some(id.clone().with_version(version));
        resource.updated_at = Some(updated_at);
        resource.deleted_at = deleted_at;

        Ok(PersistedEntity {
            pid: self.pid,
            resource_id: id.with_version(version),
            forced_id: self.forced_id,
            version,
            updated_at,
            deleted_at,
            resource,
        })
    }
}

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(ms: i64, resource_id: &str) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| payload_error(resource_id, format!("timestamp out of range: {}", ms)))
}

/// Current time at the precision the store keeps
pub(crate) fn now() -> DateTime<Utc> {
    let now = Utc::now();
    Utc.timestamp_millis_opt(now.timestamp_millis())
        .single()
        .unwrap_or(now)
}
