use crate::model::{Resource, ResourceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored resource version
///
/// Produced only by a persistence store. `resource_id` is canonical and
/// carries the version number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEntity {
    /// Store-internal primary key
    pub pid: i64,
    pub resource_id: ResourceId,
    /// Client-assigned id, when the identity was not server-assigned
    pub forced_id: Option<String>,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub resource: Resource,
}

impl PersistedEntity {
    pub fn resource_type(&self) -> &str {
        &self.resource.resource_type
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Canonical `Type/id` without version
    pub fn versionless_id(&self) -> ResourceId {
        self.resource_id.to_versionless()
    }
}
