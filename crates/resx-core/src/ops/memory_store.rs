//! In-memory store
//!
//! Single-threaded, no locking. A unit of work operates on a private copy
//! of the state and swaps it in on commit, so a dropped or failed unit of
//! work leaves the store untouched.

#![allow(clippy::result_large_err)]

use crate::errors::{ExError, ExErrorKind};
use crate::model::{EntryOperation, PersistedEntity, Resource, ResourceId, Tag};
use crate::ops::{HistoryProvider, PersistenceStore, SearchEngine, StagedWrite, SystemStore};
use crate::registry::SchemaRegistry;
use crate::search::{extract_index, SearchParameterMap};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

type RecordKey = (String, String);

#[derive(Debug, Clone, Default)]
struct MemoryState {
    records: BTreeMap<RecordKey, PersistedEntity>,
    history: Vec<PersistedEntity>,
    tags: BTreeSet<Tag>,
    next_pid: i64,
}

/// Committed in-memory resources, versions and tags
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: MemoryState,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a unit of work over a private copy of the current state
    pub fn begin<'s>(&'s mut self, registry: &'s SchemaRegistry) -> MemoryUnitOfWork<'s> {
        let working = self.state.clone();
        MemoryUnitOfWork {
            store: self,
            registry,
            working,
            staged: Vec::new(),
        }
    }

    /// Latest committed version of a resource
    pub fn get(&self, resource_type: &str, id_part: &str) -> Option<&PersistedEntity> {
        self.state
            .records
            .get(&key(resource_type, id_part))
            .filter(|e| e.version > 0)
    }

    /// Number of committed, live resources
    pub fn live_count(&self) -> usize {
        self.state.records.values().filter(|e| is_live(e)).count()
    }
}

/// Open unit of work against a [`MemoryStore`]
pub struct MemoryUnitOfWork<'s> {
    store: &'s mut MemoryStore,
    registry: &'s SchemaRegistry,
    working: MemoryState,
    staged: Vec<StagedWrite>,
}

impl SearchEngine for MemoryUnitOfWork<'_> {
    fn search(
        &self,
        resource_type: &str,
        params: &SearchParameterMap,
    ) -> Result<BTreeSet<ResourceId>, ExError> {
        let schema = self.registry.schema(resource_type).ok_or_else(|| {
            ExError::new(ExErrorKind::UnknownResourceType)
                .with_op("search")
                .with_resource_type(resource_type)
        })?;

        Ok(self
            .working
            .records
            .values()
            .filter(|e| e.resource_type() == resource_type && is_live(e))
            .filter(|e| params.matches(&extract_index(schema, &e.resource)))
            .map(PersistedEntity::versionless_id)
            .collect())
    }
}

impl PersistenceStore for MemoryUnitOfWork<'_> {
    fn load(
        &self,
        resource_type: &str,
        id_part: &str,
    ) -> Result<Option<PersistedEntity>, ExError> {
        Ok(self
            .working
            .records
            .get(&key(resource_type, id_part))
            .filter(|e| e.version > 0)
            .cloned())
    }

    fn stage(&mut self, write: StagedWrite) -> Result<usize, ExError> {
        self.staged.push(write);
        Ok(self.staged.len() - 1)
    }

    fn flush(&mut self) -> Result<Vec<ResourceId>, ExError> {
        let staged = std::mem::take(&mut self.staged);
        let mut ids = Vec::with_capacity(staged.len());
        for write in staged {
            let id = match (write.operation, write.existing.as_ref()) {
                (EntryOperation::Create, _) => self.insert_placeholder(&write)?,
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
    ) -> Result<PersistedEntity, ExError> {
        let record_key = key(id.resource_type().unwrap_or_default(), id.id_part());
        let current = self.working.records.get(&record_key).ok_or_else(|| {
            ExError::new(ExErrorKind::NotFound)
                .with_op("write_version")
                .with_resource_id(id.to_string())
        })?;

        let now = Utc::now();
        let version = current.version + 1;
        let deleted_at = match operation {
            EntryOperation::Delete => Some(resource.deleted_at.unwrap_or(now)),
            _ => None,
        };

        let mut tags: BTreeSet<Tag> = current.resource.tags.iter().cloned().collect();
        tags.extend(resource.tags.iter().cloned());
        self.working.tags.extend(tags.iter().cloned());

        let mut stored = resource.clone();
        stored.id = Some(id.to_versionless().with_version(version));
        stored.tags = tags.into_iter().collect();
        stored.updated_at = Some(now);
        stored.deleted_at = deleted_at;

        let entity = PersistedEntity {
            pid: current.pid,
            resource_id: id.to_versionless().with_version(version),
            forced_id: current.forced_id.clone(),
            version,
            updated_at: now,
            deleted_at,
            resource: stored,
        };

        self.working.history.push(entity.clone());
        self.working.records.insert(record_key, entity.clone());
        Ok(entity)
    }

    fn commit(self) -> Result<(), ExError> {
        self.store.state = self.working;
        Ok(())
    }
}

impl MemoryUnitOfWork<'_> {
    fn insert_placeholder(&mut self, write: &StagedWrite) -> Result<ResourceId, ExError> {
        self.working.next_pid += 1;
        let pid = self.working.next_pid;
        let id_part = write.forced_id.clone().unwrap_or_else(|| pid.to_string());

        let record_key = key(&write.resource_type, &id_part);
        if self.working.records.contains_key(&record_key) {
            return Err(ExError::new(ExErrorKind::ConstraintViolation)
                .with_op("flush")
                .with_resource_id(format!("{}/{}", write.resource_type, id_part))
                .with_message("Resource ID already in use"));
        }

        let id = ResourceId::new(write.resource_type.as_str(), id_part.as_str());
        self.working.records.insert(
            record_key,
            PersistedEntity {
                pid,
                resource_id: id.clone(),
                forced_id: write.forced_id.clone(),
                version: 0,
                updated_at: Utc::now(),
                deleted_at: None,
                resource: Resource::new(write.resource_type.as_str()),
            },
        );
        Ok(id)
    }
}

/// History snapshot taken from a [`MemoryStore`]
pub struct MemoryHistory {
    entries: Vec<PersistedEntity>,
}

impl HistoryProvider for MemoryHistory {
    fn size(&self) -> Result<usize, ExError> {
        Ok(self.entries.len())
    }

    fn page(&self, offset: usize, count: usize) -> Result<Vec<PersistedEntity>, ExError> {
        Ok(self
            .entries
            .iter()
            .skip(offset)
            .take(count)
            .cloned()
            .collect())
    }
}

impl SystemStore for MemoryStore {
    type History<'a> = MemoryHistory;

    fn history(&self, since: Option<DateTime<Utc>>) -> Result<MemoryHistory, ExError> {
        let entries = self
            .state
            .history
            .iter()
            .rev()
            .filter(|e| since.map_or(true, |s| e.updated_at >= s))
            .cloned()
            .collect();
        Ok(MemoryHistory { entries })
    }

    fn all_tags(&self) -> Result<Vec<Tag>, ExError> {
        Ok(self.state.tags.iter().cloned().collect())
    }

    fn resource_counts(&self) -> Result<BTreeMap<String, u64>, ExError> {
        let mut counts = BTreeMap::new();
        for entity in self.state.records.values().filter(|e| is_live(e)) {
            *counts.entry(entity.resource_type().to_string()).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

fn key(resource_type: &str, id_part: &str) -> RecordKey {
    (resource_type.to_string(), id_part.to_string())
}

fn is_live(entity: &PersistedEntity) -> bool {
    entity.version > 0 && !entity.is_deleted()
}
