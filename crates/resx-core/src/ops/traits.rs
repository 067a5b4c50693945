//! Store seams consumed by the transaction processor
//!
//! Store code reports failures as `ExError`; the processor surfaces them
//! unchanged through `ResxError::Store`.

#![allow(clippy::result_large_err)]

use crate::errors::ExError;
use crate::model::{EntryOperation, PersistedEntity, Resource, ResourceId, Tag};
use crate::ops::HistoryPages;
use crate::search::SearchParameterMap;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Executes structured queries against committed, live resources
pub trait SearchEngine {
    /// Canonical versionless ids of every live resource of `resource_type`
    /// satisfying all clauses of `params`
    ///
    /// # Errors
    ///
    /// Store failures only; an empty result is not an error.
    fn search(
        &self,
        resource_type: &str,
        params: &SearchParameterMap,
    ) -> Result<BTreeSet<ResourceId>, ExError>;
}

/// A write registered before the flush point
#[derive(Debug, Clone, PartialEq)]
pub struct StagedWrite {
    pub resource_type: String,
    pub operation: EntryOperation,
    /// Client-assigned id for a CREATE; `None` means server-assigned
    pub forced_id: Option<String>,
    /// Target of an UPDATE or DELETE
    pub existing: Option<ResourceId>,
}

impl StagedWrite {
    pub fn create(resource_type: &str, forced_id: Option<String>) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            operation: EntryOperation::Create,
            forced_id,
            existing: None,
        }
    }

    pub fn modify(operation: EntryOperation, existing: ResourceId) -> Self {
        Self {
            resource_type: existing.resource_type().unwrap_or_default().to_string(),
            operation,
            forced_id: None,
            existing: Some(existing),
        }
    }
}

/// One open unit of work against the persistent store
///
/// Nothing becomes durable before [`PersistenceStore::commit`]. Dropping
/// the unit of work without committing discards every write.
pub trait PersistenceStore {
    /// Latest version of a resource, tombstoned or not
    ///
    /// # Errors
    ///
    /// Store failures only; an unknown id yields `Ok(None)`.
    fn load(&self, resource_type: &str, id_part: &str)
        -> Result<Option<PersistedEntity>, ExError>;

    /// Register a write; returns its position in the flush result
    ///
    /// # Errors
    ///
    /// When staging after the flush point.
    fn stage(&mut self, write: StagedWrite) -> Result<usize, ExError>;

    /// The single flush point: assigns a canonical identity to every staged
    /// write, in staging order
    ///
    /// # Errors
    ///
    /// `ConstraintViolation` when a forced id is already taken, or any
    /// store failure.
    fn flush(&mut self) -> Result<Vec<ResourceId>, ExError>;

    /// Write the next version of a flushed resource
    ///
    /// Bumps the version, stamps `updated_at`, merges tags, refreshes the
    /// search index and appends a history row.
    ///
    /// # Errors
    ///
    /// `NotFound` when `id` was not flushed, or any store failure.
    fn write_version(
        &mut self,
        id: &ResourceId,
        operation: EntryOperation,
        resource: &Resource,
    ) -> Result<PersistedEntity, ExError>;

    /// Make every write durable
    ///
    /// # Errors
    ///
    /// Any store failure; nothing is durable in that case.
    fn commit(self) -> Result<(), ExError>
    where
        Self: Sized;
}

/// Lazily paged view over a history query
///
/// The window is fixed when the provider is created, so pages stay stable
/// while new versions are written.
pub trait HistoryProvider {
    /// Total number of versions in the window
    ///
    /// # Errors
    ///
    /// Store failures.
    fn size(&self) -> Result<usize, ExError>;

    /// Versions `offset..offset + count`, newest first
    ///
    /// # Errors
    ///
    /// Store failures.
    fn page(&self, offset: usize, count: usize) -> Result<Vec<PersistedEntity>, ExError>;

    /// Iterate the window `page_size` versions at a time
    fn pages(&self, page_size: usize) -> HistoryPages<'_>
    where
        Self: Sized,
    {
        HistoryPages::new(self, page_size)
    }
}

/// System-level read operations
pub trait SystemStore {
    type History<'a>: HistoryProvider
    where
        Self: 'a;

    /// Every version written at or after `since` (all time when `None`)
    ///
    /// # Errors
    ///
    /// Store failures.
    fn history(&self, since: Option<DateTime<Utc>>) -> Result<Self::History<'_>, ExError>;

    /// Every distinct tag ever applied, sorted
    ///
    /// # Errors
    ///
    /// Store failures.
    fn all_tags(&self) -> Result<Vec<Tag>, ExError>;

    /// Live (non-tombstoned) resources per type
    ///
    /// # Errors
    ///
    /// Store failures.
    fn resource_counts(&self) -> Result<BTreeMap<String, u64>, ExError>;
}
