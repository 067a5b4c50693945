//! Operation classification
//!
//! Decides, per entry, whether it creates, updates, deletes or does nothing.
//! Reads the store but never writes; every entry is classified before
//! anything is staged.

#![allow(clippy::result_large_err)]

use crate::errors::{ResxError, Result};
use crate::model::{EntryOperation, Operation, PersistedEntity, ResourceId, ResourceMutation};
use crate::ops::PersistenceStore;
use crate::policy::DeletePolicy;
use crate::transaction::match_resolver::CandidateMatchSet;

const FORCED_ID_MAX_LEN: usize = 64;

/// Final decision for one entry
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// New resource; `forced_id` is the client-assigned id, if any
    Create { forced_id: Option<String> },
    Update { target: PersistedEntity },
    Delete { target: PersistedEntity },
    /// Nothing written; `existing` is the resource the entry resolved to
    Noop { existing: Option<PersistedEntity> },
}

impl Classification {
    pub fn operation(&self) -> EntryOperation {
        match self {
            Classification::Create { .. } => EntryOperation::Create,
            Classification::Update { .. } => EntryOperation::Update,
            Classification::Delete { .. } => EntryOperation::Delete,
            Classification::Noop { .. } => EntryOperation::Noop,
        }
    }
}

/// Classify one entry
///
/// `candidates` is the resolved match set when the entry carries criteria.
///
/// # Errors
///
/// `AmbiguousMatch`, `MissingIdentifier`, `UnresolvableTarget`,
/// `ResourceNotFound`, `InvalidForcedId`, or a store failure.
pub fn classify<S>(
    mutation: &ResourceMutation,
    candidates: Option<&CandidateMatchSet>,
    store: &S,
    policy: DeletePolicy,
) -> Result<Classification>
where
    S: PersistenceStore + ?Sized,
{
    let requested = mutation.requested_operation();

    if let (Some(match_url), Some(candidates)) = (mutation.criteria(), candidates) {
        if candidates.len() > 1 {
            return Err(ResxError::AmbiguousMatch {
                operation: requested.unwrap_or(Operation::Update).to_string(),
                match_url: match_url.to_string(),
                count: candidates.len(),
            });
        }

        if let Some(found) = candidates.single() {
            let existing = load_candidate(store, found)?;
            return Ok(match requested {
                Some(Operation::Create) => Classification::Noop {
                    existing: Some(existing),
                },
                Some(Operation::Delete) => Classification::Delete { target: existing },
                Some(Operation::Update) | None => Classification::Update { target: existing },
            });
        }

        match requested {
            Some(Operation::Create) => return Ok(Classification::Create { forced_id: None }),
            // zero matches with a stored id: the id decides
            Some(Operation::Delete) if has_stored_id(mutation) => {}
            Some(Operation::Delete) => {
                return match policy {
                    DeletePolicy::Strict => Err(ResxError::UnresolvableTarget {
                        resource_type: mutation.resource.resource_type.clone(),
                        match_url: match_url.to_string(),
                    }),
                    DeletePolicy::Idempotent => Ok(Classification::Noop { existing: None }),
                };
            }
            // zero matches: fall back to the entry's own id
            Some(Operation::Update) | None => {}
        }
    }

    classify_by_identity(mutation, requested, store, policy)
}

fn classify_by_identity<S>(
    mutation: &ResourceMutation,
    requested: Option<Operation>,
    store: &S,
    policy: DeletePolicy,
) -> Result<Classification>
where
    S: PersistenceStore + ?Sized,
{
    let resource_type = mutation.resource.resource_type.as_str();
    let supplied = mutation.resource.id.as_ref().filter(|id| id.has_id_part());
    let missing = |operation: Operation| ResxError::MissingIdentifier {
        operation: operation.to_string(),
        resource_type: resource_type.to_string(),
    };

    match requested {
        Some(Operation::Create) => Ok(Classification::Create { forced_id: None }),
        Some(Operation::Update) => {
            let id = supplied.ok_or_else(|| missing(Operation::Update))?;
            if is_transient(id) {
                return Ok(Classification::Create { forced_id: None });
            }
            match store.load(resource_type, id.id_part())? {
                Some(existing) => Ok(Classification::Update { target: existing }),
                None => {
                    tracing::debug!(resource_id = %id, "update of unknown id becomes create");
                    Ok(Classification::Create {
                        forced_id: Some(validate_forced_id(id)?),
                    })
                }
            }
        }
        Some(Operation::Delete) => {
            let id = supplied.ok_or_else(|| missing(Operation::Delete))?;
            let existing = if is_transient(id) {
                None
            } else {
                store.load(resource_type, id.id_part())?
            };
            match (existing, policy) {
                (Some(existing), DeletePolicy::Idempotent) if existing.is_deleted() => {
                    Ok(Classification::Noop {
                        existing: Some(existing),
                    })
                }
                (Some(existing), _) => Ok(Classification::Delete { target: existing }),
                (None, DeletePolicy::Strict) => Err(ResxError::ResourceNotFound {
                    resource_id: id.qualified(),
                }),
                (None, DeletePolicy::Idempotent) => Ok(Classification::Noop { existing: None }),
            }
        }
        None => match supplied {
            Some(id) if !is_transient(id) => match store.load(resource_type, id.id_part())? {
                Some(existing) => Ok(Classification::Update { target: existing }),
                None => Ok(Classification::Create {
                    forced_id: Some(validate_forced_id(id)?),
                }),
            },
            _ => Ok(Classification::Create { forced_id: None }),
        },
    }
}

fn load_candidate<S>(store: &S, found: &ResourceId) -> Result<PersistedEntity>
where
    S: PersistenceStore + ?Sized,
{
    store
        .load(found.resource_type().unwrap_or_default(), found.id_part())?
        .ok_or_else(|| ResxError::ResourceNotFound {
            resource_id: found.qualified(),
        })
}

fn has_stored_id(mutation: &ResourceMutation) -> bool {
    mutation
        .resource
        .id
        .as_ref()
        .is_some_and(|id| id.has_id_part() && !is_transient(id))
}

// Placeholders and local ids never name a stored resource
fn is_transient(id: &ResourceId) -> bool {
    id.is_placeholder() || id.is_local()
}

/// Check a client-assigned id before it reaches the store
///
/// Accepts 1 to 64 characters from `[A-Za-z0-9-.]`, not all digits (the
/// numeric space belongs to server-assigned ids).
///
/// This narrows update-as-create: an UPDATE of an absent `Patient/777`
/// fails with `InvalidForcedId` instead of creating it, while an absent
/// `Patient/p777` is created.
pub fn validate_forced_id(id: &ResourceId) -> Result<String> {
    let id_part = id.id_part();
    let invalid = |reason: &str| ResxError::InvalidForcedId {
        resource_id: id.qualified(),
        reason: reason.to_string(),
    };

    if id_part.is_empty() || id_part.len() > FORCED_ID_MAX_LEN {
        return Err(invalid("length must be between 1 and 64"));
    }
    if !id_part
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return Err(invalid("only letters, digits, '-' and '.' are allowed"));
    }
    if id_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("purely numeric ids are reserved for the server"));
    }
    Ok(id_part.to_string())
}
