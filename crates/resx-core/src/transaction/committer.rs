//! Persistence commit: staging, the single flush, version writes
//!
//! Identities assigned at flush are the only ones the rewriter may use.

#![allow(clippy::result_large_err)]

use crate::errors::{ExError, ExErrorKind, ResxError, Result};
use crate::model::{EntryOperation, EntryOutcome, ResourceId};
use crate::ops::{PersistenceStore, StagedWrite};
use crate::transaction::classifier::Classification;
use crate::transaction::PlannedEntry;

/// Stage every writing entry, then flush once
///
/// Returns one identity per entry, positioned like the batch: the flushed
/// identity for writes, the existing identity for a resolved no-op, `None`
/// for a no-op that resolved to nothing.
///
/// # Errors
///
/// Store failures from staging or flushing.
pub fn stage_and_flush<S>(store: &mut S, plans: &[PlannedEntry]) -> Result<Vec<Option<ResourceId>>>
where
    S: PersistenceStore + ?Sized,
{
    let mut tickets = Vec::with_capacity(plans.len());
    for plan in plans {
        let write = match &plan.classification {
            Classification::Create { forced_id } => Some(StagedWrite::create(
                &plan.mutation.resource.resource_type,
                forced_id.clone(),
            )),
            Classification::Update { target } => Some(StagedWrite::modify(
                EntryOperation::Update,
                target.versionless_id(),
            )),
            Classification::Delete { target } => Some(StagedWrite::modify(
                EntryOperation::Delete,
                target.versionless_id(),
            )),
            Classification::Noop { .. } => None,
        };
        tickets.push(write.map(|w| store.stage(w)).transpose()?);
    }

    let flushed = store.flush()?;
    tracing::debug!(staged = flushed.len(), "flushed staged writes");

    plans
        .iter()
        .zip(tickets)
        .map(|(plan, ticket)| match (ticket, &plan.classification) {
            (Some(position), _) => flushed
                .get(position)
                .cloned()
                .map(Some)
                .ok_or_else(|| ResxError::from(missing_identity(position))),
            (None, Classification::Noop { existing }) => {
                Ok(existing.as_ref().map(|e| e.versionless_id()))
            }
            (None, _) => Ok(None),
        })
        .collect()
}

/// Write the new version of every writing entry, in batch order
///
/// DELETE writes a tombstone of the current state, stamped with the
/// entry's deletion time when it carries one.
///
/// # Errors
///
/// Store failures.
pub fn write_versions<S>(
    store: &mut S,
    plans: Vec<PlannedEntry>,
    identities: &[Option<ResourceId>],
) -> Result<Vec<EntryOutcome>>
where
    S: PersistenceStore + ?Sized,
{
    let mut outcomes = Vec::with_capacity(plans.len());

    for (position, (plan, identity)) in plans.into_iter().zip(identities).enumerate() {
        let PlannedEntry {
            mutation,
            classification,
        } = plan;
        let operation = classification.operation();

        let outcome = match (classification, identity) {
            (Classification::Noop { existing }, _) => EntryOutcome {
                operation,
                resource_id: existing.as_ref().map(|e| e.resource_id.clone()),
                resource: existing.map(|e| e.resource),
            },
            (Classification::Delete { target }, Some(id)) => {
                let mut tombstone = target.resource;
                tombstone.deleted_at = mutation.resource.deleted_at;
                let entity = store.write_version(id, operation, &tombstone)?;
                EntryOutcome {
                    operation,
                    resource_id: Some(entity.resource_id),
                    resource: Some(entity.resource),
                }
            }
            (_, Some(id)) => {
                let entity = store.write_version(id, operation, &mutation.resource)?;
                EntryOutcome {
                    operation,
                    resource_id: Some(entity.resource_id),
                    resource: Some(entity.resource),
                }
            }
            (_, None) => return Err(missing_identity(position).into()),
        };
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

fn missing_identity(position: usize) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op("commit")
        .with_message(format!("no identity flushed for entry {}", position))
}
