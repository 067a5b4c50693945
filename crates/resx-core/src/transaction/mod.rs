//! Transaction processing
//!
//! A batch moves through intake, match resolution, classification, a single
//! flush, reference rewriting and version writes, then is committed as one
//! unit. Any error before commit drops the unit of work, which discards
//! every staged and written change.

#![allow(clippy::result_large_err)]

pub mod classifier;
pub mod committer;
pub mod composer;
pub mod intake;
pub mod match_resolver;
pub mod rewriter;

pub use classifier::Classification;
pub use match_resolver::CandidateMatchSet;
pub use rewriter::IdentifierMapping;

use crate::errors::Result;
use crate::model::{ResourceMutation, TransactionOutcome};
use crate::ops::{PersistenceStore, SearchEngine};
use crate::policy::DeletePolicy;
use crate::registry::SchemaRegistry;
use std::time::Instant;
use tracing::debug;

/// An entry paired with its classification
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedEntry {
    pub mutation: ResourceMutation,
    pub classification: Classification,
}

impl PlannedEntry {
    pub fn new(mutation: ResourceMutation, classification: Classification) -> Self {
        Self {
            mutation,
            classification,
        }
    }
}

/// Applies transaction batches against a unit of work
#[derive(Debug, Clone, Copy)]
pub struct TransactionProcessor<'r> {
    registry: &'r SchemaRegistry,
    delete_policy: DeletePolicy,
}

impl<'r> TransactionProcessor<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            registry,
            delete_policy: DeletePolicy::default(),
        }
    }

    pub fn with_delete_policy(mut self, delete_policy: DeletePolicy) -> Self {
        self.delete_policy = delete_policy;
        self
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    /// Process one batch all-or-nothing
    ///
    /// Conditional matches see only what was committed before the batch
    /// started, never other entries of the same batch.
    ///
    /// # Errors
    ///
    /// Any intake, resolution or classification error, or a store failure.
    /// The unit of work is dropped uncommitted in every error case.
    pub fn process<S>(&self, mut store: S, mut batch: Vec<ResourceMutation>) -> Result<TransactionOutcome>
    where
        S: PersistenceStore + SearchEngine,
    {
        let started = Instant::now();
        intake::validate_batch(&mut batch, self.registry)?;

        let mut plans = Vec::with_capacity(batch.len());
        for (position, mutation) in batch.into_iter().enumerate() {
            let candidates = match mutation.criteria() {
                Some(match_url) => Some(match_resolver::resolve(
                    match_url,
                    &mutation.resource.resource_type,
                    self.registry,
                    &store,
                )?),
                None => None,
            };
            let classification =
                classifier::classify(&mutation, candidates.as_ref(), &store, self.delete_policy)?;
            debug!(position, operation = %classification.operation(), "classified entry");
            plans.push(PlannedEntry::new(mutation, classification));
        }

        let identities = committer::stage_and_flush(&mut store, &plans)?;

        let mapping = IdentifierMapping::build(&plans, &identities);
        let rewritten = rewriter::rewrite_references(
            plans.iter_mut().map(|p| &mut p.mutation.resource),
            &mapping,
        );
        debug!(mapped = mapping.len(), rewritten, "rewrote references");

        let entries = committer::write_versions(&mut store, plans, &identities)?;
        store.commit()?;

        let outcome = composer::compose(started.elapsed(), entries);
        debug!(summary = %outcome.report.summary, "transaction committed");
        Ok(outcome)
    }
}
