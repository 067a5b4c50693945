//! Conditional match resolution
//!
//! Turns a match URL into a candidate set through the search engine. Has no
//! side effects and runs at most once per entry.

#![allow(clippy::result_large_err)]

use crate::errors::Result;
use crate::model::ResourceId;
use crate::ops::SearchEngine;
use crate::registry::SchemaRegistry;
use crate::search::SearchParameterMap;
use std::collections::BTreeSet;

/// Canonical ids produced by one match URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateMatchSet {
    ids: BTreeSet<ResourceId>,
}

impl CandidateMatchSet {
    pub fn new(ids: BTreeSet<ResourceId>) -> Self {
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The only candidate, when there is exactly one
    pub fn single(&self) -> Option<&ResourceId> {
        match self.ids.len() {
            1 => self.ids.iter().next(),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceId> {
        self.ids.iter()
    }
}

/// Parse `match_url` against the schema of `resource_type` and run it
///
/// # Errors
///
/// `MalformedCriteria`, `UnknownParameter`, or a store failure from the
/// search engine.
pub fn resolve<E>(
    match_url: &str,
    resource_type: &str,
    registry: &SchemaRegistry,
    engine: &E,
) -> Result<CandidateMatchSet>
where
    E: SearchEngine + ?Sized,
{
    let params = SearchParameterMap::parse(match_url, resource_type, registry)?;
    let ids = engine.search(resource_type, &params)?;

    tracing::debug!(
        resource_type,
        match_url,
        candidates = ids.len(),
        "resolved conditional match"
    );

    Ok(CandidateMatchSet::new(ids))
}
