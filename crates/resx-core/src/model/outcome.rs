use crate::model::{Resource, ResourceId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation a batch entry was finally classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryOperation {
    Create,
    Update,
    Delete,
    Noop,
}

impl EntryOperation {
    /// HTTP-style status line for the entry response
    pub fn status(&self) -> &'static str {
        match self {
            EntryOperation::Create => "201 Created",
            EntryOperation::Update => "200 OK",
            EntryOperation::Delete => "204 No Content",
            EntryOperation::Noop => "200 OK",
        }
    }
}

impl fmt::Display for EntryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryOperation::Create => "CREATE",
            EntryOperation::Update => "UPDATE",
            EntryOperation::Delete => "DELETE",
            EntryOperation::Noop => "NOOP",
        })
    }
}

/// Per-entry result, positioned like the input entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryOutcome {
    pub operation: EntryOperation,
    /// Canonical versioned id; `None` for a no-op that resolved to nothing
    pub resource_id: Option<ResourceId>,
    /// Stored state after the transaction (the untouched entity for a no-op)
    pub resource: Option<Resource>,
}

impl EntryOutcome {
    pub fn status(&self) -> &'static str {
        self.operation.status()
    }
}

/// Aggregate report placed ahead of the entry outcomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReport {
    pub elapsed_ms: u64,
    pub creations: usize,
    /// Updates including deletes
    pub updates: usize,
    pub deletions: usize,
    pub noops: usize,
    pub summary: String,
}

/// One record of a transaction response
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutcomeRecord<'a> {
    Report(&'a TransactionReport),
    Entry(&'a EntryOutcome),
}

/// Result of a committed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionOutcome {
    pub report: TransactionReport,
    /// One outcome per input entry, in input order
    pub entries: Vec<EntryOutcome>,
}

impl TransactionOutcome {
    /// The report followed by every entry outcome
    pub fn records(&self) -> impl Iterator<Item = OutcomeRecord<'_>> {
        std::iter::once(OutcomeRecord::Report(&self.report))
            .chain(self.entries.iter().map(OutcomeRecord::Entry))
    }

    /// Number of records, report included
    pub fn record_count(&self) -> usize {
        self.entries.len() + 1
    }
}
