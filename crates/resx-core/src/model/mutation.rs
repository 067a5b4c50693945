use crate::model::Resource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation a batch entry explicitly asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        })
    }
}

/// One entry of a transaction batch
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceMutation {
    pub resource: Resource,
    pub operation: Option<Operation>,
    /// Conditional match criteria (`identifier=sys|123&active=true`)
    pub match_url: Option<String>,
    /// Explicit deletion marker; implies `Operation::Delete`
    pub deleted: bool,
}

impl ResourceMutation {
    /// Entry without an explicit operation: created or updated by identity
    pub fn upsert(resource: Resource) -> Self {
        Self {
            resource,
            operation: None,
            match_url: None,
            deleted: false,
        }
    }

    pub fn create(resource: Resource) -> Self {
        Self::upsert(resource).with_operation(Operation::Create)
    }

    pub fn update(resource: Resource) -> Self {
        Self::upsert(resource).with_operation(Operation::Update)
    }

    pub fn delete(resource: Resource) -> Self {
        Self::upsert(resource).with_operation(Operation::Delete)
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn with_match_url(mut self, match_url: impl Into<String>) -> Self {
        self.match_url = Some(match_url.into());
        self
    }

    pub fn marked_deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    /// Operation after applying the deletion marker
    ///
    /// A marker or a tombstone timestamp on the resource wins over any
    /// explicit operation.
    pub fn requested_operation(&self) -> Option<Operation> {
        if self.deleted || self.resource.is_deleted() {
            Some(Operation::Delete)
        } else {
            self.operation
        }
    }

    /// Match URL, ignoring blank strings
    pub fn criteria(&self) -> Option<&str> {
        self.match_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
