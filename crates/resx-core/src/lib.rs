//! resx core - transactional resource-bundle processing
//!
//! This crate holds the storage-agnostic half of resx:
//! - Resource, identifier and mutation models
//! - The schema registry and match-URL criteria
//! - Store seams (`SearchEngine`, `PersistenceStore`, `SystemStore`) and an
//!   in-memory implementation of them
//! - The transaction processor: intake, conditional match resolution,
//!   operation classification, staged commit, reference rewriting and
//!   outcome composition

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod policy;
pub mod references;
pub mod registry;
pub mod search;
pub mod transaction;

pub use errors::{ExError, ExErrorKind, ResxError, Result};
pub use model::{
    EntryOperation, EntryOutcome, Operation, PersistedEntity, Resource, ResourceId,
    ResourceMutation, Tag, TransactionOutcome, TransactionReport,
};
pub use ops::{MemoryStore, PersistenceStore, SearchEngine, SystemStore};
pub use policy::DeletePolicy;
pub use registry::SchemaRegistry;
pub use transaction::TransactionProcessor;
