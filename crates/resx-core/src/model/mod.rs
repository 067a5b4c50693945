//! Domain models for transaction processing

pub mod entity;
pub mod mutation;
pub mod outcome;
pub mod resource;
pub mod resource_id;

pub use entity::PersistedEntity;
pub use mutation::{Operation, ResourceMutation};
pub use outcome::{EntryOperation, EntryOutcome, OutcomeRecord, TransactionOutcome, TransactionReport};
pub use resource::{Resource, Tag};
pub use resource_id::ResourceId;
