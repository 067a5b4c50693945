//! Store seams and the in-memory store

pub mod history;
pub mod memory_store;
pub mod traits;

pub use history::HistoryPages;
pub use memory_store::{MemoryHistory, MemoryStore, MemoryUnitOfWork};
pub use traits::{HistoryProvider, PersistenceStore, SearchEngine, StagedWrite, SystemStore};
