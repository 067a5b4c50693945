//! SQLite implementation of the core store seams

mod codec;
pub mod system;
pub mod unit_of_work;

pub use system::{SqliteHistory, SqliteSystemStore};
pub use unit_of_work::SqliteUnitOfWork;
