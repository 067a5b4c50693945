//! Command orchestration layer
//!
//! Couples the core transaction processor and system queries to a SQLite
//! connection. Each operation here owns its lifecycle logging:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Lower layers (store, core) use only `tracing::debug!()` for internal details.

pub mod engine_command;
pub mod engine_query;
pub mod history;
pub mod transaction;
