//! resx engine - orchestration layer
//!
//! Coordinates the core transaction processor with the SQLite store and
//! owns operation lifecycle logging and runtime configuration.

pub mod commands;
pub mod config;

pub use commands::engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
pub use commands::engine_query::{apply_engine_query, EngineQuery, EngineQueryResult};
pub use config::ResxConfig;
