//! Engine-level write commands

#![allow(clippy::result_large_err)]

use crate::commands::transaction::transaction;
use resx_core::{DeletePolicy, ResourceMutation, SchemaRegistry, TransactionOutcome};
use resx_core_types::RequestContext;
use resx_store::errors::Result;
use rusqlite::Connection;

/// Engine commands that write to the store
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Process a batch of mutations as one transaction
    Transaction {
        batch: Vec<ResourceMutation>,
        delete_policy: DeletePolicy,
        context: RequestContext,
    },
}

impl EngineCommand {
    /// Transaction command with a fresh request context
    pub fn transaction(batch: Vec<ResourceMutation>, delete_policy: DeletePolicy) -> Self {
        EngineCommand::Transaction {
            batch,
            delete_policy,
            context: RequestContext::new(),
        }
    }
}

/// Result of applying an engine command
#[derive(Debug, Clone)]
pub enum EngineCommandResult {
    Transaction(TransactionOutcome),
}

/// Apply an engine command
///
/// # Errors
///
/// Whatever the command itself fails with; nothing is committed then.
pub fn apply_engine_command(
    cmd: EngineCommand,
    conn: &mut Connection,
    registry: &SchemaRegistry,
) -> Result<EngineCommandResult> {
    match cmd {
        EngineCommand::Transaction {
            batch,
            delete_policy,
            context,
        } => transaction(batch, registry, delete_policy, &context, conn)
            .map(EngineCommandResult::Transaction),
    }
}
