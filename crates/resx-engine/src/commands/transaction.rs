//! Transaction command

#![allow(clippy::result_large_err)]

use resx_core::errors::ExError;
use resx_core::{
    log_op_end, log_op_error, log_op_start, DeletePolicy, ResourceMutation, SchemaRegistry,
    TransactionOutcome, TransactionProcessor,
};
use resx_core_types::RequestContext;
use resx_store::errors::Result;
use resx_store::SqliteUnitOfWork;
use rusqlite::Connection;

/// Process one batch against the store, all-or-nothing
///
/// Opens a single SQLite transaction, runs the processor inside it and
/// commits only when every entry succeeded. Errors carry the request id
/// (and trace id, when one was supplied).
///
/// # Errors
///
/// Any processing error converted to `ExError`, or a store failure. The
/// store is unchanged in every error case.
pub fn transaction(
    batch: Vec<ResourceMutation>,
    registry: &SchemaRegistry,
    delete_policy: DeletePolicy,
    ctx: &RequestContext,
    conn: &mut Connection,
) -> Result<TransactionOutcome> {
    log_op_start!(
        "transaction",
        request_id = ctx.request_id.as_str(),
        entry_count = batch.len(),
        delete_policy = %delete_policy
    );
    let start = std::time::Instant::now();

    let result = transaction_impl(batch, registry, delete_policy, conn).map_err(|e| {
        let e = match &ctx.trace_id {
            Some(trace_id) => e.with_trace_id(trace_id.clone()),
            None => e,
        };
        e.with_request_id(ctx.request_id.clone())
    });

    match &result {
        Ok(outcome) => {
            log_op_end!(
                "transaction",
                duration_ms = start.elapsed().as_millis() as u64,
                request_id = ctx.request_id.as_str(),
                creations = outcome.report.creations,
                updates = outcome.report.updates,
                noops = outcome.report.noops
            );
        }
        Err(e) => {
            log_op_error!(
                "transaction",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
        }
    }
    result
}

fn transaction_impl(
    batch: Vec<ResourceMutation>,
    registry: &SchemaRegistry,
    delete_policy: DeletePolicy,
    conn: &mut Connection,
) -> Result<TransactionOutcome> {
    let uow = SqliteUnitOfWork::begin(conn, registry)?;
    TransactionProcessor::new(registry)
        .with_delete_policy(delete_policy)
        .process(uow, batch)
        .map_err(ExError::from)
}
