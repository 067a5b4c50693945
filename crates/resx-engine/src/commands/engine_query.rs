//! Engine-level read-only query surface
//!
//! `apply_engine_query` is the single entry point for read-only queries.
//! It takes a shared connection and never writes.

#![allow(clippy::result_large_err)]

use crate::commands::history::{history_page, HistoryPage};
use chrono::{DateTime, Utc};
use resx_core::ops::SystemStore;
use resx_core::{log_op_end, log_op_error, log_op_start, Tag};
use resx_store::errors::Result;
use resx_store::SqliteSystemStore;
use rusqlite::Connection;
use std::collections::BTreeMap;

/// Read-only queries supported by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineQuery {
    /// One page of every version written at or after `since`, newest first
    History {
        since: Option<DateTime<Utc>>,
        offset: usize,
        count: usize,
    },
    /// Every distinct tag ever applied
    AllTags,
    /// Live resources per type
    ResourceCounts,
}

/// Result of a read-only query
#[derive(Debug, Clone, PartialEq)]
pub enum EngineQueryResult {
    History(HistoryPage),
    AllTags(Vec<Tag>),
    ResourceCounts(BTreeMap<String, u64>),
}

/// Apply a read-only query
///
/// # Errors
///
/// Store failures.
pub fn apply_engine_query(query: EngineQuery, conn: &Connection) -> Result<EngineQueryResult> {
    match query {
        EngineQuery::History {
            since,
            offset,
            count,
        } => {
            log_op_start!("history", offset = offset, count = count);
            let start = std::time::Instant::now();

            let result = history_page(since, offset, count, conn);

            let elapsed = start.elapsed().as_millis() as u64;
            match &result {
                Ok(page) => {
                    log_op_end!(
                        "history",
                        duration_ms = elapsed,
                        total = page.total,
                        returned = page.entries.len()
                    );
                }
                Err(e) => {
                    log_op_error!("history", e.clone(), duration_ms = elapsed);
                }
            }
            result.map(EngineQueryResult::History)
        }

        EngineQuery::AllTags => {
            log_op_start!("all_tags");
            let start = std::time::Instant::now();

            let result = SqliteSystemStore::new(conn).all_tags();

            let elapsed = start.elapsed().as_millis() as u64;
            match &result {
                Ok(tags) => {
                    log_op_end!("all_tags", duration_ms = elapsed, tag_count = tags.len());
                }
                Err(e) => {
                    log_op_error!("all_tags", e.clone(), duration_ms = elapsed);
                }
            }
            result.map(EngineQueryResult::AllTags)
        }

        EngineQuery::ResourceCounts => {
            log_op_start!("resource_counts");
            let start = std::time::Instant::now();

            let result = SqliteSystemStore::new(conn).resource_counts();

            let elapsed = start.elapsed().as_millis() as u64;
            match &result {
                Ok(counts) => {
                    log_op_end!(
                        "resource_counts",
                        duration_ms = elapsed,
                        type_count = counts.len()
                    );
                }
                Err(e) => {
                    log_op_error!("resource_counts", e.clone(), duration_ms = elapsed);
                }
            }
            result.map(EngineQueryResult::ResourceCounts)
        }
    }
}
