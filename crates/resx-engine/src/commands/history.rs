//! History reads
//!
//! The window is pinned when the provider is opened, so a page walk sees a
//! stable set of versions even while other connections write.

#![allow(clippy::result_large_err)]

use chrono::{DateTime, Utc};
use resx_core::ops::{HistoryProvider, SystemStore};
use resx_core::{log_op_end, log_op_error, log_op_start, PersistedEntity};
use resx_store::errors::Result;
use resx_store::SqliteSystemStore;
use rusqlite::Connection;
use serde::Serialize;

/// One page of the global history, newest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPage {
    /// Versions in the whole window, not just this page
    pub total: usize,
    pub offset: usize,
    pub entries: Vec<PersistedEntity>,
}

impl HistoryPage {
    /// Whether versions remain past this page
    pub fn has_more(&self) -> bool {
        self.offset + self.entries.len() < self.total
    }
}

/// Fetch versions `offset..offset + count` written at or after `since`
///
/// # Errors
///
/// Store failures.
pub fn history_page(
    since: Option<DateTime<Utc>>,
    offset: usize,
    count: usize,
    conn: &Connection,
) -> Result<HistoryPage> {
    let store = SqliteSystemStore::new(conn);
    let history = store.history(since)?;
    Ok(HistoryPage {
        total: history.size()?,
        offset,
        entries: history.page(offset, count)?,
    })
}

/// Walk the whole window `page_size` versions at a time
///
/// Only one page is held in memory. Returns the number of versions visited.
///
/// # Errors
///
/// The first store failure or the first error returned by `visit`.
pub fn history_walk<F>(
    since: Option<DateTime<Utc>>,
    page_size: usize,
    conn: &Connection,
    mut visit: F,
) -> Result<usize>
where
    F: FnMut(&[PersistedEntity]) -> Result<()>,
{
    log_op_start!("history_walk", page_size = page_size);
    let start = std::time::Instant::now();

    let result = (|| -> Result<usize> {
        let store = SqliteSystemStore::new(conn);
        let history = store.history(since)?;
        let mut visited = 0;
        for page in history.pages(page_size) {
            let page = page?;
            visit(&page)?;
            visited += page.len();
        }
        Ok(visited)
    })();

    let elapsed = start.elapsed().as_millis() as u64;
    match &result {
        Ok(visited) => {
            log_op_end!("history_walk", duration_ms = elapsed, visited = *visited);
        }
        Err(e) => {
            log_op_error!("history_walk", e.clone(), duration_ms = elapsed);
        }
    }
    result
}
