//! History Paging Tests
//!
//! Lazy page iteration over the in-memory history window.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use resx_core::ops::{HistoryPages, HistoryProvider};
use resx_core::{MemoryStore, Resource, ResourceMutation, SchemaRegistry, SystemStore, TransactionProcessor};

fn seeded(count: usize) -> MemoryStore {
    let registry = SchemaRegistry::builtin();
    let mut store = MemoryStore::new();
    let batch = (0..count)
        .map(|_| ResourceMutation::create(Resource::new("Patient")))
        .collect();
    TransactionProcessor::new(&registry)
        .process(store.begin(&registry), batch)
        .unwrap();
    store
}

#[test]
fn test_pages_cover_window_newest_first() {
    // GIVEN five stored versions
    let store = seeded(5);
    let history = store.history(None).unwrap();

    // WHEN paged two at a time
    let pages: Vec<_> = HistoryPages::new(&history, 2)
        .collect::<Result<_, _>>()
        .unwrap();

    // THEN pages are 2, 2, 1 and newest first
    assert_eq!(pages.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 2, 1]);
    assert_eq!(pages[0][0].resource_id.qualified(), "Patient/5");
    assert_eq!(pages[2][0].resource_id.qualified(), "Patient/1");
}

#[test]
fn test_since_in_the_future_is_empty() {
    let store = seeded(2);
    let since = chrono::Utc::now() + chrono::Duration::hours(1);
    let history = store.history(Some(since)).unwrap();

    assert_eq!(history.size().unwrap(), 0);
    assert_eq!(HistoryPages::new(&history, 10).count(), 0);
}

#[test]
fn test_zero_page_size_still_progresses() {
    let store = seeded(3);
    let history = store.history(None).unwrap();
    assert_eq!(history.pages(0).count(), 3);
}
