//! History queries through the engine
//!
//! ## Scenarios Covered
//!
//! 1. Paged reads report the window size and come back newest first
//! 2. A full walk visits every version exactly once
//! 3. A `since` bound past the last write yields an empty window

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{Duration, Utc};
use resx_core::{DeletePolicy, Resource, ResourceMutation, SchemaRegistry};
use resx_engine::commands::history::history_walk;
use resx_engine::{apply_engine_command, apply_engine_query, EngineCommand, EngineQuery, EngineQueryResult};
use rusqlite::Connection;
use tempfile::TempDir;

fn seeded_store(creates: usize) -> (TempDir, Connection) {
    let temp_dir = TempDir::new().unwrap();
    let mut conn = resx_store::db::open_store(temp_dir.path().join("store.db")).unwrap();
    let registry = SchemaRegistry::builtin();
    let batch = (0..creates)
        .map(|_| ResourceMutation::create(Resource::new("Patient")))
        .collect();
    apply_engine_command(
        EngineCommand::transaction(batch, DeletePolicy::Strict),
        &mut conn,
        &registry,
    )
    .unwrap();
    (temp_dir, conn)
}

#[test]
fn test_history_page_newest_first() {
    // GIVEN five created patients
    let (_tmp, conn) = seeded_store(5);

    // WHEN the second page of two is read
    let result = apply_engine_query(
        EngineQuery::History {
            since: None,
            offset: 2,
            count: 2,
        },
        &conn,
    )
    .unwrap();

    // THEN the window size is five and the page holds the 3rd and 4th newest
    let EngineQueryResult::History(page) = result else {
        panic!("expected a history page");
    };
    assert_eq!(page.total, 5);
    assert_eq!(page.offset, 2);
    let ids: Vec<String> = page
        .entries
        .iter()
        .map(|e| e.resource_id.qualified())
        .collect();
    assert_eq!(ids, vec!["Patient/3", "Patient/2"]);
    assert!(page.has_more());
}

#[test]
fn test_history_walk_visits_every_version() {
    let (_tmp, conn) = seeded_store(7);

    let mut page_sizes = Vec::new();
    let visited = history_walk(None, 3, &conn, |page| {
        page_sizes.push(page.len());
        Ok(())
    })
    .unwrap();

    assert_eq!(visited, 7);
    assert_eq!(page_sizes, vec![3, 3, 1]);
}

#[test]
fn test_since_in_future_is_empty() {
    let (_tmp, conn) = seeded_store(2);

    let result = apply_engine_query(
        EngineQuery::History {
            since: Some(Utc::now() + Duration::hours(1)),
            offset: 0,
            count: 10,
        },
        &conn,
    )
    .unwrap();

    let EngineQueryResult::History(page) = result else {
        panic!("expected a history page");
    };
    assert_eq!(page.total, 0);
    assert!(page.entries.is_empty());
    assert!(!page.has_more());
}
