//! History, tag and count queries over a SQLite store

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Utc;
use resx_core::ops::{HistoryProvider, SystemStore};
use resx_core::{Resource, ResourceMutation, SchemaRegistry, Tag, TransactionProcessor};
use resx_store::db::open_store_in_memory;
use resx_store::{SqliteSystemStore, SqliteUnitOfWork};
use rusqlite::Connection;

fn seed(conn: &mut Connection, batch: Vec<ResourceMutation>) {
    let registry = SchemaRegistry::builtin();
    let uow = SqliteUnitOfWork::begin(conn, &registry).unwrap();
    TransactionProcessor::new(&registry)
        .process(uow, batch)
        .unwrap();
}

#[test]
fn test_history_pages_newest_first() {
    // Given: three creates and one update
    let mut conn = open_store_in_memory().unwrap();
    seed(
        &mut conn,
        (0..3)
            .map(|_| ResourceMutation::create(Resource::new("Patient")))
            .collect(),
    );
    seed(
        &mut conn,
        vec![ResourceMutation::update(
            Resource::new("Patient").with_id("Patient/1"),
        )],
    );

    // When: paging two at a time
    let system = SqliteSystemStore::new(&conn);
    let history = system.history(None).unwrap();
    let pages: Vec<_> = history.pages(2).collect::<Result<_, _>>().unwrap();

    // Then: four versions, the update first
    assert_eq!(history.size().unwrap(), 4);
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0][0].resource_id.to_string(), "Patient/1/_history/2");
}

#[test]
fn test_since_filter_bounds_history() {
    let mut conn = open_store_in_memory().unwrap();
    let before = Utc::now() - chrono::Duration::seconds(5);
    seed(&mut conn, vec![ResourceMutation::create(Resource::new("Patient"))]);

    let system = SqliteSystemStore::new(&conn);
    assert_eq!(system.history(Some(before)).unwrap().size().unwrap(), 1);

    let later = Utc::now() + chrono::Duration::hours(1);
    assert_eq!(system.history(Some(later)).unwrap().size().unwrap(), 0);
}

#[test]
fn test_tags_are_distinct_sorted_and_additive() {
    let mut conn = open_store_in_memory().unwrap();
    seed(
        &mut conn,
        vec![
            ResourceMutation::create(
                Resource::new("Patient").with_tag(Tag::new(Some("urn:b"), "two")),
            ),
            ResourceMutation::create(
                Resource::new("Organization").with_tag(Tag::new(Some("urn:b"), "two")),
            ),
        ],
    );
    seed(
        &mut conn,
        vec![ResourceMutation::update(
            Resource::new("Patient")
                .with_id("Patient/1")
                .with_tag(Tag::new(None, "one")),
        )],
    );

    let system = SqliteSystemStore::new(&conn);
    assert_eq!(
        system.all_tags().unwrap(),
        vec![Tag::new(None, "one"), Tag::new(Some("urn:b"), "two")]
    );

    // the update kept the earlier tag
    let latest = system.history(None).unwrap().page(0, 1).unwrap().remove(0);
    assert_eq!(latest.resource.tags.len(), 2);
}

#[test]
fn test_counts_exclude_tombstones() {
    let mut conn = open_store_in_memory().unwrap();
    seed(
        &mut conn,
        vec![
            ResourceMutation::create(Resource::new("Patient")),
            ResourceMutation::create(Resource::new("Patient")),
            ResourceMutation::create(Resource::new("Encounter")),
        ],
    );
    seed(
        &mut conn,
        vec![ResourceMutation::delete(
            Resource::new("Patient").with_id("Patient/2"),
        )],
    );

    let counts = SqliteSystemStore::new(&conn).resource_counts().unwrap();
    assert_eq!(counts.get("Patient"), Some(&1));
    assert_eq!(counts.get("Encounter"), Some(&1));
    assert_eq!(counts.values().sum::<u64>(), 2);
}
