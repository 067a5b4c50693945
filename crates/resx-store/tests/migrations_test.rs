// Integration tests for the migration framework

use resx_store::migrations::{migrate, MIGRATIONS};
use rusqlite::Connection;

fn table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_migrate_empty_db_creates_every_table() {
    // Given: An empty SQLite database
    let mut conn = Connection::open_in_memory().unwrap();

    // When: The schema is migrated
    let report = migrate(&mut conn).unwrap();

    // Then: Every migration ran and every table exists
    assert_eq!(report.applied.len(), MIGRATIONS.len());
    let tables = table_names(&conn);
    for expected in [
        "resx_migrations",
        "resources",
        "resource_versions",
        "tag_definitions",
        "resource_tags",
        "search_index",
    ] {
        assert!(
            tables.contains(&expected.to_string()),
            "Missing table: {}",
            expected
        );
    }
}

#[test]
fn test_every_migration_recorded_with_its_checksum() {
    let mut conn = Connection::open_in_memory().unwrap();
    migrate(&mut conn).unwrap();

    let recorded: Vec<(String, String)> = conn
        .prepare("SELECT name, checksum FROM resx_migrations ORDER BY name")
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    let expected: Vec<(String, String)> = MIGRATIONS
        .iter()
        .map(|m| (m.name.to_string(), m.checksum()))
        .collect();
    assert_eq!(recorded, expected);
}

#[test]
fn test_edited_migration_is_refused() {
    // Given: A migrated database whose recorded checksum no longer matches
    let mut conn = Connection::open_in_memory().unwrap();
    migrate(&mut conn).unwrap();
    conn.execute(
        "UPDATE resx_migrations SET checksum = 'deadbeef' WHERE name = '001_initial_schema'",
        [],
    )
    .unwrap();

    // When: The schema is migrated again
    let err = migrate(&mut conn).unwrap_err();

    // Then: The runner refuses and names the migration
    assert_eq!(err.code(), "ERR_CONSTRAINT_VIOLATION");
    assert!(err.message().contains("001_initial_schema"));
    assert!(err.message().contains("deadbeef"));
}
