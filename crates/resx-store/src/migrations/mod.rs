//! Schema migrations
//!
//! Migrations are compiled in and identified by name. Each applied migration
//! is recorded in `resx_migrations` with the SHA-256 of its SQL, so a store
//! migrated by a build whose SQL was later edited is refused rather than
//! silently diverging.

mod runner;

pub use runner::{migrate, MigrationReport};

use sha2::{Digest, Sha256};

/// One compiled-in migration
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub sql: &'static str,
}

impl Migration {
    /// Lowercase hex SHA-256 of the SQL text
    pub fn checksum(&self) -> String {
        hex::encode(Sha256::digest(self.sql.as_bytes()))
    }
}

/// Every migration, in application order
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "001_initial_schema",
        sql: include_str!("../../migrations/001_initial_schema.sql"),
    },
    Migration {
        name: "002_tags_and_search_index",
        sql: include_str!("../../migrations/002_tags_and_search_index.sql"),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_ordered_and_unique() {
        let names: Vec<&str> = MIGRATIONS.iter().map(|m| m.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_checksum_is_hex_sha256() {
        let checksum = MIGRATIONS[0].checksum();
        assert_eq!(checksum.len(), 64);
        assert!(checksum.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(checksum, MIGRATIONS[1].checksum());
    }
}
