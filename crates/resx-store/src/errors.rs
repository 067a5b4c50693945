//! Error handling for resx-store
//!
//! Wraps resx-core ExError with store-specific helpers

use resx_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// A migration whose SQL failed to run
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migrate")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// An applied migration whose SQL no longer matches the compiled-in text
pub fn checksum_mismatch(migration: &str, compiled: &str, recorded: &str) -> ExError {
    ExError::new(ExErrorKind::ConstraintViolation)
        .with_op("migrate")
        .with_message(format!(
            "Migration {} changed after it was applied (recorded {}, compiled {})",
            migration, recorded, compiled
        ))
}

/// Create a bundle validation error
pub fn bundle_validation(reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("bundle_parse")
        .with_message(reason.to_string())
}

/// Create a schema file validation error
pub fn schema_validation(reason: &str) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op("schema_parse")
        .with_message(reason.to_string())
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create a serialization error for a stored payload
pub fn payload_error(resource_id: &str, err: impl std::fmt::Display) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("decode_payload")
        .with_resource_id(resource_id.to_string())
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Whether a rusqlite error is a UNIQUE / constraint failure
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_carry_kind_and_op() {
        let err = checksum_mismatch("001_initial_schema", "aa", "bb");
        assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
        assert_eq!(err.op(), Some("migrate"));

        let err = bundle_validation("entries missing");
        assert_eq!(err.code(), "ERR_INVALID_INPUT");
        assert_eq!(err.message(), "entries missing");
    }

    #[test]
    fn test_constraint_violation_detection() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err();
        assert!(is_constraint_violation(&err));
        assert!(!is_constraint_violation(&rusqlite::Error::QueryReturnedNoRows));
    }
}
