//! Runtime configuration
//!
//! Layered in this order, later layers winning:
//! 1. Built-in defaults
//! 2. An optional `resx.toml` (or any format `config` recognises)
//! 3. `RESX_*` environment variables, `__` separating sections from keys
//!    (`RESX_STORE__PATH`, `RESX_TRANSACTION__DELETE_POLICY`)
//!
//! A `.env` file in the working directory is loaded first by [`ResxConfig::load`].

#![allow(clippy::result_large_err)]

use resx_core::errors::{ExError, ExErrorKind};
use resx_core::logging_facility::Profile;
use resx_core::{DeletePolicy, SchemaRegistry};
use resx_store::errors::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file used when none is named
pub const DEFAULT_CONFIG_FILE: &str = "resx.toml";

const ENV_PREFIX: &str = "RESX";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResxConfig {
    pub store: StoreConfig,
    pub schema: SchemaConfig,
    pub transaction: TransactionConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file, created on first use
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".resx/store.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Schema file extending or replacing the built-in resource types
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionConfig {
    pub delete_policy: DeletePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub page_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { page_size: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub profile: Profile,
}

impl ResxConfig {
    /// Load `.env` into the environment, then layer as [`ResxConfig::load_from`]
    ///
    /// # Errors
    ///
    /// `Config` when a layer cannot be read or a value has the wrong shape.
    pub fn load(path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load_from(path)
    }

    /// Load defaults, then `path` if it exists, then the environment
    ///
    /// # Errors
    ///
    /// `Config` when a layer cannot be read or a value has the wrong shape.
    pub fn load_from(path: &Path) -> Result<Self> {
        let defaults = config::Config::try_from(&ResxConfig::default()).map_err(config_error)?;

        config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .and_then(|c| c.try_deserialize::<ResxConfig>())
            .map_err(config_error)
    }

    /// Schema registry named by `schema.path`, or the built-in one
    ///
    /// # Errors
    ///
    /// When the schema file cannot be read or is invalid.
    pub fn registry(&self) -> Result<SchemaRegistry> {
        match &self.schema.path {
            Some(path) => resx_store::schema_file::load_schema_file(path),
            None => Ok(SchemaRegistry::builtin()),
        }
    }

    /// Open (creating and migrating if needed) the configured store
    ///
    /// # Errors
    ///
    /// When the database cannot be opened or migrated.
    pub fn open_store(&self) -> Result<Connection> {
        resx_store::db::open_store(&self.store.path)
    }
}

fn config_error(e: config::ConfigError) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op("load_config")
        .with_message(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ResxConfig::load_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.store.path, PathBuf::from(".resx/store.db"));
        assert_eq!(config.schema.path, None);
        assert_eq!(config.transaction.delete_policy, DeletePolicy::Strict);
        assert_eq!(config.history.page_size, 50);
        assert_eq!(config.logging.profile, Profile::Development);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resx.toml");
        std::fs::write(
            &path,
            r#"
[store]
path = "/var/lib/resx/data.db"

[transaction]
delete_policy = "idempotent"

[history]
page_size = 10
"#,
        )
        .unwrap();

        let config = ResxConfig::load_from(&path).unwrap();

        assert_eq!(config.store.path, PathBuf::from("/var/lib/resx/data.db"));
        assert_eq!(config.transaction.delete_policy, DeletePolicy::Idempotent);
        assert_eq!(config.history.page_size, 10);
        assert_eq!(config.logging.profile, Profile::Development);
    }

    #[test]
    fn test_bad_value_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resx.toml");
        std::fs::write(&path, "[transaction]\ndelete_policy = \"sometimes\"\n").unwrap();

        let err = ResxConfig::load_from(&path).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
    }

    #[test]
    fn test_registry_defaults_to_builtin() {
        let config = ResxConfig::default();
        let registry = config.registry().unwrap();
        assert!(registry.schema("Patient").is_some());
    }
}
