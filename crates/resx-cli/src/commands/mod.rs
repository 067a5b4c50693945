pub mod history;
pub mod system;
pub mod transaction;

use clap::Args;
use resx_core::logging_facility;
use resx_core::SchemaRegistry;
use resx_engine::ResxConfig;
use rusqlite::Connection;
use std::path::PathBuf;

/// Store selection shared by every subcommand
///
/// Flags override `resx.toml` and `RESX_*` settings.
#[derive(Debug, Args)]
pub struct StoreArgs {
    /// SQLite store file
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Schema file extending the built-in resource types
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Configuration file
    #[arg(long, default_value = resx_engine::config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

/// Everything a subcommand needs to talk to the store
pub struct Session {
    pub config: ResxConfig,
    pub registry: SchemaRegistry,
    pub conn: Connection,
}

impl StoreArgs {
    /// Load configuration, apply flag overrides, start logging and open the store
    pub fn open(&self) -> Result<Session, Box<dyn std::error::Error>> {
        let mut config = ResxConfig::load(&self.config)?;
        if let Some(db) = &self.db {
            config.store.path = db.clone();
        }
        if let Some(schema) = &self.schema {
            config.schema.path = Some(schema.clone());
        }

        logging_facility::init(config.logging.profile);

        let registry = config.registry()?;
        let conn = config.open_store()?;
        Ok(Session {
            config,
            registry,
            conn,
        })
    }
}
