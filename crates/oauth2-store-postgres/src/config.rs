//! Store configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! database_url = "postgres://oauth:secret@db/oauth2"
//! max_connections = 20
//! client_table = "oauth2_clients"
//! token_table = "oauth2_tokens"
//! cleanup_interval = "5m"
//! init_tables = true
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx_postgres::PgPoolOptions;

use crate::client::DEFAULT_CLIENT_STORE_TABLE;
use crate::token::DEFAULT_TOKEN_STORE_TABLE;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    /// The TOML document is malformed or has wrongly typed values.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Connection and table settings for both stores.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Upper bound on pooled connections.
    pub max_connections: u32,

    /// Client registration table.
    pub client_table: String,

    /// Token table.
    pub token_table: String,

    /// Interval between expired-token sweeps.
    /// Zero disables the sweep.
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,

    /// Create tables and indexes on startup.
    pub init_tables: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/oauth2".to_string(),
            max_connections: 10,
            client_table: DEFAULT_CLIENT_STORE_TABLE.to_string(),
            token_table: DEFAULT_TOKEN_STORE_TABLE.to_string(),
            cleanup_interval: Duration::ZERO,
            init_tables: true,
        }
    }
}

impl StoreConfig {
    /// Parse configuration from a TOML document. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be parsed.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigLoadError> {
        Ok(toml::from_str(source)?)
    }

    /// Pool options derived from this configuration.
    #[must_use]
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new().max_connections(self.max_connections)
    }
}
