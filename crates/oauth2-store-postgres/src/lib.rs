//! PostgreSQL storage backend for OAuth 2.0 authorization servers
//!
//! Provides persistent storage for:
//!
//! - OAuth clients ([`PgClientStore`])
//! - Issued authorization codes, access and refresh tokens ([`PgTokenStore`])
//!
//! Each store owns one table, created on demand with [`PgClientStore::init_table`]
//! and [`PgTokenStore::init_table`]. The token store can sweep expired rows
//! in the background.
//!
//! # Example
//!
//! ```ignore
//! use oauth2_store_postgres::{PostgresOAuth2Storage, StoreConfig};
//!
//! let config = StoreConfig::from_toml_str(r#"
//!     database_url = "postgres://localhost/oauth2"
//!     cleanup_interval = "5m"
//! "#)?;
//! let storage = PostgresOAuth2Storage::connect(&config, None).await?;
//!
//! let client = storage.clients().get_by_id("my-app").await?;
//! let token = storage.tokens().get_by_access("at-123").await?;
//! ```

pub mod cleanup;
pub mod client;
pub mod config;
mod options;
pub mod table;
pub mod token;

use std::sync::Arc;

use sqlx_core::pool::Pool;
use sqlx_postgres::Postgres;

use oauth2_store::{NoopLogger, SharedLogger};

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

pub use cleanup::ExpirySweeper;
pub use client::{ClientRow, ClientStoreBuilder, DEFAULT_CLIENT_STORE_TABLE, PgClientStore};
pub use config::{ConfigLoadError, StoreConfig};
pub use token::{DEFAULT_TOKEN_STORE_TABLE, PgTokenStore, TokenKey, TokenRow, TokenStoreBuilder};

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while assembling a store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An empty table name was supplied.
    #[error("no table provided")]
    NoTable,

    /// The table name is not a plain SQL identifier.
    #[error("invalid table name: {0}")]
    InvalidTable(String),

    /// No connection pool was supplied.
    #[error("no connection pool provided")]
    NoConnPool,

    /// An absent logger was supplied.
    #[error("no logger provided")]
    NoLogger,

    /// A cleanup interval was set outside a Tokio runtime.
    #[error("no Tokio runtime to run token cleanup")]
    NoRuntime,
}

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Store construction failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx_core::Error),

    /// Requested record was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Serialization/deserialization of record data failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StoreError {
    // -------------------------------------------------------------------------
    // Constructor Methods
    // -------------------------------------------------------------------------

    /// Create a `NotFound` error.
    #[must_use]
    pub fn not_found(record: impl Into<String>) -> Self {
        Self::NotFound(record.into())
    }

    /// Create a `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create an `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    // -------------------------------------------------------------------------
    // Predicate Methods
    // -------------------------------------------------------------------------

    /// Returns `true` if this is a `NotFound` error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` if this is a `Conflict` error.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns `true` if this is a database error.
    #[must_use]
    pub fn is_database_error(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// Returns `true` if this is a serialization error.
    #[must_use]
    pub fn is_serialization_error(&self) -> bool {
        matches!(self, Self::Serialization(_))
    }

    /// Returns `true` if this is an invalid input error.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Map a failed insert, reporting unique violations as `Conflict`.
    pub(crate) fn from_insert(err: sqlx_core::Error, what: impl FnOnce() -> String) -> Self {
        if let sqlx_core::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::conflict(what());
        }
        Self::from(err)
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// PostgreSQL OAuth2 Storage
// =============================================================================

/// Both stores sharing one connection pool.
pub struct PostgresOAuth2Storage {
    pool: PgPool,
    clients: PgClientStore,
    tokens: PgTokenStore,
}

impl PostgresOAuth2Storage {
    /// Create both stores over an existing pool.
    ///
    /// Tables are created when `config.init_tables` is set. A cleanup interval
    /// in the configuration starts the token sweep, so this must run inside a
    /// Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if a table name is invalid or table creation fails.
    pub async fn new(
        pool: PgPool,
        config: &StoreConfig,
        logger: Option<SharedLogger>,
    ) -> StoreResult<Self> {
        let logger = logger.unwrap_or_else(|| Arc::new(NoopLogger));

        let clients = PgClientStore::builder()
            .pool(pool.clone())
            .table(&config.client_table)
            .logger(logger.clone())
            .build()?;

        let tokens = PgTokenStore::builder()
            .pool(pool.clone())
            .table(&config.token_table)
            .cleanup_interval(config.cleanup_interval)
            .logger(logger)
            .build()?;

        if config.init_tables {
            clients.init_table().await?;
            tokens.init_table().await?;
        }

        Ok(Self {
            pool,
            clients,
            tokens,
        })
    }

    /// Create both stores by connecting to `config.database_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails, or as for [`Self::new`].
    pub async fn connect(config: &StoreConfig, logger: Option<SharedLogger>) -> StoreResult<Self> {
        let pool = config.pool_options().connect(&config.database_url).await?;
        Self::new(pool, config, logger).await
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get the client store.
    #[must_use]
    pub fn clients(&self) -> &PgClientStore {
        &self.clients
    }

    /// Get the token store.
    #[must_use]
    pub fn tokens(&self) -> &PgTokenStore {
        &self.tokens
    }

    /// Stop background work. The pool itself is left open.
    pub fn close(&self) {
        self.tokens.close();
    }
}

// =============================================================================
// Tests
// =============================================================================
