//! OAuth client storage.
//!
//! Persists OAuth 2.0 client registrations in a single table. The full
//! client record is kept as JSONB next to the columns used for lookup.
//!
//! This module provides two layers:
//! - [`PgClientStore`] - table bootstrap and row-level operations
//! - the `ClientStore` trait implementation from `oauth2-store`

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_core::query_scalar::query_scalar;
use time::OffsetDateTime;

use oauth2_store::storage::ClientStore;
use oauth2_store::types::{Client, ClientInfo};
use oauth2_store::{LogLevel, SharedLogger};

use crate::options::StoreOptions;
use crate::table::index_prefix;
use crate::{ConfigError, PgPool, StoreError, StoreResult};

/// Default table for client registrations.
pub const DEFAULT_CLIENT_STORE_TABLE: &str = "oauth2_clients";

fn domain_index(table: &str) -> String {
    format!("{}_domain_idx", index_prefix(table))
}

fn index_names(table: &str) -> Vec<String> {
    vec![domain_index(table)]
}

// =============================================================================
// Types
// =============================================================================

/// Client record from database.
#[derive(Debug, Clone)]
pub struct ClientRow {
    /// Client identifier (primary key)
    pub id: String,
    /// Client secret
    pub secret: String,
    /// Registered domain
    pub domain: String,
    /// Full client record as JSONB
    pub data: serde_json::Value,
    /// Insert timestamp
    pub created_at: OffsetDateTime,
}

impl ClientRow {
    /// Create from database tuple.
    fn from_tuple(row: (String, String, String, serde_json::Value, OffsetDateTime)) -> Self {
        Self {
            id: row.0,
            secret: row.1,
            domain: row.2,
            data: row.3,
            created_at: row.4,
        }
    }

    /// Deserialize the stored client record.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored data is not a valid client record.
    pub fn into_client(self) -> StoreResult<Client> {
        Ok(serde_json::from_value(self.data)?)
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Validated builder for [`PgClientStore`].
pub struct ClientStoreBuilder {
    options: StoreOptions,
}

impl ClientStoreBuilder {
    /// Set the table name (default [`DEFAULT_CLIENT_STORE_TABLE`]).
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.options.set_table(table.into());
        self
    }

    /// Set the connection pool. Required.
    #[must_use]
    pub fn pool(mut self, pool: impl Into<Option<PgPool>>) -> Self {
        self.options.set_pool(pool.into());
        self
    }

    /// Set the logger (default `NoopLogger`).
    #[must_use]
    pub fn logger(mut self, logger: impl Into<Option<SharedLogger>>) -> Self {
        self.options.set_logger(logger.into());
        self
    }

    /// Build the store.
    ///
    /// # Errors
    ///
    /// Returns the first option that failed validation, or
    /// [`ConfigError::NoConnPool`] if no pool was set.
    pub fn build(self) -> Result<PgClientStore, ConfigError> {
        let (pool, table, logger) = self.options.finish()?;
        Ok(PgClientStore {
            pool,
            table,
            logger,
        })
    }
}

// =============================================================================
// Client Store
// =============================================================================

/// PostgreSQL client registration store.
#[derive(Clone)]
pub struct PgClientStore {
    pool: PgPool,
    table: String,
    logger: SharedLogger,
}

impl PgClientStore {
    /// Start building a client store.
    #[must_use]
    pub fn builder() -> ClientStoreBuilder {
        ClientStoreBuilder {
            options: StoreOptions::new(DEFAULT_CLIENT_STORE_TABLE, index_names),
        }
    }

    /// Name of the backing table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the client table and its domain index if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns the database error if any statement fails.
    pub async fn init_table(&self) -> StoreResult<()> {
        self.logger.log(
            LogLevel::Debug,
            "initializing client store table",
            &[("table", &self.table)],
        );

        let statements = [
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id         VARCHAR(255) PRIMARY KEY,
                    secret     VARCHAR(255) NOT NULL,
                    domain     VARCHAR(255) NOT NULL,
                    data       JSONB        NOT NULL,
                    created_at TIMESTAMPTZ  NOT NULL
                )
                "#,
                table = self.table
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} (domain)",
                domain_index(&self.table),
                self.table
            ),
        ];

        for sql in &statements {
            if let Err(e) = query(sql).execute(&self.pool).await {
                self.logger.log(
                    LogLevel::Error,
                    "initializing client store table failed",
                    &[("table", &self.table), ("error", &e)],
                );
                return Err(e.into());
            }
        }

        Ok(())
    }

    /// Insert a new client registration.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `Conflict` if a client with the same id already exists
    /// - `Serialization` if the record cannot be encoded
    /// - `Database` for any other failure
    pub async fn create(&self, info: &(impl ClientInfo + ?Sized)) -> StoreResult<()> {
        let client = Client::from_info(info);
        self.logger
            .log(LogLevel::Debug, "creating client", &[("id", &client.id)]);

        let data = serde_json::to_value(&client).map_err(|e| {
            self.logger.log(
                LogLevel::Error,
                "encoding client failed",
                &[("id", &client.id), ("error", &e)],
            );
            StoreError::from(e)
        })?;

        let sql = format!(
            r#"
            INSERT INTO {} (id, secret, domain, data, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
            self.table
        );

        query(&sql)
            .bind(&client.id)
            .bind(&client.secret)
            .bind(&client.domain)
            .bind(&data)
            .bind(OffsetDateTime::now_utc())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                self.logger.log(
                    LogLevel::Error,
                    "creating client failed",
                    &[("id", &client.id), ("error", &e)],
                );
                StoreError::from_insert(e, || {
                    format!("Client with id '{}' already exists", client.id)
                })
            })?;

        self.logger
            .log(LogLevel::Debug, "client created", &[("id", &client.id)]);

        Ok(())
    }

    /// Fetch the raw row for a client.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no client has this id, or the database error.
    pub async fn get_row_by_id(&self, id: &str) -> StoreResult<ClientRow> {
        let sql = format!(
            "SELECT id, secret, domain, data, created_at FROM {} WHERE id = $1",
            self.table
        );

        let row: Option<(String, String, String, serde_json::Value, OffsetDateTime)> =
            query_as(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(ClientRow::from_tuple)
            .ok_or_else(|| StoreError::not_found(format!("Client {id}")))
    }

    /// Find a client by its identifier.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no client has this id, `Serialization` if the
    /// stored record cannot be decoded, or the database error.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Client> {
        self.logger
            .log(LogLevel::Debug, "client get by id", &[("id", &id)]);

        match self.get_row_by_id(id).await.and_then(ClientRow::into_client) {
            Ok(client) => {
                self.logger
                    .log(LogLevel::Debug, "client found", &[("id", &id)]);
                Ok(client)
            }
            Err(e) => {
                self.logger.log(
                    LogLevel::Error,
                    "client get by id failed",
                    &[("id", &id), ("error", &e)],
                );
                Err(e)
            }
        }
    }

    /// Delete a client registration.
    ///
    /// An empty id is ignored with a warning. Deleting a missing client
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns the database error if the delete fails.
    pub async fn remove_by_id(&self, id: &str) -> StoreResult<()> {
        self.logger
            .log(LogLevel::Debug, "removing client", &[("id", &id)]);

        if id.is_empty() {
            self.logger
                .log(LogLevel::Warn, "no client id was provided", &[]);
            return Ok(());
        }

        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);
        let result = query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                self.logger.log(
                    LogLevel::Error,
                    "removing client failed",
                    &[("id", &id), ("error", &e)],
                );
                StoreError::from(e)
            })?;

        self.logger.log(
            LogLevel::Info,
            "client removed",
            &[("id", &id), ("rows", &result.rows_affected())],
        );

        Ok(())
    }

    /// Count stored clients.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> StoreResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: i64 = query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

// =============================================================================
// ClientStore Trait Implementation
// =============================================================================

#[async_trait]
impl ClientStore for PgClientStore {
    type Error = StoreError;

    async fn get_by_id(&self, id: &str) -> StoreResult<Client> {
        PgClientStore::get_by_id(self, id).await
    }
}

// =============================================================================
// Tests
// =============================================================================
