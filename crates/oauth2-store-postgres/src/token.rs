//! Token storage.
//!
//! Stores issued OAuth 2.0 grants, one row per grant. The authorization code,
//! access token and refresh token each get their own indexed column (empty
//! when unused), the full token is kept as JSONB, and `expires_at` drives
//! the background sweep.
//!
//! # Expiry
//!
//! `expires_at` is computed once, at insert:
//!
//! 1. With a code, from the code issue time and lifetime.
//! 2. Otherwise from the access token, then from the refresh token, the
//!    refresh leg overwriting the access leg when both are present.
//! 3. With neither, it equals the insert time and the row is swept on the
//!    next run.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_core::query_scalar::query_scalar;
use time::OffsetDateTime;
use tokio::runtime::Handle;

use oauth2_store::storage::TokenStore;
use oauth2_store::types::{Token, TokenInfo};
use oauth2_store::{LogLevel, SharedLogger};

use crate::cleanup::{CleanupState, ExpirySweeper};
use crate::options::StoreOptions;
use crate::table::index_prefix;
use crate::{ConfigError, PgPool, StoreError, StoreResult};

/// Default table for issued tokens.
pub const DEFAULT_TOKEN_STORE_TABLE: &str = "oauth2_tokens";

/// Secondary indexes as `(name stem, column)`.
const INDEXES: [(&str, &str); 4] = [
    ("code", "code"),
    ("access", "access_token"),
    ("refresh", "refresh_token"),
    ("expires", "expires_at"),
];

fn index_name(table: &str, stem: &str) -> String {
    format!("idx_{}_{stem}_idx", index_prefix(table))
}

fn index_names(table: &str) -> Vec<String> {
    INDEXES
        .iter()
        .map(|(stem, _)| index_name(table, stem))
        .collect()
}

// =============================================================================
// Types
// =============================================================================

/// Column a token can be looked up or removed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKey {
    /// Authorization code.
    Code,
    /// Access token.
    Access,
    /// Refresh token.
    Refresh,
}

impl TokenKey {
    /// Database column holding this key.
    #[must_use]
    pub fn column(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Access => "access_token",
            Self::Refresh => "refresh_token",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Code => "authorization code",
            Self::Access => "access token",
            Self::Refresh => "refresh token",
        }
    }

    fn attr(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Token record from database.
#[derive(Debug, Clone)]
pub struct TokenRow {
    /// Surrogate key
    pub id: i64,
    /// Authorization code, empty when unused
    pub code: String,
    /// Access token, empty when unused
    pub access_token: String,
    /// Refresh token, empty when unused
    pub refresh_token: String,
    /// Full token as JSONB
    pub data: serde_json::Value,
    /// Insert timestamp
    pub created_at: OffsetDateTime,
    /// Sweep deadline
    pub expires_at: OffsetDateTime,
}

type TokenTuple = (
    i64,
    String,
    String,
    String,
    serde_json::Value,
    OffsetDateTime,
    OffsetDateTime,
);

impl TokenRow {
    /// Create from database tuple.
    fn from_tuple(row: TokenTuple) -> Self {
        Self {
            id: row.0,
            code: row.1,
            access_token: row.2,
            refresh_token: row.3,
            data: row.4,
            created_at: row.5,
            expires_at: row.6,
        }
    }

    /// Deserialize the stored token.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored data is not a valid token.
    pub fn into_token(self) -> StoreResult<Token> {
        Ok(serde_json::from_value(self.data)?)
    }
}

/// Indexed columns derived from a token at insert time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TokenColumns {
    pub(crate) code: String,
    pub(crate) access: String,
    pub(crate) refresh: String,
    pub(crate) expires_at: OffsetDateTime,
}

impl TokenColumns {
    pub(crate) fn from_token(token: &Token, created_at: OffsetDateTime) -> StoreResult<Self> {
        let mut columns = Self {
            code: String::new(),
            access: String::new(),
            refresh: String::new(),
            expires_at: created_at,
        };

        if !token.code.is_empty() {
            columns.code = token.code.clone();
            columns.expires_at = expiry(token.code_create_at, token.code_expires_in, "code")?;
        } else {
            if !token.access.is_empty() {
                columns.access = token.access.clone();
                columns.expires_at =
                    expiry(token.access_create_at, token.access_expires_in, "access")?;
            }

            if !token.refresh.is_empty() {
                columns.refresh = token.refresh.clone();
                columns.expires_at =
                    expiry(token.refresh_create_at, token.refresh_expires_in, "refresh")?;
            }
        }

        Ok(columns)
    }

    /// Grant kind, for logging.
    pub(crate) fn grant(&self) -> &'static str {
        match (
            self.code.is_empty(),
            self.access.is_empty(),
            self.refresh.is_empty(),
        ) {
            (false, _, _) => "authorization_code",
            (true, false, false) => "access_refresh",
            (true, false, true) => "access_token",
            (true, true, false) => "refresh_token",
            (true, true, true) => "none",
        }
    }
}

fn expiry(issued: OffsetDateTime, ttl: Duration, leg: &str) -> StoreResult<OffsetDateTime> {
    time::Duration::try_from(ttl)
        .ok()
        .and_then(|ttl| issued.checked_add(ttl))
        .ok_or_else(|| {
            StoreError::invalid_input(format!("{leg} lifetime {ttl:?} overflows the timestamp range"))
        })
}

// =============================================================================
// Builder
// =============================================================================

/// Validated builder for [`PgTokenStore`].
pub struct TokenStoreBuilder {
    options: StoreOptions,
    cleanup_interval: Duration,
}

impl TokenStoreBuilder {
    /// Set the table name (default [`DEFAULT_TOKEN_STORE_TABLE`]).
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

    /// Set the expiry sweep interval. Zero (the default) disables the sweep.
    #[must_use]
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        let slot = &mut self.cleanup_interval;
        self.options.apply(|_| {
            *slot = interval;
            Ok(())
        });
        self
    }

    /// Build the store and start the expiry sweep if an interval was set.
    ///
    /// # Errors
    ///
    /// Returns the first option that failed validation,
    /// [`ConfigError::NoConnPool`] if no pool was set, or
    /// [`ConfigError::NoRuntime`] if an interval was set outside a Tokio
    /// runtime.
    pub fn build(self) -> Result<PgTokenStore, ConfigError> {
        let (pool, table, logger) = self.options.finish()?;
        if !self.cleanup_interval.is_zero() && Handle::try_current().is_err() {
            return Err(ConfigError::NoRuntime);
        }
        let store = PgTokenStore {
            pool,
            table,
            logger,
            cleanup_interval: self.cleanup_interval,
            cleanup: Mutex::new(CleanupState::Idle),
        };
        store.init_cleanup();
        Ok(store)
    }
}

// =============================================================================
// Token Store
// =============================================================================

/// PostgreSQL token store.
///
/// Dropping the store stops its cleanup task.
pub struct PgTokenStore {
    pool: PgPool,
    table: String,
    logger: SharedLogger,
    cleanup_interval: Duration,
    cleanup: Mutex<CleanupState>,
}

impl PgTokenStore {
    /// Start building a token store.
    #[must_use]
    pub fn builder() -> TokenStoreBuilder {
        TokenStoreBuilder {
            options: StoreOptions::new(DEFAULT_TOKEN_STORE_TABLE, index_names),
            cleanup_interval: Duration::ZERO,
        }
    }

    /// Name of the backing table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Configured sweep interval; zero means no automatic sweep.
    #[must_use]
    pub fn cleanup_interval(&self) -> Duration {
        self.cleanup_interval
    }

    fn cleanup_state(&self) -> MutexGuard<'_, CleanupState> {
        self.cleanup.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sweeper for this store's table, for callers that schedule sweeps
    /// themselves.
    #[must_use]
    pub fn sweeper(&self) -> ExpirySweeper {
        ExpirySweeper::new(self.pool.clone(), self.table.clone(), self.logger.clone())
    }

    /// Create the token table and its indexes if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns the database error if any statement fails.
    pub async fn init_table(&self) -> StoreResult<()> {
        self.logger.log(
            LogLevel::Debug,
            "initializing token store table",
            &[("table", &self.table)],
        );

        let table = &self.table;
        let mut statements = vec![format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id            BIGSERIAL   PRIMARY KEY NOT NULL,
                code          TEXT        NOT NULL,
                access_token  TEXT        NOT NULL,
                refresh_token TEXT        NOT NULL,
                data          JSONB       NOT NULL,
                created_at    TIMESTAMPTZ NOT NULL,
                expires_at    TIMESTAMPTZ NOT NULL
            )
            "#
        )];
        statements.extend(INDEXES.iter().map(|(stem, column)| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {table} ({column})",
                index_name(table, stem)
            )
        }));

        for sql in &statements {
            if let Err(e) = query(sql).execute(&self.pool).await {
                self.logger.log(
                    LogLevel::Error,
                    "initializing token store table failed",
                    &[("table", table), ("error", &e)],
                );
                return Err(e.into());
            }
        }

        Ok(())
    }

    /// Start the expiry sweep on the current Tokio runtime.
    ///
    /// Does nothing when the interval is zero, when the sweep is already
    /// running, or after [`Self::close`]. Outside a runtime it logs a warning
    /// and leaves the sweep stopped, so a later call from inside one can
    /// still start it.
    pub fn init_cleanup(&self) {
        if self.cleanup_interval.is_zero() {
            return;
        }

        let mut state = self.cleanup_state();
        if !matches!(*state, CleanupState::Idle) {
            return;
        }

        let Ok(runtime) = Handle::try_current() else {
            self.logger.log(
                LogLevel::Warn,
                "no Tokio runtime, token cleanup not started",
                &[("table", &self.table)],
            );
            return;
        };

        *state = CleanupState::Running(self.sweeper().spawn(self.cleanup_interval, &runtime));
    }

    /// Returns `true` while the sweep task is alive.
    #[must_use]
    pub fn is_cleanup_running(&self) -> bool {
        matches!(&*self.cleanup_state(), CleanupState::Running(task) if !task.is_finished())
    }

    /// Stop the expiry sweep. Safe to call repeatedly or without a sweep.
    ///
    /// A sweep already executing is allowed to finish.
    pub fn close(&self) {
        self.logger.log(LogLevel::Debug, "closing token store", &[]);

        let previous = std::mem::replace(&mut *self.cleanup_state(), CleanupState::Closed);
        if let CleanupState::Running(task) = previous {
            self.logger
                .log(LogLevel::Debug, "stopping cleanup ticker", &[]);
            drop(task.stop());
        }

        self.logger.log(LogLevel::Debug, "token store closed", &[]);
    }

    /// Delete expired tokens now.
    ///
    /// # Returns
    ///
    /// Returns the number of tokens deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete_expired(&self) -> StoreResult<u64> {
        self.sweeper().sweep().await
    }

    /// Store a newly issued token.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `InvalidInput` if a lifetime overflows the timestamp range
    /// - `Serialization` if the token cannot be encoded
    /// - `Database` if the insert fails
    pub async fn create(&self, info: &(impl TokenInfo + ?Sized)) -> StoreResult<()> {
        let token = Token::from_info(info);
        self.logger.log(
            LogLevel::Debug,
            "creating token",
            &[("client_id", &token.client_id)],
        );

        let created_at = OffsetDateTime::now_utc();
        let prepared = serde_json::to_value(&token)
            .map_err(StoreError::from)
            .and_then(|data| Ok((data, TokenColumns::from_token(&token, created_at)?)));

        let (data, columns) = prepared.map_err(|e| {
            self.logger.log(
                LogLevel::Error,
                "preparing token failed",
                &[("client_id", &token.client_id), ("error", &e)],
            );
            e
        })?;

        let sql = format!(
            r#"
            INSERT INTO {} (code, access_token, refresh_token, data, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
            self.table
        );

        query(&sql)
            .bind(&columns.code)
            .bind(&columns.access)
            .bind(&columns.refresh)
            .bind(&data)
            .bind(created_at)
            .bind(columns.expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                self.logger.log(
                    LogLevel::Error,
                    "creating token failed",
                    &[
                        ("client_id", &token.client_id),
                        ("grant", &columns.grant()),
                        ("error", &e),
                    ],
                );
                StoreError::from(e)
            })?;

        self.logger.log(
            LogLevel::Debug,
            "token created",
            &[("grant", &columns.grant()), ("expires_at", &columns.expires_at)],
        );

        Ok(())
    }

    /// Fetch the raw row matching `value` in the `key` column.
    ///
    /// An empty `value` never matches.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no row matches, or the database error.
    pub async fn get_row(&self, key: TokenKey, value: &str) -> StoreResult<TokenRow> {
        if value.is_empty() {
            return Err(StoreError::not_found(format!("Token with empty {key}")));
        }

        let sql = format!(
            r#"
            SELECT id, code, access_token, refresh_token, data, created_at, expires_at
            FROM {}
            WHERE {} = $1
            "#,
            self.table,
            key.column()
        );

        let row: Option<TokenTuple> = query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TokenRow::from_tuple)
            .ok_or_else(|| StoreError::not_found(format!("Token with {key} {value}")))
    }

    async fn get_by(&self, key: TokenKey, value: &str) -> StoreResult<Token> {
        self.logger.log(
            LogLevel::Debug,
            &format!("getting token by {key}"),
            &[(key.attr(), &value)],
        );

        let row = self.get_row(key, value).await;
        match row.and_then(|row| {
            let id = row.id;
            row.into_token().map(|token| (id, token))
        }) {
            Ok((id, token)) => {
                self.logger
                    .log(LogLevel::Debug, "token found", &[("id", &id)]);
                Ok(token)
            }
            Err(e) => {
                self.logger.log(
                    LogLevel::Error,
                    &format!("getting token by {key} failed"),
                    &[(key.attr(), &value), ("error", &e)],
                );
                Err(e)
            }
        }
    }

    async fn remove_by(&self, key: TokenKey, value: &str) -> StoreResult<()> {
        self.logger.log(
            LogLevel::Debug,
            &format!("removing token by {key}"),
            &[(key.attr(), &value)],
        );

        if value.is_empty() {
            self.logger.log(
                LogLevel::Warn,
                &format!("no {} was provided", key.attr()),
                &[],
            );
            return Ok(());
        }

        let sql = format!("DELETE FROM {} WHERE {} = $1", self.table, key.column());
        let result = query(&sql)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                self.logger.log(
                    LogLevel::Error,
                    &format!("removing token by {key} failed"),
                    &[(key.attr(), &value), ("error", &e)],
                );
                StoreError::from(e)
            })?;

        self.logger.log(
            LogLevel::Info,
            "token removed",
            &[("rows", &result.rows_affected())],
        );

        Ok(())
    }

    /// Find a token by its authorization code.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no token matches, `Serialization` if the stored
    /// token cannot be decoded, or the database error.
    pub async fn get_by_code(&self, code: &str) -> StoreResult<Token> {
        self.get_by(TokenKey::Code, code).await
    }

    /// Find a token by its access token.
    ///
    /// # Errors
    ///
    /// As for [`Self::get_by_code`].
    pub async fn get_by_access(&self, access: &str) -> StoreResult<Token> {
        self.get_by(TokenKey::Access, access).await
    }

    /// Find a token by its refresh token.
    ///
    /// # Errors
    ///
    /// As for [`Self::get_by_code`].
    pub async fn get_by_refresh(&self, refresh: &str) -> StoreResult<Token> {
        self.get_by(TokenKey::Refresh, refresh).await
    }

    /// Delete the token issued with this authorization code.
    ///
    /// An empty code is ignored with a warning. Deleting a missing token
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns the database error if the delete fails.
    pub async fn remove_by_code(&self, code: &str) -> StoreResult<()> {
        self.remove_by(TokenKey::Code, code).await
    }

    /// Delete the token with this access token.
    ///
    /// # Errors
    ///
    /// As for [`Self::remove_by_code`].
    pub async fn remove_by_access(&self, access: &str) -> StoreResult<()> {
        self.remove_by(TokenKey::Access, access).await
    }

    /// Delete the token with this refresh token.
    ///
    /// # Errors
    ///
    /// As for [`Self::remove_by_code`].
    pub async fn remove_by_refresh(&self, refresh: &str) -> StoreResult<()> {
        self.remove_by(TokenKey::Refresh, refresh).await
    }

    /// Count stored tokens, expired ones included.
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
// TokenStore Trait Implementation
// =============================================================================

#[async_trait]
impl TokenStore for PgTokenStore {
    type Error = StoreError;

    async fn create(&self, info: &dyn TokenInfo) -> StoreResult<()> {
        PgTokenStore::create(self, info).await
    }

    async fn remove_by_code(&self, code: &str) -> StoreResult<()> {
        PgTokenStore::remove_by_code(self, code).await
    }

    async fn remove_by_access(&self, access: &str) -> StoreResult<()> {
        PgTokenStore::remove_by_access(self, access).await
    }

    async fn remove_by_refresh(&self, refresh: &str) -> StoreResult<()> {
        PgTokenStore::remove_by_refresh(self, refresh).await
    }

    async fn get_by_code(&self, code: &str) -> StoreResult<Token> {
        PgTokenStore::get_by_code(self, code).await
    }

    async fn get_by_access(&self, access: &str) -> StoreResult<Token> {
        PgTokenStore::get_by_access(self, access).await
    }

    async fn get_by_refresh(&self, refresh: &str) -> StoreResult<Token> {
        PgTokenStore::get_by_refresh(self, refresh).await
    }
}

// =============================================================================
// Tests
// =============================================================================
