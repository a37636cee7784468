//! Validated option application shared by the store builders.
//!
//! Setters run in call order. The first one that fails records its error and
//! every later setter is skipped, so `build()` reports the earliest mistake.

use std::sync::Arc;

use oauth2_store::{NoopLogger, SharedLogger};

use crate::table::{validate_index_names, validate_table_name};
use crate::{ConfigError, PgPool};

/// Options common to both stores.
pub(crate) struct StoreOptions {
    pub(crate) pool: Option<PgPool>,
    pub(crate) table: String,
    pub(crate) logger: SharedLogger,
    index_names: fn(&str) -> Vec<String>,
    error: Option<ConfigError>,
}

impl StoreOptions {
    /// `index_names` lists the indexes the store derives from its table name.
    pub(crate) fn new(default_table: &str, index_names: fn(&str) -> Vec<String>) -> Self {
        Self {
            pool: None,
            table: default_table.to_string(),
            logger: Arc::new(NoopLogger),
            index_names,
            error: None,
        }
    }

    /// Run `f` unless an earlier option already failed.
    pub(crate) fn apply(&mut self, f: impl FnOnce(&mut Self) -> Result<(), ConfigError>) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = f(self) {
            self.error = Some(err);
        }
    }

    pub(crate) fn set_table(&mut self, table: String) {
        self.apply(|opts| {
            validate_table_name(&table)?;
            validate_index_names(&table, &(opts.index_names)(&table))?;
            opts.table = table;
            Ok(())
        });
    }

    pub(crate) fn set_pool(&mut self, pool: Option<PgPool>) {
        self.apply(|opts| {
            opts.pool = Some(pool.ok_or(ConfigError::NoConnPool)?);
            Ok(())
        });
    }

    pub(crate) fn set_logger(&mut self, logger: Option<SharedLogger>) {
        self.apply(|opts| {
            opts.logger = logger.ok_or(ConfigError::NoLogger)?;
            Ok(())
        });
    }

    /// Return the first recorded failure, or the validated pieces.
    pub(crate) fn finish(self) -> Result<(PgPool, String, SharedLogger), ConfigError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let pool = self.pool.ok_or(ConfigError::NoConnPool)?;
        Ok((pool, self.table, self.logger))
    }
}
