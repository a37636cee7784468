//! Background removal of expired tokens.
//!
//! [`ExpirySweeper`] deletes every token row whose `expires_at` has passed.
//! The token store runs it on a fixed interval in a spawned task that stops
//! when the store is closed or dropped.

use std::time::Duration;

use sqlx_core::query::query;
use time::OffsetDateTime;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::Instrument;

use oauth2_store::{LogLevel, SharedLogger};

use crate::{PgPool, StoreResult};

// =============================================================================
// Expiry Sweeper
// =============================================================================

/// Deletes expired rows from a token table.
#[derive(Clone)]
pub struct ExpirySweeper {
    pool: PgPool,
    table: String,
    logger: SharedLogger,
}

impl ExpirySweeper {
    pub(crate) fn new(pool: PgPool, table: String, logger: SharedLogger) -> Self {
        Self {
            pool,
            table,
            logger,
        }
    }

    /// Delete all rows with `expires_at <= now`.
    ///
    /// # Returns
    ///
    /// Returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn sweep(&self) -> StoreResult<u64> {
        let sql = format!("DELETE FROM {} WHERE expires_at <= $1", self.table);
        let result = query(&sql)
            .bind(OffsetDateTime::now_utc())
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected();
        self.logger.log(
            LogLevel::Debug,
            "cleaning expired tokens",
            &[("table", &self.table), ("deleted", &deleted)],
        );

        Ok(deleted)
    }

    /// Run [`Self::sweep`] every `period` until told to stop.
    ///
    /// The first sweep happens one full period after spawning. Shutdown is
    /// only observed between sweeps, so a running delete always completes.
    pub(crate) fn spawn(self, period: Duration, runtime: &Handle) -> CleanupTask {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let span = tracing::info_span!("token_cleanup", table = %self.table);

        let handle = runtime.spawn(
            async move {
                self.logger.log(
                    LogLevel::Debug,
                    "token cleanup started",
                    &[("interval_ms", &period.as_millis())],
                );

                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            if let Err(e) = self.sweep().await {
                                self.logger.log(
                                    LogLevel::Error,
                                    "cleaning expired tokens failed",
                                    &[("table", &self.table), ("error", &e)],
                                );
                            }
                        }
                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                break;
                            }
                        }
                    }
                }

                self.logger
                    .log(LogLevel::Debug, "token cleanup stopped", &[]);
            }
            .instrument(span),
        );

        CleanupTask {
            shutdown: shutdown_tx,
            handle,
        }
    }
}

// =============================================================================
// Cleanup Task
// =============================================================================

/// Handle to a running sweep loop.
///
/// Dropping the handle also ends the loop.
pub(crate) struct CleanupTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl CleanupTask {
    /// Ask the loop to exit after any in-flight sweep.
    pub(crate) fn stop(self) -> JoinHandle<()> {
        // The receiver is gone only if the task already exited.
        let _ = self.shutdown.send(true);
        self.handle
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Lifecycle of a store's cleanup task.
#[derive(Default)]
pub(crate) enum CleanupState {
    #[default]
    Idle,
    Running(CleanupTask),
    Closed,
}
