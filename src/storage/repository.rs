use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::debug;

use crate::config::LedgerConfig;

use super::{LedgerTx, MIGRATION_001_INITIAL};

/// Handle to the ledger database. Account and user persistence live in
/// `accounts.rs` and `users.rs`; multi-step balance updates go through
/// [`Repository::begin`].
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Wrap an existing pool. Migrations are not run.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database described by `config` and
    /// bring its schema up to date.
    pub async fn open(config: &LedgerConfig) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.busy_timeout)
            .connect_with(options)
            .await
            .with_context(|| {
                format!(
                    "Failed to open database {}",
                    config.database_path.display()
                )
            })?;

        let repo = Self::new(pool);
        repo.migrate().await?;
        debug!(path = %config.database_path.display(), "ledger database opened");
        Ok(repo)
    }

    /// Run database migrations. Safe to run repeatedly.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Start a scoped transaction. Dropping the handle without calling
    /// [`LedgerTx::commit`] rolls everything back.
    pub async fn begin(&self) -> Result<LedgerTx> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        Ok(LedgerTx::new(tx))
    }

    /// Close every pooled connection. Call once at shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("ledger database closed");
    }

    pub(super) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
