use anyhow::{Context, Result};
use sqlx::{Sqlite, Transaction};

use crate::domain::{Account, Cents};

use super::accounts::row_to_account;

/// A scoped unit of storage work spanning several account reads and writes.
///
/// Either [`commit`](Self::commit) makes every write durable, or the
/// transaction is rolled back, explicitly or by dropping the handle.
pub struct LedgerTx {
    tx: Transaction<'static, Sqlite>,
}

impl LedgerTx {
    pub(super) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self { tx }
    }

    /// Read an account as seen by this transaction.
    pub async fn get_account(&mut self, account_number: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT account_number, owner_id, currency, balance, created_at
            FROM accounts
            WHERE account_number = ?
            "#,
        )
        .bind(account_number)
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to fetch account in transaction")?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// Overwrite an account balance. Returns `false` if no such account exists.
    pub async fn set_balance(&mut self, account_number: &str, balance: Cents) -> Result<bool> {
        let result = sqlx::query("UPDATE accounts SET balance = ? WHERE account_number = ?")
            .bind(balance)
            .bind(account_number)
            .execute(&mut *self.tx)
            .await
            .context("Failed to update balance")?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await.context("Failed to commit transaction")
    }

    pub async fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .await
            .context("Failed to roll back transaction")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::domain::{Currency, User};
    use crate::storage::Repository;
    use tempfile::TempDir;

    async fn seeded_repo() -> Result<(Repository, TempDir)> {
        let temp = TempDir::new()?;
        let repo = Repository::open(&LedgerConfig::new(temp.path().join("t.db"))).await?;
        repo.create_user(&User::new("alice", "Alice", "hash")).await?;
        repo.create_account(&Account::open("A-1", "alice", Currency::Usd))
            .await?;
        Ok((repo, temp))
    }

    #[tokio::test]
    async fn test_commit_persists_balance() -> Result<()> {
        let (repo, _temp) = seeded_repo().await?;

        let mut tx = repo.begin().await?;
        assert!(tx.set_balance("A-1", 700).await?);
        assert_eq!(tx.get_account("A-1").await?.unwrap().balance, 700);
        tx.commit().await?;

        assert_eq!(repo.get_account("A-1").await?.unwrap().balance, 700);
        Ok(())
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() -> Result<()> {
        let (repo, _temp) = seeded_repo().await?;

        let mut tx = repo.begin().await?;
        tx.set_balance("A-1", 700).await?;
        tx.rollback().await?;

        assert_eq!(repo.get_account("A-1").await?.unwrap().balance, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_drop_without_commit_rolls_back() -> Result<()> {
        let (repo, _temp) = seeded_repo().await?;

        {
            let mut tx = repo.begin().await?;
            tx.set_balance("A-1", 900).await?;
        }

        assert_eq!(repo.get_account("A-1").await?.unwrap().balance, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_balance_on_missing_account() -> Result<()> {
        let (repo, _temp) = seeded_repo().await?;

        let mut tx = repo.begin().await?;
        assert!(!tx.set_balance("nope", 100).await?);
        assert!(tx.get_account("nope").await?.is_none());
        tx.rollback().await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_negative_balance_is_rejected_by_schema() -> Result<()> {
        let (repo, _temp) = seeded_repo().await?;

        let mut tx = repo.begin().await?;
        assert!(tx.set_balance("A-1", -1).await.is_err());
        drop(tx);

        assert_eq!(repo.get_account("A-1").await?.unwrap().balance, 0);
        Ok(())
    }
}
