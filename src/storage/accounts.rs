use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::{Account, Currency};

use super::Repository;

/// Outcome of inserting a new account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountInsert {
    Created,
    /// The account number is already taken.
    Duplicate,
    /// The owner does not exist, nothing was written.
    OwnerMissing,
}

impl Repository {
    /// Get an account by number.
    pub async fn get_account(&self, account_number: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT account_number, owner_id, currency, balance, created_at
            FROM accounts
            WHERE account_number = ?
            "#,
        )
        .bind(account_number)
        .fetch_optional(self.pool())
        .await
        .context("Failed to fetch account")?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// Insert a new account. The owner check and the insert are a single
    /// statement, so an account can never be attached to a missing user.
    pub async fn create_account(&self, account: &Account) -> Result<AccountInsert> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (account_number, owner_id, currency, balance, created_at)
            SELECT ?, ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM users WHERE user_id = ?)
            ON CONFLICT(account_number) DO NOTHING
            "#,
        )
        .bind(&account.account_number)
        .bind(&account.owner_id)
        .bind(account.currency.as_str())
        .bind(account.balance)
        .bind(account.created_at.to_rfc3339())
        .bind(&account.owner_id)
        .execute(self.pool())
        .await
        .context("Failed to save account")?;

        if result.rows_affected() == 1 {
            return Ok(AccountInsert::Created);
        }

        if self.user_exists(&account.owner_id).await? {
            Ok(AccountInsert::Duplicate)
        } else {
            Ok(AccountInsert::OwnerMissing)
        }
    }

    /// List accounts owned by a user, ordered by account number.
    pub async fn list_accounts_for_user(&self, user_id: &str) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT account_number, owner_id, currency, balance, created_at
            FROM accounts
            WHERE owner_id = ?
            ORDER BY account_number
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .context("Failed to list accounts for user")?;

        rows.iter().map(row_to_account).collect()
    }
}

pub(super) fn row_to_account(row: &SqliteRow) -> Result<Account> {
    let currency_str: String = row.get("currency");
    let created_at_str: String = row.get("created_at");

    Ok(Account {
        account_number: row.get("account_number"),
        owner_id: row.get("owner_id"),
        currency: Currency::from_code(&currency_str)
            .ok_or_else(|| anyhow!("Invalid currency: {}", currency_str))?,
        balance: row.get("balance"),
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .context("Invalid created_at timestamp")?
            .with_timezone(&Utc),
    })
}
