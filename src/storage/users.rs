use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::domain::User;

use super::Repository;

impl Repository {
    /// Save a new user. Returns `false` if the user id is already taken, in
    /// which case the stored record is left untouched.
    pub async fn create_user(&self, user: &User) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (user_id, name, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO NOTHING
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.created_at.to_rfc3339())
        .execute(self.pool())
        .await
        .context("Failed to save user")?;

        Ok(result.rows_affected() == 1)
    }

    /// Get a user together with the numbers of the accounts they own.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, name, password_hash, created_at
            FROM users
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .context("Failed to fetch user")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let account_numbers: Vec<String> =
            sqlx::query_scalar("SELECT account_number FROM accounts WHERE owner_id = ?")
                .bind(user_id)
                .fetch_all(self.pool())
                .await
                .context("Failed to fetch account numbers for user")?;

        let created_at_str: String = row.get("created_at");

        Ok(Some(User {
            user_id: row.get("user_id"),
            name: row.get("name"),
            password_hash: row.get("password_hash"),
            account_numbers: account_numbers.into_iter().collect(),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        }))
    }

    /// Stored credential hash for a user, if the user exists.
    pub async fn get_password_hash(&self, user_id: &str) -> Result<Option<String>> {
        sqlx::query_scalar("SELECT password_hash FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(self.pool())
            .await
            .context("Failed to fetch credential")
    }

    pub(super) async fn user_exists(&self, user_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.pool())
            .await
            .context("Failed to check user")?;
        Ok(count > 0)
    }
}
