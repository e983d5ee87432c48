use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::config::LedgerConfig;
use crate::domain::{Account, Cents, Currency, TransferReceipt, User};
use crate::storage::{AccountInsert, LedgerTx, Repository};

use super::{hash_credential_blocking, AccountLocks, AuthGate, LedgerError};

/// Application service providing the ledger operations.
/// This is the primary interface for any client (CLI, menu, API, etc.).
pub struct LedgerService {
    repo: Repository,
    locks: AccountLocks,
}

impl LedgerService {
    /// Create a ledger service over an already opened repository.
    pub fn new(repo: Repository, config: &LedgerConfig) -> Self {
        Self {
            repo,
            locks: AccountLocks::new(config.lock_timeout),
        }
    }

    /// Open the database described by `config`, creating and migrating it
    /// if needed.
    pub async fn open(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let repo = Repository::open(config).await?;
        Ok(Self::new(repo, config))
    }

    /// Release the underlying storage. Call once at shutdown.
    pub async fn close(&self) {
        self.repo.close().await;
    }

    /// Credential check against the stored user record.
    pub fn auth(&self) -> AuthGate<'_> {
        AuthGate::new(&self.repo)
    }

    pub async fn authenticate(&self, user_id: &str, credential: &str) -> Result<bool, LedgerError> {
        let user_id = require_non_empty("user id", user_id)?;
        self.auth().authenticate(user_id, credential).await
    }

    // ========================
    // User and account operations
    // ========================

    /// Register a new user. The password is stored only as a salted hash.
    #[instrument(skip(self, name, password))]
    pub async fn create_user(
        &self,
        user_id: &str,
        name: &str,
        password: &str,
    ) -> Result<User, LedgerError> {
        let user_id = require_non_empty("user id", user_id)?;
        let name = require_non_empty("name", name)?;
        if password.is_empty() {
            return Err(LedgerError::InvalidInput("password must not be empty".into()));
        }

        if self.repo.get_user(user_id).await?.is_some() {
            return Err(LedgerError::DuplicateUser(user_id.to_string()));
        }

        let user = User::new(user_id, name, hash_credential_blocking(password).await?);
        if !self.repo.create_user(&user).await? {
            return Err(LedgerError::DuplicateUser(user_id.to_string()));
        }

        info!("user created");
        Ok(user)
    }

    /// Get a user by id.
    pub async fn get_user(&self, user_id: &str) -> Result<User, LedgerError> {
        let user_id = require_non_empty("user id", user_id)?;
        self.repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))
    }

    /// Open a new zero-balance account for an existing user.
    #[instrument(skip(self))]
    pub async fn create_account(
        &self,
        user_id: &str,
        account_number: &str,
        currency: Currency,
    ) -> Result<Account, LedgerError> {
        let user_id = require_non_empty("user id", user_id)?;
        let account_number = require_non_empty("account number", account_number)?;
        let account = Account::open(account_number, user_id, currency);

        match self.repo.create_account(&account).await? {
            AccountInsert::Created => {
                info!("account opened");
                Ok(account)
            }
            AccountInsert::Duplicate => {
                Err(LedgerError::DuplicateAccount(account_number.to_string()))
            }
            AccountInsert::OwnerMissing => Err(LedgerError::UserNotFound(user_id.to_string())),
        }
    }

    /// Get an account, including its current balance.
    pub async fn get_account(&self, account_number: &str) -> Result<Account, LedgerError> {
        let account_number = require_non_empty("account number", account_number)?;
        self.repo
            .get_account(account_number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))
    }

    /// List the accounts a user owns.
    pub async fn list_accounts(&self, user_id: &str) -> Result<Vec<Account>, LedgerError> {
        let user = self.get_user(user_id).await?;
        Ok(self.repo.list_accounts_for_user(&user.user_id).await?)
    }

    // ========================
    // Balance operations
    // ========================

    /// Add `amount_cents` to an account. Returns the new balance.
    #[instrument(skip(self))]
    pub async fn deposit(
        &self,
        account_number: &str,
        amount_cents: Cents,
    ) -> Result<Cents, LedgerError> {
        let account_number = require_non_empty("account number", account_number)?;
        validate_amount(amount_cents)?;

        let _guard = self.locks.acquire(&[account_number]).await?;
        let mut tx = self.repo.begin().await?;

        let Some(account) = tx.get_account(account_number).await? else {
            return Err(abort(tx, LedgerError::AccountNotFound(account_number.to_string())).await);
        };

        let Some(new_balance) = account.balance.checked_add(amount_cents) else {
            return Err(abort(
                tx,
                LedgerError::InvalidAmount("deposit would overflow the balance".into()),
            )
            .await);
        };

        tx.set_balance(account_number, new_balance).await?;
        tx.commit().await?;

        info!(new_balance, "deposit committed");
        Ok(new_balance)
    }

    /// Take `amount_cents` out of an account. Returns the new balance.
    #[instrument(skip(self))]
    pub async fn withdraw(
        &self,
        account_number: &str,
        amount_cents: Cents,
    ) -> Result<Cents, LedgerError> {
        let account_number = require_non_empty("account number", account_number)?;
        validate_amount(amount_cents)?;

        let _guard = self.locks.acquire(&[account_number]).await?;
        let mut tx = self.repo.begin().await?;

        let Some(account) = tx.get_account(account_number).await? else {
            return Err(abort(tx, LedgerError::AccountNotFound(account_number.to_string())).await);
        };

        if !account.can_cover(amount_cents) {
            warn!(balance = account.balance, "withdrawal rejected");
            return Err(abort(
                tx,
                LedgerError::InsufficientFunds {
                    account: account_number.to_string(),
                    balance: account.balance,
                    required: amount_cents,
                },
            )
            .await);
        }

        let new_balance = account.balance - amount_cents;
        tx.set_balance(account_number, new_balance).await?;
        tx.commit().await?;

        info!(new_balance, "withdrawal committed");
        Ok(new_balance)
    }

    /// Move money between two accounts of the same currency.
    ///
    /// `credential` must verify for the owner of `from_account`. Both legs
    /// run in one transaction while both account locks are held: the debit
    /// is only ever persisted together with the matching credit.
    #[instrument(skip(self, credential))]
    pub async fn transfer(
        &self,
        from_account: &str,
        to_account: &str,
        amount_cents: Cents,
        credential: &str,
    ) -> Result<TransferReceipt, LedgerError> {
        let from_account = require_non_empty("sender account", from_account)?;
        let to_account = require_non_empty("recipient account", to_account)?;
        validate_amount(amount_cents)?;

        if from_account == to_account {
            return Err(LedgerError::SameAccount(from_account.to_string()));
        }

        let sender = self.get_account(from_account).await?;
        if !self.authenticate(&sender.owner_id, credential).await? {
            warn!(owner = %sender.owner_id, "transfer credential rejected");
            return Err(LedgerError::AuthenticationFailed);
        }

        let _guard = self.locks.acquire(&[from_account, to_account]).await?;
        let mut tx = self.repo.begin().await?;

        // Re-read under the lock; the balance seen above may be stale.
        let Some(sender) = tx.get_account(from_account).await? else {
            return Err(abort(tx, LedgerError::AccountNotFound(from_account.to_string())).await);
        };

        if !sender.can_cover(amount_cents) {
            warn!(balance = sender.balance, "transfer rejected");
            return Err(abort(
                tx,
                LedgerError::InsufficientFunds {
                    account: from_account.to_string(),
                    balance: sender.balance,
                    required: amount_cents,
                },
            )
            .await);
        }

        // Debit leg
        let from_balance = sender.balance - amount_cents;
        if let Err(e) = tx.set_balance(from_account, from_balance).await {
            return Err(abort(tx, e.into()).await);
        }

        // Credit leg; any failure from here on must undo the debit.
        let recipient = match tx.get_account(to_account).await {
            Ok(Some(recipient)) => recipient,
            Ok(None) => {
                return Err(abort(tx, LedgerError::AccountNotFound(to_account.to_string())).await);
            }
            Err(e) => return Err(abort(tx, e.into()).await),
        };

        if recipient.currency != sender.currency {
            return Err(abort(
                tx,
                LedgerError::CurrencyMismatch {
                    from_currency: sender.currency,
                    to_currency: recipient.currency,
                },
            )
            .await);
        }

        let Some(to_balance) = recipient.balance.checked_add(amount_cents) else {
            return Err(abort(
                tx,
                LedgerError::InvalidAmount("transfer would overflow the recipient balance".into()),
            )
            .await);
        };

        match tx.set_balance(to_account, to_balance).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(abort(tx, LedgerError::AccountNotFound(to_account.to_string())).await);
            }
            Err(e) => return Err(abort(tx, e.into()).await),
        }

        tx.commit().await?;

        info!(from_balance, to_balance, "transfer committed");
        Ok(TransferReceipt {
            from_account: from_account.to_string(),
            to_account: to_account.to_string(),
            amount_cents,
            currency: sender.currency,
            from_balance,
            to_balance,
            completed_at: Utc::now(),
        })
    }
}

fn validate_amount(amount_cents: Cents) -> Result<(), LedgerError> {
    if amount_cents <= 0 {
        return Err(LedgerError::InvalidAmount(
            "Amount must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Trim an identifier or name; surrounding whitespace is never significant.
fn require_non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, LedgerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}

/// Roll back `tx` and hand back the error that caused it. A failed rollback
/// is logged; the transaction is discarded either way.
async fn abort(tx: LedgerTx, err: LedgerError) -> LedgerError {
    if let Err(rollback_err) = tx.rollback().await {
        warn!(error = %rollback_err, "rollback failed");
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn service_with_timeout(timeout: Duration) -> anyhow::Result<(LedgerService, TempDir)> {
        let temp = TempDir::new()?;
        let config = LedgerConfig::new(temp.path().join("s.db")).with_lock_timeout(timeout);
        let service = LedgerService::open(&config).await?;
        service.create_user("alice", "Alice", "pw").await?;
        service.create_account("alice", "A", Currency::Usd).await?;
        service.create_account("alice", "B", Currency::Usd).await?;
        service.deposit("A", 1000).await?;
        Ok((service, temp))
    }

    #[tokio::test]
    async fn test_locked_account_fails_fast_with_busy() -> anyhow::Result<()> {
        let (service, _temp) = service_with_timeout(Duration::from_millis(20)).await?;

        let held = service.locks.acquire(&["A"]).await?;
        let result = service.withdraw("A", 100).await;
        assert!(matches!(result, Err(LedgerError::Busy(ref a)) if a == "A"));
        assert!(result.unwrap_err().is_retryable());

        // A transfer touching the locked account is refused before any check
        // that needs the lock
        let result = service.transfer("B", "A", 1, "pw").await;
        assert!(matches!(result, Err(LedgerError::Busy(ref a)) if a == "A"));

        drop(held);
        assert_eq!(service.withdraw("A", 100).await?, 900);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_accounts_leave_no_lock_entries() -> anyhow::Result<()> {
        let (service, _temp) = service_with_timeout(Duration::from_secs(1)).await?;

        for i in 0..1000 {
            let account = format!("ghost-{i}");
            let result = service.deposit(&account, 100).await;
            assert!(matches!(result, Err(LedgerError::AccountNotFound(ref a)) if *a == account));
        }
        assert!(service.withdraw("ghost-x", 1).await.is_err());
        assert!(service.transfer("A", "ghost-y", 1, "pw").await.is_err());

        assert_eq!(service.locks.tracked(), 0);
        assert_eq!(service.get_account("A").await?.balance, 1000);
        Ok(())
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(1).is_ok());
        assert!(matches!(validate_amount(0), Err(LedgerError::InvalidAmount(_))));
        assert!(matches!(validate_amount(-5), Err(LedgerError::InvalidAmount(_))));
    }

    #[test]
    fn test_require_non_empty_trims() {
        assert_eq!(require_non_empty("name", "  bob ").unwrap(), "bob");
        assert!(matches!(
            require_non_empty("name", "   "),
            Err(LedgerError::InvalidInput(_))
        ));
    }
}
