use thiserror::Error;

use crate::domain::{Cents, Currency};

/// Every way a ledger operation can fail. None of them are fatal, and an
/// operation that returns one of these has not changed any balance.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient funds in account {account}: balance {balance}, required {required}")]
    InsufficientFunds {
        account: String,
        balance: Cents,
        required: Cents,
    },

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Account already exists: {0}")]
    DuplicateAccount(String),

    #[error("User already exists: {0}")]
    DuplicateUser(String),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Cannot transfer from account {0} to itself")]
    SameAccount(String),

    #[error("Currency mismatch between accounts: {from_currency} vs {to_currency}")]
    CurrencyMismatch {
        from_currency: Currency,
        to_currency: Currency,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Account {0} is busy, try again")]
    Busy(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage unavailable: {0:#}")]
    StorageUnavailable(#[from] anyhow::Error),
}

impl LedgerError {
    /// True when the same request may succeed if simply retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::Busy(_) | LedgerError::StorageUnavailable(_)
        )
    }
}
