use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, UserId};

pub type AccountNumber = String;

/// The closed set of currencies an account can be opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Kzt,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Eur, Currency::Kzt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Kzt => "KZT",
        }
    }

    /// Parse a currency code, ignoring case and surrounding whitespace.
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "KZT" => Some(Currency::Kzt),
            _ => None,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bank account. The balance is owned by the store and only changes
/// through deposit, withdraw and transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_number: AccountNumber,
    pub owner_id: UserId,
    pub currency: Currency,
    pub balance: Cents,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Open a new account with a zero balance.
    pub fn open(
        account_number: impl Into<AccountNumber>,
        owner_id: impl Into<UserId>,
        currency: Currency,
    ) -> Self {
        Self {
            account_number: account_number.into(),
            owner_id: owner_id.into(),
            currency,
            balance: 0,
            created_at: Utc::now(),
        }
    }

    pub fn can_cover(&self, amount: Cents) -> bool {
        self.balance >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_codes() {
        for currency in Currency::ALL {
            assert_eq!(Currency::from_code(currency.as_str()), Some(currency));
        }
        assert_eq!(Currency::from_code(" kzt "), Some(Currency::Kzt));
        assert_eq!(Currency::from_code("eur"), Some(Currency::Eur));
        assert_eq!(Currency::from_code("GBP"), None);
    }

    #[test]
    fn test_currency_serializes_as_code() {
        let json = serde_json::to_string(&Currency::Kzt).unwrap();
        assert_eq!(json, "\"KZT\"");
    }

    #[test]
    fn test_open_account_starts_empty() {
        let account = Account::open("KZ-001", "alice", Currency::Kzt);
        assert_eq!(account.balance, 0);
        assert_eq!(account.owner_id, "alice");
        assert!(account.can_cover(0));
        assert!(!account.can_cover(1));
    }
}
