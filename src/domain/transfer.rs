use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{format_cents, AccountNumber, Cents, Currency};

/// Confirmation of a committed transfer.
/// Only produced after both legs are durable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// Debited account
    pub from_account: AccountNumber,
    /// Credited account
    pub to_account: AccountNumber,
    /// Amount moved, always positive
    pub amount_cents: Cents,
    pub currency: Currency,
    /// Sender balance after commit
    pub from_balance: Cents,
    /// Recipient balance after commit
    pub to_balance: Cents,
    pub completed_at: DateTime<Utc>,
}

impl std::fmt::Display for TransferReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Transferred {} {} from {} to {}",
            format_cents(self.amount_cents),
            self.currency,
            self.from_account,
            self.to_account
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_display_names_both_accounts() {
        let receipt = TransferReceipt {
            from_account: "A".into(),
            to_account: "B".into(),
            amount_cents: 1050,
            currency: Currency::Usd,
            from_balance: 0,
            to_balance: 1050,
            completed_at: Utc::now(),
        };
        assert_eq!(receipt.to_string(), "Transferred 10.50 USD from A to B");
    }
}
