use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AccountNumber;

pub type UserId = String;

/// A registered user. The raw password is never kept; `password_hash` is a
/// PHC-formatted argon2 hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub account_numbers: BTreeSet<AccountNumber>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        user_id: impl Into<UserId>,
        name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            password_hash: password_hash.into(),
            account_numbers: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    pub fn owns(&self, account_number: &str) -> bool {
        self.account_numbers.contains(account_number)
    }
}
