// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::time::Duration;

use anyhow::Result;
use kassa::application::LedgerService;
use kassa::config::LedgerConfig;
use kassa::domain::{Cents, Currency};
use tempfile::TempDir;

pub const ALICE_PASSWORD: &str = "alice-pw";
pub const BOB_PASSWORD: &str = "bob-pw";

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    test_service_with(|config| config).await
}

/// Same as [`test_service`] but lets the caller adjust the config.
pub async fn test_service_with(
    adjust: impl FnOnce(LedgerConfig) -> LedgerConfig,
) -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let config = adjust(
        LedgerConfig::new(temp_dir.path().join("test.db"))
            .with_lock_timeout(Duration::from_secs(10)),
    );
    let service = LedgerService::open(&config).await?;
    Ok((service, temp_dir))
}

/// Test fixture: two users, each with one account
pub struct StandardAccounts;

impl StandardAccounts {
    /// alice owns "A-USD", bob owns "B-USD"; both empty.
    pub async fn create_basic(service: &LedgerService) -> Result<()> {
        service.create_user("alice", "Alice", ALICE_PASSWORD).await?;
        service.create_user("bob", "Bob", BOB_PASSWORD).await?;
        service
            .create_account("alice", "A-USD", Currency::Usd)
            .await?;
        service.create_account("bob", "B-USD", Currency::Usd).await?;
        Ok(())
    }

    /// Basic setup plus a KZT account for alice.
    pub async fn create_with_kzt(service: &LedgerService) -> Result<()> {
        Self::create_basic(service).await?;
        service
            .create_account("alice", "A-KZT", Currency::Kzt)
            .await?;
        Ok(())
    }

    /// Basic setup with opening balances.
    pub async fn create_funded(service: &LedgerService, alice: Cents, bob: Cents) -> Result<()> {
        Self::create_basic(service).await?;
        if alice > 0 {
            service.deposit("A-USD", alice).await?;
        }
        if bob > 0 {
            service.deposit("B-USD", bob).await?;
        }
        Ok(())
    }
}

pub async fn balance(service: &LedgerService, account: &str) -> Result<Cents> {
    Ok(service.get_account(account).await?.balance)
}
