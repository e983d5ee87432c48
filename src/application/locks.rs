use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

use super::LedgerError;

type LockTable = DashMap<String, Arc<Mutex<()>>>;

/// Per-account mutual exclusion for balance read-check-write sequences.
///
/// Locks for several accounts are always taken in ascending account-number
/// order, so two transfers in opposite directions cannot deadlock. A lock
/// exists in the table only while someone holds or waits for it.
pub struct AccountLocks {
    locks: Arc<LockTable>,
    timeout: Duration,
}

/// Held account locks. Released on drop; entries nobody else is using are
/// removed from the table at the same time.
#[must_use = "account locks are released as soon as the guard is dropped"]
pub struct AccountGuard {
    table: Arc<LockTable>,
    held: Vec<(String, OwnedMutexGuard<()>)>,
}

impl AccountLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            timeout,
        }
    }

    /// Lock every listed account, waiting at most the configured timeout for
    /// each one. Duplicates are locked once.
    pub async fn acquire(&self, accounts: &[&str]) -> Result<AccountGuard, LedgerError> {
        let mut ordered: Vec<&str> = accounts.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        // Locks taken so far are released through the guard's Drop if a
        // later wait expires.
        let mut guard = AccountGuard {
            table: Arc::clone(&self.locks),
            held: Vec::with_capacity(ordered.len()),
        };

        for account in ordered {
            let lock = self.lock_for(account);
            match tokio::time::timeout(self.timeout, Arc::clone(&lock).lock_owned()).await {
                Ok(held) => guard.held.push((account.to_string(), held)),
                Err(_) => {
                    drop(lock);
                    release_if_idle(&self.locks, account);
                    warn!(
                        account,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "account lock wait expired"
                    );
                    return Err(LedgerError::Busy(account.to_string()));
                }
            }
        }

        Ok(guard)
    }

    /// Number of accounts currently present in the lock table.
    pub fn tracked(&self) -> usize {
        self.locks.len()
    }

    fn lock_for(&self, account: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.get(account) {
            return lock.clone();
        }
        self.locks
            .entry(account.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Drop the table entry for `account` when the table holds the only
/// reference. `remove_if` runs under the shard lock, so no clone can be
/// handed out concurrently.
fn release_if_idle(table: &LockTable, account: &str) {
    table.remove_if(account, |_, lock| Arc::strong_count(lock) == 1);
}

impl Drop for AccountGuard {
    fn drop(&mut self) {
        for (account, held) in self.held.drain(..) {
            drop(held);
            release_if_idle(&self.table, &account);
        }
    }
}
