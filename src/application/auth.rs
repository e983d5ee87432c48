use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::storage::Repository;

use super::LedgerError;

/// Hash a credential into a PHC string (argon2id, random salt).
pub fn hash_credential(password: &str) -> Result<String, LedgerError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LedgerError::InvalidInput(format!("cannot hash credential: {e}")))
}

/// [`hash_credential`] on the blocking thread pool, keeping the CPU-heavy
/// hashing off the async workers.
pub async fn hash_credential_blocking(password: &str) -> Result<String, LedgerError> {
    let password = password.to_owned();
    run_blocking(move || hash_credential(&password)).await?
}

async fn run_blocking<T, F>(work: F) -> Result<T, LedgerError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| LedgerError::Internal(format!("credential worker failed: {e}")))
}

/// Check a credential against a stored PHC string. A malformed stored hash
/// never verifies.
pub fn verify_credential(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hash checked for unknown users, so a missing user costs the same as a
/// wrong password.
fn placeholder_hash() -> &'static str {
    static PLACEHOLDER: OnceLock<String> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| hash_credential("kassa-placeholder").unwrap_or_default())
}

/// Verifies credentials against the user store before mutating operations.
pub struct AuthGate<'a> {
    repo: &'a Repository,
}

impl<'a> AuthGate<'a> {
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// `true` only if the user exists and the credential matches. An unknown
    /// user and a wrong credential are indistinguishable to the caller.
    pub async fn authenticate(&self, user_id: &str, supplied: &str) -> Result<bool, LedgerError> {
        let stored = self.repo.get_password_hash(user_id).await?;
        let supplied = supplied.to_owned();

        run_blocking(move || match stored {
            Some(stored) => verify_credential(&supplied, &stored),
            None => {
                let _ = verify_credential(&supplied, placeholder_hash());
                false
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_credential("s3cret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_credential("s3cret", &hash));
        assert!(!verify_credential("S3cret", &hash));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_hashing_leaves_the_runtime_free() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let done = AtomicBool::new(false);
        let (hash, polls) = tokio::join!(
            async {
                let hash = hash_credential_blocking("s3cret").await;
                done.store(true, Ordering::SeqCst);
                hash
            },
            async {
                let mut polls = 0u32;
                while !done.load(Ordering::SeqCst) {
                    polls += 1;
                    tokio::task::yield_now().await;
                }
                polls
            }
        );

        // Hashing inline would finish before the second branch ever ran.
        assert!(polls > 0);
        assert!(verify_credential("s3cret", &hash.unwrap()));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_credential("same").unwrap();
        let second = hash_credential("same").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_credential("anything", "plaintext-password"));
        assert!(!verify_credential("", ""));
    }

    #[test]
    fn test_placeholder_hash_is_well_formed() {
        assert!(PasswordHash::new(placeholder_hash()).is_ok());
        assert!(!verify_credential("", placeholder_hash()));
    }
}
