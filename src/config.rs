use std::path::PathBuf;
use std::time::Duration;

/// Runtime settings for opening the ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// SQLite database file. Created on open if missing.
    pub database_path: PathBuf,
    /// Upper bound on waiting for an account lock before failing with `Busy`.
    pub lock_timeout: Duration,
    /// How long SQLite waits on a locked database file (other processes).
    pub busy_timeout: Duration,
    /// Pool size. One connection keeps every transaction on a single
    /// writer; raise it only for read-heavy callers.
    pub max_connections: u32,
}

impl LedgerConfig {
    pub const DEFAULT_DATABASE: &'static str = "kassa.db";
    pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Self::default()
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(Self::DEFAULT_DATABASE),
            lock_timeout: Self::DEFAULT_LOCK_TIMEOUT,
            busy_timeout: Self::DEFAULT_BUSY_TIMEOUT,
            max_connections: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.database_path, PathBuf::from("kassa.db"));
        assert_eq!(config.lock_timeout, Duration::from_secs(5));
        assert_eq!(config.max_connections, 1);
    }

    #[test]
    fn test_builder_overrides() {
        let config = LedgerConfig::new("/tmp/ledger.db")
            .with_lock_timeout(Duration::from_millis(250))
            .with_max_connections(0);
        assert_eq!(config.database_path, PathBuf::from("/tmp/ledger.db"));
        assert_eq!(config.lock_timeout, Duration::from_millis(250));
        assert_eq!(config.max_connections, 1);
    }
}
