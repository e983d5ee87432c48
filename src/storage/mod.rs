mod accounts;
mod repository;
mod transaction;
mod users;

pub use accounts::*;
pub use repository::*;
pub use transaction::*;

/// SQL migration for the initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");
