// Application layer: credential checks, account locking and the ledger
// operations built on top of the storage layer.

mod auth;
pub mod error;
mod locks;
mod service;

pub use auth::*;
pub use error::*;
pub use locks::*;
pub use service::*;
