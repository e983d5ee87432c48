mod account;
mod money;
mod transfer;
mod user;

pub use account::*;
pub use money::*;
pub use transfer::*;
pub use user::*;
