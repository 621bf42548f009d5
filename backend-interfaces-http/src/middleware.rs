pub mod auth;
pub mod signature;

pub use auth::*;
pub use signature::*;
