// Domain entities

pub mod config;
pub mod directory;
pub mod notification;
pub mod page;
pub mod payout;
pub mod rating;
pub mod refund;
pub mod session;

pub use config::*;
pub use directory::*;
pub use notification::*;
pub use page::*;
pub use payout::*;
pub use rating::*;
pub use refund::*;
pub use session::*;
