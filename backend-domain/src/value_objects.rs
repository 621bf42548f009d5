// Domain value objects
pub mod identifiers;
pub mod moderation;
pub mod notification_kind;
pub mod payout_status;
pub mod refund_status;
pub mod roles;

pub use identifiers::*;
pub use moderation::*;
pub use notification_kind::*;
pub use payout_status::*;
pub use refund_status::*;
pub use roles::*;
