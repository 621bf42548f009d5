pub mod notification_commands;
pub mod payout_commands;
pub mod refund_commands;
pub mod review_commands;
