pub mod notification_queries;
pub mod payout_queries;
pub mod refund_queries;
pub mod review_queries;
