// Pure domain services

pub mod fees;
pub mod notification_templates;
pub mod rating_stats;
pub mod review_export;

pub use fees::*;
pub use notification_templates::*;
pub use rating_stats::*;
pub use review_export::*;
