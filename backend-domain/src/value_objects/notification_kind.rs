// Notification type and status value objects

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    TicketPurchased,
    EventReminder,
    EventUpdated,
    EventCancelled,
    ReviewReceived,
    ReviewModerated,
    PayoutRequested,
    PayoutProcessing,
    PaymentReceived,
    PayoutFailed,
    PayoutRejected,
    RefundRequested,
    RefundProcessed,
    RefundRejected,
    RefundFailed,
    SystemAnnouncement,
}

impl NotificationType {
    pub const ALL: [NotificationType; 16] = [
        NotificationType::TicketPurchased,
        NotificationType::EventReminder,
        NotificationType::EventUpdated,
        NotificationType::EventCancelled,
        NotificationType::ReviewReceived,
        NotificationType::ReviewModerated,
        NotificationType::PayoutRequested,
        NotificationType::PayoutProcessing,
        NotificationType::PaymentReceived,
        NotificationType::PayoutFailed,
        NotificationType::PayoutRejected,
        NotificationType::RefundRequested,
        NotificationType::RefundProcessed,
        NotificationType::RefundRejected,
        NotificationType::RefundFailed,
        NotificationType::SystemAnnouncement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::TicketPurchased => "TICKET_PURCHASED",
            NotificationType::EventReminder => "EVENT_REMINDER",
            NotificationType::EventUpdated => "EVENT_UPDATED",
            NotificationType::EventCancelled => "EVENT_CANCELLED",
            NotificationType::ReviewReceived => "REVIEW_RECEIVED",
            NotificationType::ReviewModerated => "REVIEW_MODERATED",
            NotificationType::PayoutRequested => "PAYOUT_REQUESTED",
            NotificationType::PayoutProcessing => "PAYOUT_PROCESSING",
            NotificationType::PaymentReceived => "PAYMENT_RECEIVED",
            NotificationType::PayoutFailed => "PAYOUT_FAILED",
            NotificationType::PayoutRejected => "PAYOUT_REJECTED",
            NotificationType::RefundRequested => "REFUND_REQUESTED",
            NotificationType::RefundProcessed => "REFUND_PROCESSED",
            NotificationType::RefundRejected => "REFUND_REJECTED",
            NotificationType::RefundFailed => "REFUND_FAILED",
            NotificationType::SystemAnnouncement => "SYSTEM_ANNOUNCEMENT",
        }
    }
}

impl TryFrom<&str> for NotificationType {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let upper = s.trim().to_uppercase();
        NotificationType::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == upper)
            .ok_or_else(|| anyhow!("unknown notification type '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    Unread,
    Read,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Unread => "UNREAD",
            NotificationStatus::Read => "READ",
        }
    }
}

impl From<&str> for NotificationStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "READ" => NotificationStatus::Read,
            _ => NotificationStatus::Unread,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_round_trips_through_its_name() {
        for kind in NotificationType::ALL {
            let parsed = NotificationType::try_from(kind.as_str()).expect("known type");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn serde_name_matches_as_str() {
        let value = serde_json::to_value(NotificationType::PaymentReceived).expect("serialize");
        assert_eq!(value, serde_json::json!("PAYMENT_RECEIVED"));
    }
}
