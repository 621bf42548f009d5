// Notification template registry
// One exhaustive match per concern keeps every type covered at compile time.

use serde::{Deserialize, Serialize};

use crate::entities::NotificationMetadata;
use crate::utils::format_currency;
use crate::value_objects::NotificationType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Ticket,
    Event,
    Review,
    Payout,
    Refund,
    System,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Medium => "medium",
            NotificationPriority::High => "high",
        }
    }
}

impl From<&str> for NotificationPriority {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" => NotificationPriority::Low,
            "high" => NotificationPriority::High,
            _ => NotificationPriority::Medium,
        }
    }
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Ticket => "ticket",
            NotificationCategory::Event => "event",
            NotificationCategory::Review => "review",
            NotificationCategory::Payout => "payout",
            NotificationCategory::Refund => "refund",
            NotificationCategory::System => "system",
        }
    }
}

impl From<&str> for NotificationCategory {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "ticket" => NotificationCategory::Ticket,
            "event" => NotificationCategory::Event,
            "review" => NotificationCategory::Review,
            "payout" => NotificationCategory::Payout,
            "refund" => NotificationCategory::Refund,
            _ => NotificationCategory::System,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationTemplate {
    pub priority: NotificationPriority,
    pub category: NotificationCategory,
    pub requires_action: bool,
    pub email_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotification {
    pub title: String,
    pub message: String,
}

pub fn template_for(kind: NotificationType) -> NotificationTemplate {
    use NotificationCategory as C;
    use NotificationPriority as P;
    let (priority, category, requires_action, email_enabled) = match kind {
        NotificationType::TicketPurchased => (P::Medium, C::Ticket, false, true),
        NotificationType::EventReminder => (P::Medium, C::Event, false, true),
        NotificationType::EventUpdated => (P::Medium, C::Event, false, true),
        NotificationType::EventCancelled => (P::High, C::Event, true, true),
        NotificationType::ReviewReceived => (P::Low, C::Review, false, false),
        NotificationType::ReviewModerated => (P::Medium, C::Review, false, true),
        NotificationType::PayoutRequested => (P::High, C::Payout, true, true),
        NotificationType::PayoutProcessing => (P::Medium, C::Payout, false, false),
        NotificationType::PaymentReceived => (P::High, C::Payout, false, true),
        NotificationType::PayoutFailed => (P::High, C::Payout, true, true),
        NotificationType::PayoutRejected => (P::High, C::Payout, true, true),
        NotificationType::RefundRequested => (P::High, C::Refund, true, true),
        NotificationType::RefundProcessed => (P::High, C::Refund, false, true),
        NotificationType::RefundRejected => (P::Medium, C::Refund, false, true),
        NotificationType::RefundFailed => (P::High, C::Refund, true, true),
        NotificationType::SystemAnnouncement => (P::Low, C::System, false, false),
    };
    NotificationTemplate {
        priority,
        category,
        requires_action,
        email_enabled,
    }
}

/// Fills the type's title/message. Missing metadata falls back to generic wording.
pub fn render_notification(
    kind: NotificationType,
    meta: &NotificationMetadata,
    currency_symbol: &str,
) -> RenderedNotification {
    let event = meta.event_title.as_deref();
    let money = |value: Option<rust_decimal::Decimal>| {
        value.map(|amount| format_currency(amount, currency_symbol))
    };
    let payout = money(meta.payout_amount.or(meta.amount));
    let amount = money(meta.amount);
    let reason = meta.reason.as_deref();

    let (title, message) = match kind {
        NotificationType::TicketPurchased => (
            "Ticket confirmed".to_string(),
            match (event, meta.ticket_count) {
                (Some(title), Some(count)) => {
                    format!("Your {} ticket(s) for {} are confirmed.", count, title)
                }
                (Some(title), None) => format!("Your ticket for {} is confirmed.", title),
                _ => "Your ticket purchase is confirmed.".to_string(),
            },
        ),
        NotificationType::EventReminder => (
            "Event reminder".to_string(),
            match event {
                Some(title) => format!("{} is coming up soon. Don't forget your ticket.", title),
                None => "An event you have a ticket for is coming up soon.".to_string(),
            },
        ),
        NotificationType::EventUpdated => (
            "Event updated".to_string(),
            match event {
                Some(title) => format!("The organizer updated details for {}.", title),
                None => "An event you have a ticket for was updated.".to_string(),
            },
        ),
        NotificationType::EventCancelled => (
            "Event cancelled".to_string(),
            match event {
                Some(title) => format!(
                    "{} has been cancelled. You can request a refund from your orders.",
                    title
                ),
                None => "An event you have a ticket for has been cancelled.".to_string(),
            },
        ),
        NotificationType::ReviewReceived => (
            "New review".to_string(),
            match (event, meta.rating) {
                (Some(title), Some(rating)) => {
                    format!("{} received a {}-star review.", title, rating.normalize())
                }
                (Some(title), None) => format!("{} received a new review.", title),
                _ => "One of your events received a new review.".to_string(),
            },
        ),
        NotificationType::ReviewModerated => (
            "Review moderated".to_string(),
            match event {
                Some(title) => format!(
                    "Your review of {} was hidden by a moderator.",
                    title
                ),
                None => "One of your reviews was hidden by a moderator.".to_string(),
            },
        ),
        NotificationType::PayoutRequested => (
            "Payout requested".to_string(),
            match (meta.organizer_name.as_deref(), amount.as_deref()) {
                (Some(name), Some(amount)) => {
                    format!("{} requested a payout of {}.", name, amount)
                }
                (None, Some(amount)) => format!("A payout of {} was requested.", amount),
                _ => "A new payout request is waiting for review.".to_string(),
            },
        ),
        NotificationType::PayoutProcessing => (
            "Payout processing".to_string(),
            match payout.as_deref() {
                Some(amount) => format!("Your payout of {} is being processed.", amount),
                None => "Your payout is being processed.".to_string(),
            },
        ),
        NotificationType::PaymentReceived => (
            "Payout completed".to_string(),
            match payout.as_deref() {
                Some(amount) => {
                    format!("Your payout of {} has been sent to your bank account.", amount)
                }
                None => "Your payout has been sent to your bank account.".to_string(),
            },
        ),
        NotificationType::PayoutFailed => (
            "Payout failed".to_string(),
            match (payout.as_deref(), reason) {
                (Some(amount), Some(reason)) => {
                    format!("Your payout of {} could not be completed: {}", amount, reason)
                }
                (Some(amount), None) => format!("Your payout of {} could not be completed.", amount),
                _ => "Your payout could not be completed.".to_string(),
            },
        ),
        NotificationType::PayoutRejected => (
            "Payout rejected".to_string(),
            match (payout.as_deref(), reason) {
                (Some(amount), Some(reason)) => {
                    format!("Your payout request of {} was rejected: {}", amount, reason)
                }
                (None, Some(reason)) => format!("Your payout request was rejected: {}", reason),
                _ => "Your payout request was rejected.".to_string(),
            },
        ),
        NotificationType::RefundRequested => (
            "Refund requested".to_string(),
            match (meta.buyer_name.as_deref(), event, amount.as_deref()) {
                (Some(buyer), Some(title), Some(amount)) => {
                    format!("{} requested a refund of {} for {}.", buyer, amount, title)
                }
                (_, Some(title), _) => format!("A refund was requested for {}.", title),
                _ => "A new refund request is waiting for review.".to_string(),
            },
        ),
        NotificationType::RefundProcessed => (
            "Refund processed".to_string(),
            match (amount.as_deref(), event) {
                (Some(amount), Some(title)) => {
                    format!("Your refund of {} for {} has been processed.", amount, title)
                }
                (Some(amount), None) => format!("Your refund of {} has been processed.", amount),
                _ => "Your refund has been processed.".to_string(),
            },
        ),
        NotificationType::RefundRejected => (
            "Refund rejected".to_string(),
            match (event, reason) {
                (Some(title), Some(reason)) => {
                    format!("Your refund request for {} was rejected: {}", title, reason)
                }
                (None, Some(reason)) => format!("Your refund request was rejected: {}", reason),
                _ => "Your refund request was rejected.".to_string(),
            },
        ),
        NotificationType::RefundFailed => (
            "Refund failed".to_string(),
            match event {
                Some(title) => format!(
                    "We could not complete your refund for {}. Our team will retry it.",
                    title
                ),
                None => "We could not complete your refund. Our team will retry it.".to_string(),
            },
        ),
        NotificationType::SystemAnnouncement => (
            "Announcement".to_string(),
            meta.message
                .clone()
                .unwrap_or_else(|| "There is a new announcement from Stagepass.".to_string()),
        ),
    };
    RenderedNotification { title, message }
}

/// Relative link the notification should open, depending on who receives it.
pub fn action_url(
    kind: NotificationType,
    meta: &NotificationMetadata,
    is_admin: bool,
) -> Option<String> {
    let event_id = meta.event_id.as_deref();
    let order_id = meta.order_id.as_deref();
    let payout_id = meta.payout_id.as_deref();
    match kind {
        NotificationType::TicketPurchased => Some(match order_id {
            Some(id) => format!("/dashboard/tickets/{}", id),
            None => "/dashboard/tickets".to_string(),
        }),
        NotificationType::EventReminder
        | NotificationType::EventUpdated
        | NotificationType::EventCancelled => event_id.map(|id| format!("/events/{}", id)),
        NotificationType::ReviewReceived => {
            if is_admin {
                Some("/admin/reviews".to_string())
            } else {
                event_id.map(|id| format!("/organizer/events/{}/reviews", id))
            }
        }
        NotificationType::ReviewModerated => Some("/dashboard/reviews".to_string()),
        NotificationType::PayoutRequested
        | NotificationType::PayoutProcessing
        | NotificationType::PaymentReceived
        | NotificationType::PayoutFailed
        | NotificationType::PayoutRejected => {
            if is_admin {
                Some(match payout_id {
                    Some(id) => format!("/admin/payouts/{}", id),
                    None => "/admin/payouts".to_string(),
                })
            } else {
                Some("/organizer/payouts".to_string())
            }
        }
        NotificationType::RefundRequested
        | NotificationType::RefundProcessed
        | NotificationType::RefundRejected
        | NotificationType::RefundFailed => match (is_admin, order_id) {
            (true, Some(id)) => Some(format!("/admin/refunds/{}", id)),
            (true, None) => Some("/admin/refunds".to_string()),
            (false, Some(id)) => Some(format!("/dashboard/orders/{}", id)),
            (false, None) => Some("/dashboard/orders".to_string()),
        },
        NotificationType::SystemAnnouncement => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn payment_received_mentions_net_amount() {
        let meta = NotificationMetadata {
            payout_amount: Some(Decimal::from(47_500)),
            ..Default::default()
        };
        let rendered = render_notification(NotificationType::PaymentReceived, &meta, "₦");
        assert_eq!(
            rendered.message,
            "Your payout of ₦47,500 has been sent to your bank account."
        );
    }

    #[test]
    fn missing_metadata_uses_generic_copy() {
        let meta = NotificationMetadata::default();
        for kind in NotificationType::ALL {
            let rendered = render_notification(kind, &meta, "₦");
            assert!(!rendered.title.is_empty(), "{:?}", kind);
            assert!(!rendered.message.contains("{"), "{:?}", kind);
        }
        let rendered = render_notification(NotificationType::RefundRejected, &meta, "₦");
        assert_eq!(rendered.message, "Your refund request was rejected.");
    }

    #[test]
    fn action_url_depends_on_recipient() {
        let meta = NotificationMetadata {
            payout_id: Some("p-1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            action_url(NotificationType::PayoutRequested, &meta, true).as_deref(),
            Some("/admin/payouts/p-1")
        );
        assert_eq!(
            action_url(NotificationType::PayoutRequested, &meta, false).as_deref(),
            Some("/organizer/payouts")
        );
        assert_eq!(action_url(NotificationType::SystemAnnouncement, &meta, true), None);
    }

    #[test]
    fn event_links_need_an_event_id() {
        let meta = NotificationMetadata::default();
        assert_eq!(action_url(NotificationType::EventCancelled, &meta, false), None);
        let meta = NotificationMetadata {
            event_id: Some("e-9".to_string()),
            ..Default::default()
        };
        assert_eq!(
            action_url(NotificationType::EventCancelled, &meta, false).as_deref(),
            Some("/events/e-9")
        );
    }

    #[test]
    fn in_app_only_types_skip_email() {
        assert!(!template_for(NotificationType::ReviewReceived).email_enabled);
        assert!(template_for(NotificationType::PaymentReceived).email_enabled);
        assert_eq!(
            template_for(NotificationType::RefundRequested).category,
            NotificationCategory::Refund
        );
    }
}
