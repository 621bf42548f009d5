mod common;

use backend_application::commands::notification_commands;
use backend_application::dispatcher::notify;
use backend_application::dtos::NotificationListQuery;
use backend_application::queries::notification_queries;
use backend_application::AppError;
use backend_domain::{
    NotificationCategory,
    NotificationMetadata,
    NotificationPriority,
    NotificationStatus,
    NotificationType,
};
use common::{buyer, other_buyer, super_admin, Harness, BUYER, EVENT, SUPER_ADMIN};

fn event_metadata() -> NotificationMetadata {
    NotificationMetadata {
        event_id: Some(EVENT.to_string()),
        event_title: Some("Lagos Jazz Night".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn marking_read_is_idempotent() {
    let harness = Harness::new().await;
    let state = &harness.state;
    let created = notify(state, NotificationType::EventReminder, BUYER, event_metadata())
        .await
        .unwrap();
    assert_eq!(created.status, NotificationStatus::Unread);
    assert_eq!(created.action_url.as_deref(), Some("/events/ev-1"));

    let first = notification_commands::mark_read(state, Some(&buyer()), &created.id)
        .await
        .unwrap();
    assert_eq!(first.status, NotificationStatus::Read);
    assert!(first.read_at.is_some());

    let second = notification_commands::mark_read(state, Some(&buyer()), &created.id)
        .await
        .unwrap();
    assert_eq!(second.status, NotificationStatus::Read);
    assert_eq!(second.read_at, first.read_at);
}

#[tokio::test]
async fn template_attributes_are_stored_with_the_notification() {
    let harness = Harness::new().await;
    let state = &harness.state;
    let created = notify(
        state,
        NotificationType::PayoutRequested,
        SUPER_ADMIN,
        NotificationMetadata {
            payout_id: Some("p-1".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(created.priority, NotificationPriority::High);
    assert_eq!(created.category, NotificationCategory::Payout);
    assert!(created.requires_action);

    let listed = notification_queries::list_notifications(
        state,
        Some(&super_admin()),
        NotificationListQuery {
            unread_only: false,
            page: None,
            limit: None,
        },
    )
    .await
    .unwrap();
    let stored = listed
        .items
        .iter()
        .find(|n| n.id == created.id)
        .expect("stored notification");
    assert_eq!(stored.priority, NotificationPriority::High);
    assert!(stored.requires_action);

    let body = serde_json::to_value(stored).expect("serialize");
    assert_eq!(body["priority"], "high");
    assert_eq!(body["category"], "payout");
    assert_eq!(body["requiresAction"], true);
}

#[tokio::test]
async fn mark_all_read_clears_the_unread_count() {
    let harness = Harness::new().await;
    let state = &harness.state;
    for kind in [
        NotificationType::EventReminder,
        NotificationType::EventUpdated,
        NotificationType::TicketPurchased,
    ] {
        notify(state, kind, BUYER, event_metadata()).await.unwrap();
    }

    let count = notification_queries::unread_count(state, Some(&buyer()))
        .await
        .unwrap();
    assert_eq!(count.count, 3);

    let unread = notification_queries::list_notifications(
        state,
        Some(&buyer()),
        NotificationListQuery {
            unread_only: true,
            page: Some(1),
            limit: Some(2),
        },
    )
    .await
    .unwrap();
    assert_eq!(unread.items.len(), 2);
    assert_eq!(unread.total_count, 3);

    let marked = notification_commands::mark_all_read(state, Some(&buyer()))
        .await
        .unwrap();
    assert_eq!(marked.count, 3);
    let again = notification_commands::mark_all_read(state, Some(&buyer()))
        .await
        .unwrap();
    assert_eq!(again.count, 0);

    let count = notification_queries::unread_count(state, Some(&buyer()))
        .await
        .unwrap();
    assert_eq!(count.count, 0);
}

#[tokio::test]
async fn failed_email_keeps_the_notification() {
    let harness = Harness::new().await;
    let state = &harness.state;
    harness.email.fail_all();

    notify(state, NotificationType::EventCancelled, BUYER, event_metadata())
        .await
        .unwrap();

    let stored = harness.notifications_for(BUYER).await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].title, "Event cancelled");
    assert_eq!(state.metrics.email_failures(), 1);
    assert_eq!(state.metrics.notifications_created(), 1);
    assert!(harness.email.sent().is_empty());
}

#[tokio::test]
async fn in_app_only_types_send_no_email() {
    let harness = Harness::new().await;
    notify(
        &harness.state,
        NotificationType::SystemAnnouncement,
        BUYER,
        NotificationMetadata {
            message: Some("Scheduled maintenance on Sunday.".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let stored = harness.notifications_for(BUYER).await;
    assert_eq!(stored[0].message, "Scheduled maintenance on Sunday.");
    assert!(harness.email.sent().is_empty());
}

#[tokio::test]
async fn users_only_see_their_own_notifications() {
    let harness = Harness::new().await;
    let state = &harness.state;
    let created = notify(state, NotificationType::EventReminder, BUYER, event_metadata())
        .await
        .unwrap();

    let err = notification_commands::mark_read(state, Some(&other_buyer()), &created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = notification_commands::delete_notification(state, Some(&other_buyer()), &created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = notification_queries::unread_count(state, None).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthenticated));

    notification_commands::delete_notification(state, Some(&buyer()), &created.id)
        .await
        .unwrap();
    assert!(harness.notifications_for(BUYER).await.is_empty());
}
