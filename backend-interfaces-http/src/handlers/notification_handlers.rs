use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;

use backend_application::commands::notification_commands;
use backend_application::dtos::{CountOutcome, NotificationListQuery};
use backend_application::queries::notification_queries;
use backend_application::AppState;
use backend_domain::{Notification, Page};

use crate::handlers::{done, envelope, Envelope};
use crate::middleware::resolve_session;

pub async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NotificationListQuery>,
) -> Envelope<Page<Notification>> {
    let session = resolve_session(&state, &headers).await;
    envelope(notification_queries::list_notifications(&state, session.as_ref(), query).await)
}

pub async fn unread_count(State(state): State<AppState>, headers: HeaderMap) -> Envelope<CountOutcome> {
    let session = resolve_session(&state, &headers).await;
    envelope(notification_queries::unread_count(&state, session.as_ref()).await)
}

pub async fn mark_all_read(State(state): State<AppState>, headers: HeaderMap) -> Envelope<CountOutcome> {
    let session = resolve_session(&state, &headers).await;
    envelope(notification_commands::mark_all_read(&state, session.as_ref()).await)
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
    headers: HeaderMap,
) -> Envelope<Notification> {
    let session = resolve_session(&state, &headers).await;
    envelope(notification_commands::mark_read(&state, session.as_ref(), &notification_id).await)
}

pub async fn delete_notification(
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
    headers: HeaderMap,
) -> Envelope<()> {
    let session = resolve_session(&state, &headers).await;
    done(
        notification_commands::delete_notification(&state, session.as_ref(), &notification_id)
            .await,
        "Notification deleted",
    )
}
