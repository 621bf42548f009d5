//! Notification dispatch.
//!
//! Persisting the in-app notification and sending the email are independent:
//! a failed email is logged and counted, the stored notification stays.

use chrono::Utc;
use tracing::{error, warn};

use backend_domain::{
    action_url,
    new_id,
    render_notification,
    template_for,
    EmailMessage,
    Notification,
    NotificationMetadata,
    NotificationStatus,
    NotificationType,
    Role,
};

use crate::{AppError, AppState};

pub async fn notify(
    state: &AppState,
    kind: NotificationType,
    recipient_id: &str,
    metadata: NotificationMetadata,
) -> Result<Notification, AppError> {
    let recipient = state.directory.find_user(recipient_id).await.map_err(|err| {
        error!("failed to load notification recipient {}: {}", recipient_id, err);
        AppError::Internal(err)
    })?;
    let is_admin = recipient
        .as_ref()
        .map(|user| user.role == Role::Admin)
        .unwrap_or(false);

    let template = template_for(kind);
    let rendered = render_notification(kind, &metadata, &state.config.currency_symbol);
    let now = Utc::now();
    let notification = Notification {
        id: new_id(),
        user_id: recipient_id.to_string(),
        notification_type: kind,
        title: rendered.title,
        message: rendered.message,
        status: NotificationStatus::Unread,
        priority: template.priority,
        category: template.category,
        requires_action: template.requires_action,
        action_url: action_url(kind, &metadata, is_admin),
        metadata,
        created_at: now,
        updated_at: now,
        read_at: None,
    };
    state
        .notification_repo
        .insert_notification(&notification)
        .await
        .map_err(AppError::Internal)?;
    state.metrics.record_notification();

    if template.email_enabled {
        match recipient {
            Some(user) if !user.email.trim().is_empty() => {
                let email = build_email(state, &notification, &user.email);
                if let Err(err) = state.email_sender.send(&email).await {
                    state.metrics.record_email_failure();
                    warn!(
                        notification_id = %notification.id,
                        kind = kind.as_str(),
                        "notification email failed: {}",
                        err
                    );
                }
            }
            Some(_) => {}
            None => warn!("notification recipient {} not found, email skipped", recipient_id),
        }
    }

    Ok(notification)
}

/// Fire-and-forget variant for workflows whose state change already happened.
pub async fn notify_best_effort(
    state: &AppState,
    kind: NotificationType,
    recipient_id: &str,
    metadata: NotificationMetadata,
) {
    if let Err(err) = notify(state, kind, recipient_id, metadata).await {
        warn!(
            kind = kind.as_str(),
            recipient = recipient_id,
            "notification dispatch failed: {}",
            err
        );
    }
}

pub async fn notify_admins(
    state: &AppState,
    kind: NotificationType,
    metadata: NotificationMetadata,
) -> usize {
    let admins = match state.directory.list_admins().await {
        Ok(admins) => admins,
        Err(err) => {
            warn!("failed to list admins for {}: {}", kind.as_str(), err);
            return 0;
        }
    };
    let mut delivered = 0;
    for admin in admins {
        match notify(state, kind, &admin.id, metadata.clone()).await {
            Ok(_) => delivered += 1,
            Err(err) => warn!(admin = %admin.id, "admin notification failed: {}", err),
        }
    }
    delivered
}

fn build_email(state: &AppState, notification: &Notification, to: &str) -> EmailMessage {
    let mut body = notification.message.clone();
    if let Some(path) = &notification.action_url {
        body.push_str("\n\n");
        body.push_str(state.config.public_base_url.trim_end_matches('/'));
        body.push_str(path);
    }
    EmailMessage {
        to: to.to_string(),
        subject: format!("[Stagepass] {}", notification.title),
        body,
    }
}
