use chrono::Utc;
use tracing::debug;

use crate::dtos::CountOutcome;
use crate::guard::{authorize, AUTHENTICATED};
use crate::{AppError, AppState};
use backend_domain::{Notification, Session};

/// Marking an already-read notification again leaves `read_at` untouched.
pub async fn mark_read(
    state: &AppState,
    session: Option<&Session>,
    notification_id: &str,
) -> Result<Notification, AppError> {
    let session = authorize(state, &AUTHENTICATED, session)?;
    state
        .notification_repo
        .mark_read(&session.user_id, notification_id, Utc::now())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("notification '{}'", notification_id)))
}

pub async fn mark_all_read(
    state: &AppState,
    session: Option<&Session>,
) -> Result<CountOutcome, AppError> {
    let session = authorize(state, &AUTHENTICATED, session)?;
    let count = state
        .notification_repo
        .mark_all_read(&session.user_id, Utc::now())
        .await?;
    debug!(user_id = %session.user_id, count, "notifications marked read");
    Ok(CountOutcome { count })
}

pub async fn delete_notification(
    state: &AppState,
    session: Option<&Session>,
    notification_id: &str,
) -> Result<(), AppError> {
    let session = authorize(state, &AUTHENTICATED, session)?;
    if !state
        .notification_repo
        .delete_notification(&session.user_id, notification_id)
        .await?
    {
        return Err(AppError::NotFound(format!(
            "notification '{}'",
            notification_id
        )));
    }
    Ok(())
}
