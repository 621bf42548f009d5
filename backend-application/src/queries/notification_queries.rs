use crate::dtos::{CountOutcome, NotificationListQuery};
use crate::guard::{authorize, AUTHENTICATED};
use crate::{AppError, AppState};
use backend_domain::{Notification, Page, PageRequest, Session};

pub async fn list_notifications(
    state: &AppState,
    session: Option<&Session>,
    query: NotificationListQuery,
) -> Result<Page<Notification>, AppError> {
    let session = authorize(state, &AUTHENTICATED, session)?;
    let page = PageRequest::new(query.page, query.limit);
    Ok(state
        .notification_repo
        .list_notifications(&session.user_id, query.unread_only, page)
        .await?)
}

pub async fn unread_count(
    state: &AppState,
    session: Option<&Session>,
) -> Result<CountOutcome, AppError> {
    let session = authorize(state, &AUTHENTICATED, session)?;
    let count = state.notification_repo.unread_count(&session.user_id).await?;
    Ok(CountOutcome { count })
}
