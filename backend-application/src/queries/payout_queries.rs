use crate::dtos::StatusPageQuery;
use crate::guard::{authorize, FINANCE_DASHBOARD, ORGANIZER};
use crate::{AppError, AppState};
use backend_domain::{Page, PageRequest, PayoutRequest, PayoutStatus, Session};

pub async fn list_payouts(
    state: &AppState,
    session: Option<&Session>,
    query: StatusPageQuery,
) -> Result<Page<PayoutRequest>, AppError> {
    authorize(state, &FINANCE_DASHBOARD, session)?;
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            PayoutStatus::try_from(raw).map_err(|err| AppError::Validation(err.to_string()))?,
        ),
    };
    let page = PageRequest::new(query.page, query.limit);
    Ok(state.payout_repo.list_payouts(status, page).await?)
}

/// The caller's own payout history, newest first.
pub async fn list_organizer_payouts(
    state: &AppState,
    session: Option<&Session>,
) -> Result<Vec<PayoutRequest>, AppError> {
    let session = authorize(state, &ORGANIZER, session)?;
    Ok(state
        .payout_repo
        .list_organizer_payouts(&session.user_id)
        .await?)
}
