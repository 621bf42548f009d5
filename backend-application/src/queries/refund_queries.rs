use crate::dtos::StatusPageQuery;
use crate::guard::{authorize, REFUND_PROCESSING};
use crate::{AppError, AppState};
use backend_domain::{Page, PageRequest, RefundRequest, RefundStatus, Session};

pub async fn list_refunds(
    state: &AppState,
    session: Option<&Session>,
    query: StatusPageQuery,
) -> Result<Page<RefundRequest>, AppError> {
    authorize(state, &REFUND_PROCESSING, session)?;
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            RefundStatus::try_from(raw).map_err(|err| AppError::Validation(err.to_string()))?,
        ),
    };
    let page = PageRequest::new(query.page, query.limit);
    Ok(state.order_repo.list_refunds(status, page).await?)
}
