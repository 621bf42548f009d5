use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::payout_commands;
use backend_application::dtos::{
    BulkOutcome,
    BulkProcessInput,
    PayoutRequestInput,
    ReasonInput,
    StatusPageQuery,
};
use backend_application::queries::payout_queries;
use backend_application::AppState;
use backend_domain::{Page, PayoutRequest};

use crate::handlers::{envelope, envelope_message, Envelope};
use crate::middleware::resolve_session;

pub async fn request_payout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<PayoutRequestInput>,
) -> Envelope<PayoutRequest> {
    let session = resolve_session(&state, &headers).await;
    envelope_message(
        payout_commands::request_payout(&state, session.as_ref(), input).await,
        "Payout request submitted",
    )
}

pub async fn list_organizer_payouts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Envelope<Vec<PayoutRequest>> {
    let session = resolve_session(&state, &headers).await;
    envelope(payout_queries::list_organizer_payouts(&state, session.as_ref()).await)
}

pub async fn list_payouts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StatusPageQuery>,
) -> Envelope<Page<PayoutRequest>> {
    let session = resolve_session(&state, &headers).await;
    envelope(payout_queries::list_payouts(&state, session.as_ref(), query).await)
}

pub async fn approve_payout(
    State(state): State<AppState>,
    Path(payout_id): Path<String>,
    headers: HeaderMap,
) -> Envelope<PayoutRequest> {
    let session = resolve_session(&state, &headers).await;
    envelope(payout_commands::approve_payout(&state, session.as_ref(), &payout_id).await)
}

pub async fn reject_payout(
    State(state): State<AppState>,
    Path(payout_id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<ReasonInput>,
) -> Envelope<PayoutRequest> {
    let session = resolve_session(&state, &headers).await;
    envelope(
        payout_commands::reject_payout(&state, session.as_ref(), &payout_id, input.reason).await,
    )
}

pub async fn retry_payout(
    State(state): State<AppState>,
    Path(payout_id): Path<String>,
    headers: HeaderMap,
) -> Envelope<PayoutRequest> {
    let session = resolve_session(&state, &headers).await;
    envelope(payout_commands::retry_payout(&state, session.as_ref(), &payout_id).await)
}

pub async fn bulk_process_payouts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<BulkProcessInput>,
) -> Envelope<BulkOutcome> {
    let session = resolve_session(&state, &headers).await;
    envelope(
        payout_commands::bulk_process_payouts(
            &state,
            session.as_ref(),
            input.ids,
            input.approve,
            input.reason,
        )
        .await,
    )
}
