use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::refund_commands;
use backend_application::dtos::{BulkOutcome, BulkProcessInput, ReasonInput, StatusPageQuery};
use backend_application::queries::refund_queries;
use backend_application::AppState;
use backend_domain::{Page, RefundRequest};

use crate::handlers::{envelope, envelope_message, Envelope};
use crate::middleware::resolve_session;

pub async fn request_refund(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<ReasonInput>,
) -> Envelope<RefundRequest> {
    let session = resolve_session(&state, &headers).await;
    envelope_message(
        refund_commands::request_refund(&state, session.as_ref(), &order_id, input.reason).await,
        "Refund request submitted",
    )
}

pub async fn list_refunds(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StatusPageQuery>,
) -> Envelope<Page<RefundRequest>> {
    let session = resolve_session(&state, &headers).await;
    envelope(refund_queries::list_refunds(&state, session.as_ref(), query).await)
}

pub async fn approve_refund(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
) -> Envelope<RefundRequest> {
    let session = resolve_session(&state, &headers).await;
    envelope(refund_commands::approve_refund(&state, session.as_ref(), &order_id).await)
}

pub async fn reject_refund(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<ReasonInput>,
) -> Envelope<RefundRequest> {
    let session = resolve_session(&state, &headers).await;
    envelope(
        refund_commands::reject_refund(&state, session.as_ref(), &order_id, input.reason).await,
    )
}

pub async fn retry_refund(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
) -> Envelope<RefundRequest> {
    let session = resolve_session(&state, &headers).await;
    envelope(refund_commands::retry_refund(&state, session.as_ref(), &order_id).await)
}

pub async fn bulk_process_refunds(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<BulkProcessInput>,
) -> Envelope<BulkOutcome> {
    let session = resolve_session(&state, &headers).await;
    envelope(
        refund_commands::bulk_process_refunds(
            &state,
            session.as_ref(),
            input.ids,
            input.approve,
            input.reason,
        )
        .await,
    )
}
