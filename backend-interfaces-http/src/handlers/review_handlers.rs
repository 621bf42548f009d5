use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};

use backend_application::commands::review_commands;
use backend_application::dtos::{
    BulkDeleteOutcome,
    BulkIdsInput,
    ModerateInput,
    PageQuery,
    RatingListQuery,
    ReviewExportQuery,
    SubmitRatingInput,
};
use backend_application::queries::review_queries;
use backend_application::AppState;
use backend_domain::{Page, Rating, RatingStats, RatingView};

use crate::error::HttpError;
use crate::handlers::{done, envelope, envelope_message, Envelope};
use crate::middleware::resolve_session;

pub async fn submit_rating(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
    axum::Json(input): axum::Json<SubmitRatingInput>,
) -> Envelope<Rating> {
    let session = resolve_session(&state, &headers).await;
    envelope_message(
        review_commands::submit_rating(&state, session.as_ref(), &event_id, input).await,
        "Review saved",
    )
}

pub async fn list_event_ratings(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Envelope<Page<RatingView>> {
    envelope(review_queries::list_event_ratings(&state, &event_id, query).await)
}

pub async fn delete_own_rating(
    State(state): State<AppState>,
    Path(rating_id): Path<String>,
    headers: HeaderMap,
) -> Envelope<()> {
    let session = resolve_session(&state, &headers).await;
    done(
        review_commands::delete_own_rating(&state, session.as_ref(), &rating_id).await,
        "Review deleted",
    )
}

pub async fn list_reviews(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RatingListQuery>,
) -> Envelope<Page<RatingView>> {
    let session = resolve_session(&state, &headers).await;
    envelope(review_queries::list_reviews(&state, session.as_ref(), query).await)
}

pub async fn review_stats(State(state): State<AppState>, headers: HeaderMap) -> Envelope<RatingStats> {
    let session = resolve_session(&state, &headers).await;
    envelope(review_queries::review_stats(&state, session.as_ref()).await)
}

/// Streams the export as a file download rather than inside the JSON envelope.
pub async fn export_reviews(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReviewExportQuery>,
) -> Result<Response, HttpError> {
    let session = resolve_session(&state, &headers).await;
    let export = review_queries::export_reviews(&state, session.as_ref(), query).await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(export.content_type),
    );
    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response_headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok((response_headers, export.body).into_response())
}

pub async fn bulk_delete_reviews(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Json(input): axum::Json<BulkIdsInput>,
) -> Envelope<BulkDeleteOutcome> {
    let session = resolve_session(&state, &headers).await;
    let result = review_commands::bulk_delete_ratings(&state, session.as_ref(), input.ids).await;
    let message = result
        .as_ref()
        .map(|outcome| format!("{} review(s) deleted", outcome.deleted_count))
        .unwrap_or_default();
    envelope_message(result, &message)
}

pub async fn moderate_review(
    State(state): State<AppState>,
    Path(rating_id): Path<String>,
    headers: HeaderMap,
    axum::Json(input): axum::Json<ModerateInput>,
) -> Envelope<RatingView> {
    let session = resolve_session(&state, &headers).await;
    envelope(
        review_commands::moderate_rating(&state, session.as_ref(), &rating_id, &input.action)
            .await,
    )
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path(rating_id): Path<String>,
    headers: HeaderMap,
) -> Envelope<()> {
    let session = resolve_session(&state, &headers).await;
    done(
        review_commands::delete_rating(&state, session.as_ref(), &rating_id).await,
        "Review deleted",
    )
}
