use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info};

use crate::dispatcher::notify_best_effort;
use crate::dtos::{BulkDeleteOutcome, SubmitRatingInput};
use crate::guard::{authorize, AUTHENTICATED, REVIEW_MODERATION};
use crate::{AppError, AppState};
use backend_domain::{
    new_id,
    normalize_ids,
    normalize_optional_text,
    ModerationAction,
    NotificationMetadata,
    NotificationType,
    Rating,
    RatingView,
    Session,
    MAX_RATING,
    MIN_RATING,
};

const MAX_COMMENT_CHARS: usize = 2000;

/// Creates the caller's rating for an event, or updates it if one exists.
pub async fn submit_rating(
    state: &AppState,
    session: Option<&Session>,
    event_id: &str,
    input: SubmitRatingInput,
) -> Result<Rating, AppError> {
    let session = authorize(state, &AUTHENTICATED, session)?;
    let value = validate_rating_value(input.rating)?;
    let comment = normalize_optional_text(input.comment);
    if let Some(text) = comment.as_deref() {
        if text.chars().count() > MAX_COMMENT_CHARS {
            return Err(AppError::Validation(format!(
                "comment must be at most {} characters",
                MAX_COMMENT_CHARS
            )));
        }
    }

    let event = state
        .directory
        .find_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("event '{}'", event_id)))?;
    if !state
        .order_repo
        .has_paid_ticket(&session.user_id, &event.id)
        .await?
    {
        return Err(AppError::Forbidden(
            "only ticket holders can review this event".to_string(),
        ));
    }

    let now = Utc::now();
    let existing = state
        .rating_repo
        .find_user_rating(&session.user_id, &event.id)
        .await?;
    let is_new = existing.is_none();
    let rating = match existing {
        Some(mut rating) => {
            rating.rating = value;
            rating.comment = comment;
            rating.updated_at = now;
            rating
        }
        None => Rating {
            id: new_id(),
            event_id: event.id.clone(),
            user_id: session.user_id.clone(),
            rating: value,
            comment,
            flagged: false,
            hidden: false,
            created_at: now,
            updated_at: now,
        },
    };
    let stored = state.rating_repo.upsert_rating(&rating).await.map_err(|err| {
        error!("failed to save rating for event {}: {}", event.id, err);
        AppError::Internal(err)
    })?;

    if is_new && stored.id == rating.id {
        notify_best_effort(
            state,
            NotificationType::ReviewReceived,
            &event.organizer_id,
            NotificationMetadata {
                event_id: Some(event.id.clone()),
                event_title: Some(event.title.clone()),
                rating: Some(stored.rating),
                review_id: Some(stored.id.clone()),
                ..Default::default()
            },
        )
        .await;
    }
    Ok(stored)
}

pub async fn delete_own_rating(
    state: &AppState,
    session: Option<&Session>,
    rating_id: &str,
) -> Result<(), AppError> {
    let session = authorize(state, &AUTHENTICATED, session)?;
    let view = state
        .rating_repo
        .find_rating(rating_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("review '{}'", rating_id)))?;
    if view.rating.user_id != session.user_id {
        return Err(AppError::Forbidden(
            "reviews can only be deleted by their author".to_string(),
        ));
    }
    if !state.rating_repo.delete_rating(rating_id).await? {
        return Err(AppError::NotFound(format!("review '{}'", rating_id)));
    }
    Ok(())
}

pub async fn moderate_rating(
    state: &AppState,
    session: Option<&Session>,
    rating_id: &str,
    action: &str,
) -> Result<RatingView, AppError> {
    let session = authorize(state, &REVIEW_MODERATION, session)?;
    let action =
        ModerationAction::try_from(action).map_err(|err| AppError::Validation(err.to_string()))?;
    let current = state
        .rating_repo
        .find_rating(rating_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("review '{}'", rating_id)))?;

    let before = current.rating.moderation();
    let after = before.apply(action);
    let updated = state
        .rating_repo
        .set_moderation(rating_id, after, Utc::now())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("review '{}'", rating_id)))?;
    state.metrics.record_moderation();
    info!(
        review_id = rating_id,
        moderator = %session.user_id,
        action = action.as_str(),
        "review moderated"
    );

    if action == ModerationAction::Hide && !before.hidden {
        notify_best_effort(
            state,
            NotificationType::ReviewModerated,
            &updated.rating.user_id,
            NotificationMetadata {
                event_id: Some(updated.rating.event_id.clone()),
                event_title: Some(updated.event_title.clone()),
                review_id: Some(updated.rating.id.clone()),
                ..Default::default()
            },
        )
        .await;
    }
    Ok(updated)
}

pub async fn delete_rating(
    state: &AppState,
    session: Option<&Session>,
    rating_id: &str,
) -> Result<(), AppError> {
    let session = authorize(state, &REVIEW_MODERATION, session)?;
    if !state.rating_repo.delete_rating(rating_id).await? {
        return Err(AppError::NotFound(format!("review '{}'", rating_id)));
    }
    state.metrics.record_reviews_deleted(1);
    info!(review_id = rating_id, moderator = %session.user_id, "review deleted");
    Ok(())
}

/// Deletes every listed review that still exists; missing ids are skipped.
pub async fn bulk_delete_ratings(
    state: &AppState,
    session: Option<&Session>,
    ids: Vec<String>,
) -> Result<BulkDeleteOutcome, AppError> {
    let session = authorize(state, &REVIEW_MODERATION, session)?;
    let ids = normalize_ids(ids);
    if ids.is_empty() {
        return Err(AppError::Validation("no reviews selected".to_string()));
    }
    let deleted_count = state.rating_repo.delete_ratings(&ids).await?;
    state.metrics.record_reviews_deleted(deleted_count);
    info!(
        requested = ids.len(),
        deleted = deleted_count,
        moderator = %session.user_id,
        "reviews bulk deleted"
    );
    Ok(BulkDeleteOutcome { deleted_count })
}

fn validate_rating_value(value: Decimal) -> Result<Decimal, AppError> {
    let value = value.round_dp(1);
    if value < Decimal::from(MIN_RATING) || value > Decimal::from(MAX_RATING) {
        return Err(AppError::Validation(format!(
            "rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }
    Ok(value)
}
