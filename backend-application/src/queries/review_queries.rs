use chrono::Local;
use tracing::info;

use crate::dtos::{PageQuery, RatingListQuery, ReviewExport, ReviewExportQuery};
use crate::guard::{authorize, REVIEW_MODERATION};
use crate::{AppError, AppState};
use backend_domain::{
    month_start_local,
    normalize_optional_text,
    render_reviews,
    ExportFormat,
    Page,
    PageRequest,
    RatingFilter,
    RatingSort,
    RatingStats,
    RatingView,
    Session,
    MAX_RATING,
    MIN_RATING,
};

pub async fn list_reviews(
    state: &AppState,
    session: Option<&Session>,
    query: RatingListQuery,
) -> Result<Page<RatingView>, AppError> {
    authorize(state, &REVIEW_MODERATION, session)?;
    let page = PageRequest::new(query.page, query.limit);
    let filter = build_filter(query)?;
    Ok(state.rating_repo.list_ratings(&filter, page).await?)
}

pub async fn review_stats(
    state: &AppState,
    session: Option<&Session>,
) -> Result<RatingStats, AppError> {
    authorize(state, &REVIEW_MODERATION, session)?;
    let totals = state
        .rating_repo
        .rating_totals(month_start_local(Local::now()))
        .await?;
    Ok(RatingStats::from(totals))
}

/// Renders every review matching the filter, in list order, as a download.
pub async fn export_reviews(
    state: &AppState,
    session: Option<&Session>,
    query: ReviewExportQuery,
) -> Result<ReviewExport, AppError> {
    let session = authorize(state, &REVIEW_MODERATION, session)?;
    let format = match query.format.as_deref() {
        Some(raw) => {
            ExportFormat::try_from(raw).map_err(|err| AppError::Validation(err.to_string()))?
        }
        None => ExportFormat::Csv,
    };
    let filter = build_filter(query.into())?;
    let rows = state.rating_repo.export_ratings(&filter).await?;
    let body = render_reviews(format, &rows)?;
    info!(rows = rows.len(), moderator = %session.user_id, "reviews exported");

    Ok(ReviewExport {
        content_type: format.content_type(),
        filename: format!(
            "reviews-{}.{}",
            Local::now().format("%Y-%m-%d"),
            format.extension()
        ),
        body,
    })
}

/// Public listing for an event page; hidden reviews are left out.
pub async fn list_event_ratings(
    state: &AppState,
    event_id: &str,
    query: PageQuery,
) -> Result<Page<RatingView>, AppError> {
    state
        .directory
        .find_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("event '{}'", event_id)))?;
    let page = PageRequest::new(query.page, query.limit);
    Ok(state
        .rating_repo
        .list_visible_event_ratings(event_id, page)
        .await?)
}

fn build_filter(query: RatingListQuery) -> Result<RatingFilter, AppError> {
    if let Some(bucket) = query.rating {
        if !(MIN_RATING..=MAX_RATING).contains(&bucket) {
            return Err(AppError::Validation(format!(
                "rating filter must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }
    }
    Ok(RatingFilter {
        search: normalize_optional_text(query.search),
        rating_bucket: query.rating,
        event_id: normalize_optional_text(query.event_id),
        sort_by: query
            .sort_by
            .as_deref()
            .map(RatingSort::from)
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_drops_blank_fields_and_parses_sort() {
        let filter = build_filter(RatingListQuery {
            search: Some("  ".to_string()),
            rating: Some(4),
            event_id: Some("ev-1".to_string()),
            sort_by: Some("highest".to_string()),
            page: None,
            limit: None,
        })
        .unwrap();
        assert_eq!(filter.search, None);
        assert_eq!(filter.rating_bucket, Some(4));
        assert_eq!(filter.event_id.as_deref(), Some("ev-1"));
        assert_eq!(filter.sort_by, RatingSort::Highest);
    }

    #[test]
    fn out_of_range_bucket_is_rejected() {
        let query = RatingListQuery {
            rating: Some(6),
            ..Default::default()
        };
        assert!(matches!(build_filter(query), Err(AppError::Validation(_))));
    }
}
