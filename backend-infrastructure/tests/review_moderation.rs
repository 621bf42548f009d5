mod common;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use backend_application::commands::review_commands;
use backend_application::dtos::{PageQuery, RatingListQuery, ReviewExportQuery, SubmitRatingInput};
use backend_application::queries::review_queries;
use backend_application::AppError;
use backend_domain::{NotificationType, Rating};
use common::{buyer, organizer, other_buyer, staff_admin, Harness, BUYER, EVENT, ORGANIZER, OTHER_BUYER};

async fn harness_with_tickets() -> Harness {
    let harness = Harness::new().await;
    let sold_at = Utc::now() - Duration::days(14);
    harness.paid_order("ord-1", BUYER, 12_000, sold_at).await;
    harness.paid_order("ord-2", OTHER_BUYER, 8_000, sold_at).await;
    harness
}

async fn review(harness: &Harness, who: common::SessionFn, stars: Decimal, comment: &str) -> Rating {
    review_commands::submit_rating(
        &harness.state,
        Some(&who()),
        EVENT,
        SubmitRatingInput {
            rating: stars,
            comment: Some(comment.to_string()),
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn hide_then_show_restores_the_comment() {
    let harness = harness_with_tickets().await;
    let state = &harness.state;
    let rating = review(&harness, buyer, Decimal::from(2), "original text").await;

    let hidden = review_commands::moderate_rating(state, Some(&staff_admin()), &rating.id, "hide")
        .await
        .unwrap();
    assert!(hidden.rating.hidden);
    assert_eq!(
        hidden.rating.display_comment().as_deref(),
        Some("[HIDDEN] original text")
    );
    assert_eq!(hidden.rating.comment.as_deref(), Some("original text"));

    let public = review_queries::list_event_ratings(state, EVENT, PageQuery::default())
        .await
        .unwrap();
    assert_eq!(public.total_count, 0);

    // Hiding twice keeps a single marker and notifies the author once.
    review_commands::moderate_rating(state, Some(&staff_admin()), &rating.id, "hide")
        .await
        .unwrap();
    let shown = review_commands::moderate_rating(state, Some(&staff_admin()), &rating.id, "show")
        .await
        .unwrap();
    assert_eq!(shown.rating.display_comment().as_deref(), Some("original text"));
    assert_eq!(
        harness
            .notifications_of_kind(BUYER, NotificationType::ReviewModerated)
            .await
            .len(),
        1
    );

    let public = review_queries::list_event_ratings(state, EVENT, PageQuery::default())
        .await
        .unwrap();
    assert_eq!(public.total_count, 1);
}

#[tokio::test]
async fn flagged_and_hidden_markers_are_ordered() {
    let harness = harness_with_tickets().await;
    let state = &harness.state;
    let rating = review(&harness, buyer, Decimal::from(1), "terrible sound").await;

    review_commands::moderate_rating(state, Some(&staff_admin()), &rating.id, "flag")
        .await
        .unwrap();
    let both = review_commands::moderate_rating(state, Some(&staff_admin()), &rating.id, "hide")
        .await
        .unwrap();
    assert_eq!(
        both.rating.display_comment().as_deref(),
        Some("[HIDDEN] [FLAGGED] terrible sound")
    );

    let err = review_commands::moderate_rating(state, Some(&staff_admin()), &rating.id, "approve")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let err = review_commands::moderate_rating(state, Some(&organizer()), &rating.id, "show")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn bulk_delete_counts_only_existing_reviews() {
    let harness = harness_with_tickets().await;
    let state = &harness.state;
    let first = review(&harness, buyer, Decimal::from(5), "great").await;
    let second = review(&harness, other_buyer, Decimal::from(4), "good").await;

    let outcome = review_commands::bulk_delete_ratings(
        state,
        Some(&staff_admin()),
        vec![
            first.id.clone(),
            second.id.clone(),
            first.id.clone(),
            "missing".to_string(),
        ],
    )
    .await
    .unwrap();
    assert_eq!(outcome.deleted_count, 2);

    let err = review_commands::bulk_delete_ratings(state, Some(&staff_admin()), vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let page = review_queries::list_reviews(state, Some(&staff_admin()), RatingListQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total_count, 0);
}

#[tokio::test]
async fn stats_cover_every_bucket() {
    let harness = harness_with_tickets().await;
    let state = &harness.state;
    review(&harness, buyer, Decimal::new(45, 1), "lovely").await;
    review(&harness, other_buyer, Decimal::from(3), "fine").await;

    let stats = review_queries::review_stats(state, Some(&staff_admin()))
        .await
        .unwrap();
    assert_eq!(stats.total_reviews, 2);
    assert_eq!(stats.average_rating, Decimal::new(38, 1));
    assert_eq!(stats.reviews_this_month, 2);
    assert_eq!(stats.rating_distribution.len(), 5);
    let counts: Vec<u64> = stats.rating_distribution.iter().map(|b| b.count).collect();
    assert_eq!(counts, vec![0, 0, 1, 1, 0]);
}

#[tokio::test]
async fn export_quotes_comments_and_follows_list_order() {
    let harness = harness_with_tickets().await;
    let state = &harness.state;
    review(&harness, buyer, Decimal::from(5), "Loud, \"amazing\" night").await;
    review(&harness, other_buyer, Decimal::from(2), "meh").await;

    let export = review_queries::export_reviews(
        state,
        Some(&staff_admin()),
        ReviewExportQuery {
            sort_by: Some("highest".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(export.content_type, "text/csv; charset=utf-8");
    assert!(export.filename.starts_with("reviews-"));
    assert!(export.filename.ends_with(".csv"));

    let lines: Vec<&str> = export.body.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "Review ID,User Name,User Email,Event Title,Event Date,Rating,Comment,Review Date"
    );
    assert!(lines[1].contains("\"Loud, \"\"amazing\"\" night\""));
    assert!(lines[2].contains(",meh,"));

    let err = review_queries::export_reviews(
        state,
        Some(&staff_admin()),
        ReviewExportQuery {
            format: Some("xlsx".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn only_ticket_holders_can_review() {
    let harness = Harness::new().await;
    let err = review_commands::submit_rating(
        &harness.state,
        Some(&buyer()),
        EVENT,
        SubmitRatingInput {
            rating: Decimal::from(4),
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = review_commands::submit_rating(
        &harness.state,
        None,
        EVENT,
        SubmitRatingInput {
            rating: Decimal::from(4),
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthenticated));
}

#[tokio::test]
async fn resubmitting_updates_the_existing_review() {
    let harness = harness_with_tickets().await;
    let first = review(&harness, buyer, Decimal::from(3), "ok").await;
    let second = review(&harness, buyer, Decimal::from(5), "grew on me").await;
    assert_eq!(first.id, second.id);
    assert_eq!(second.rating, Decimal::from(5));
    assert_eq!(
        harness
            .notifications_of_kind(ORGANIZER, NotificationType::ReviewReceived)
            .await
            .len(),
        1
    );

    let err = review_commands::delete_own_rating(&harness.state, Some(&other_buyer()), &first.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    review_commands::delete_own_rating(&harness.state, Some(&buyer()), &first.id)
        .await
        .unwrap();
}
