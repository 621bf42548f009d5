use axum::routing::{delete, get, post};
use axum::Router;

use backend_application::AppState;

use crate::handlers::{
    notification_handlers,
    ops_handlers,
    payout_handlers,
    refund_handlers,
    review_handlers,
    webhook_handlers,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Ratings, user side
        .route(
            "/v1/events/:event_id/ratings",
            post(review_handlers::submit_rating).get(review_handlers::list_event_ratings),
        )
        .route("/v1/ratings/:id", delete(review_handlers::delete_own_rating))
        // Review moderation
        .route("/v1/admin/reviews", get(review_handlers::list_reviews))
        .route("/v1/admin/reviews/stats", get(review_handlers::review_stats))
        .route("/v1/admin/reviews/export", get(review_handlers::export_reviews))
        .route(
            "/v1/admin/reviews/bulk-delete",
            post(review_handlers::bulk_delete_reviews),
        )
        .route(
            "/v1/admin/reviews/:id/moderate",
            post(review_handlers::moderate_review),
        )
        .route("/v1/admin/reviews/:id", delete(review_handlers::delete_review))
        // Payouts
        .route(
            "/v1/organizer/payouts",
            post(payout_handlers::request_payout).get(payout_handlers::list_organizer_payouts),
        )
        .route("/v1/admin/payouts", get(payout_handlers::list_payouts))
        .route(
            "/v1/admin/payouts/bulk",
            post(payout_handlers::bulk_process_payouts),
        )
        .route(
            "/v1/admin/payouts/:id/approve",
            post(payout_handlers::approve_payout),
        )
        .route(
            "/v1/admin/payouts/:id/reject",
            post(payout_handlers::reject_payout),
        )
        .route(
            "/v1/admin/payouts/:id/retry",
            post(payout_handlers::retry_payout),
        )
        // Refunds
        .route(
            "/v1/orders/:order_id/refund",
            post(refund_handlers::request_refund),
        )
        .route("/v1/admin/refunds", get(refund_handlers::list_refunds))
        .route(
            "/v1/admin/refunds/bulk",
            post(refund_handlers::bulk_process_refunds),
        )
        .route(
            "/v1/admin/refunds/:order_id/approve",
            post(refund_handlers::approve_refund),
        )
        .route(
            "/v1/admin/refunds/:order_id/reject",
            post(refund_handlers::reject_refund),
        )
        .route(
            "/v1/admin/refunds/:order_id/retry",
            post(refund_handlers::retry_refund),
        )
        // Notifications
        .route(
            "/v1/notifications",
            get(notification_handlers::list_notifications),
        )
        .route(
            "/v1/notifications/unread-count",
            get(notification_handlers::unread_count),
        )
        .route(
            "/v1/notifications/read-all",
            post(notification_handlers::mark_all_read),
        )
        .route(
            "/v1/notifications/:id/read",
            post(notification_handlers::mark_read),
        )
        .route(
            "/v1/notifications/:id",
            delete(notification_handlers::delete_notification),
        )
        // Provider callbacks
        .route(
            "/v1/webhooks/transfers",
            post(webhook_handlers::transfer_webhook),
        )
        // Ops
        .route("/v1/ops/health/live", get(ops_handlers::health_live))
        .route("/v1/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/v1/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
