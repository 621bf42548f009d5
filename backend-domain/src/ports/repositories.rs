use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::entities::{
    EventSummary,
    Notification,
    Order,
    Page,
    PageRequest,
    PayoutRequest,
    PayoutTransition,
    Rating,
    RatingFilter,
    RatingView,
    RefundRequest,
    RefundTransition,
    UserContact,
};
use crate::services::RatingTotals;
use crate::value_objects::{PayoutStatus, RefundStatus, ReviewModeration};

#[async_trait]
pub trait RatingRepository: Send + Sync {
    async fn list_ratings(
        &self,
        filter: &RatingFilter,
        page: PageRequest,
    ) -> anyhow::Result<Page<RatingView>>;
    /// Same filtering and ordering as `list_ratings`, without pagination.
    async fn export_ratings(&self, filter: &RatingFilter) -> anyhow::Result<Vec<RatingView>>;
    async fn list_visible_event_ratings(
        &self,
        event_id: &str,
        page: PageRequest,
    ) -> anyhow::Result<Page<RatingView>>;
    async fn rating_totals(&self, month_start: DateTime<Utc>) -> anyhow::Result<RatingTotals>;
    async fn find_rating(&self, id: &str) -> anyhow::Result<Option<RatingView>>;
    async fn find_user_rating(&self, user_id: &str, event_id: &str) -> anyhow::Result<Option<Rating>>;
    /// One rating per (user, event): a second write updates the score and comment
    /// of the stored row and returns it.
    async fn upsert_rating(&self, rating: &Rating) -> anyhow::Result<Rating>;
    async fn set_moderation(
        &self,
        id: &str,
        moderation: ReviewModeration,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<RatingView>>;
    async fn delete_rating(&self, id: &str) -> anyhow::Result<bool>;
    /// Returns how many rows were actually removed.
    async fn delete_ratings(&self, ids: &[String]) -> anyhow::Result<u64>;
}

#[async_trait]
pub trait PayoutRepository: Send + Sync {
    async fn insert_payout(&self, payout: &PayoutRequest) -> anyhow::Result<()>;
    async fn find_payout(&self, id: &str) -> anyhow::Result<Option<PayoutRequest>>;
    async fn find_payout_by_transfer_code(&self, code: &str) -> anyhow::Result<Option<PayoutRequest>>;
    async fn list_payouts(
        &self,
        status: Option<PayoutStatus>,
        page: PageRequest,
    ) -> anyhow::Result<Page<PayoutRequest>>;
    async fn list_organizer_payouts(&self, organizer_id: &str) -> anyhow::Result<Vec<PayoutRequest>>;
    /// True when a payout other than `exclude_id` still claims part of the period.
    /// Only rejected payouts release their period; transfer failures can be retried.
    async fn has_overlapping_payout(
        &self,
        organizer_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> anyhow::Result<bool>;
    /// Compare-and-swap: applies the transition only while the row is still in
    /// `expected`. Returns `None` when the row is missing or has moved on.
    async fn transition_payout(
        &self,
        id: &str,
        expected: PayoutStatus,
        transition: &PayoutTransition,
    ) -> anyhow::Result<Option<PayoutRequest>>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_order(&self, id: &str) -> anyhow::Result<Option<Order>>;
    async fn has_paid_ticket(&self, user_id: &str, event_id: &str) -> anyhow::Result<bool>;
    /// Sum of paid, non-refunded orders for the organizer's events created in the period.
    async fn organizer_revenue(
        &self,
        organizer_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Decimal>;
    /// Opens a refund only if the order has none yet. Returns `None` otherwise.
    async fn open_refund(
        &self,
        order_id: &str,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<RefundRequest>>;
    async fn find_refund(&self, order_id: &str) -> anyhow::Result<Option<RefundRequest>>;
    async fn list_refunds(
        &self,
        status: Option<RefundStatus>,
        page: PageRequest,
    ) -> anyhow::Result<Page<RefundRequest>>;
    /// Compare-and-swap on the refund status, same contract as `transition_payout`.
    async fn transition_refund(
        &self,
        order_id: &str,
        expected: RefundStatus,
        transition: &RefundTransition,
    ) -> anyhow::Result<Option<RefundRequest>>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> anyhow::Result<()>;
    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        page: PageRequest,
    ) -> anyhow::Result<Page<Notification>>;
    async fn unread_count(&self, user_id: &str) -> anyhow::Result<u64>;
    /// Marks one of the user's notifications read. Already-read rows are returned untouched.
    async fn mark_read(
        &self,
        user_id: &str,
        id: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Notification>>;
    async fn mark_all_read(&self, user_id: &str, at: DateTime<Utc>) -> anyhow::Result<u64>;
    async fn delete_notification(&self, user_id: &str, id: &str) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn find_user(&self, id: &str) -> anyhow::Result<Option<UserContact>>;
    async fn list_admins(&self) -> anyhow::Result<Vec<UserContact>>;
    async fn find_event(&self, id: &str) -> anyhow::Result<Option<EventSummary>>;
    async fn ping(&self) -> anyhow::Result<()>;
}
