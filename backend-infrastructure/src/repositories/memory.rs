//! In-process store backing every repository port.
//!
//! Used for `storage = "memory"` and by the workflow tests. Each operation
//! takes the lock once, so compare-and-swap transitions are atomic here the
//! same way a conditional `UPDATE` is atomic in Postgres.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use backend_domain::ports::{
    DirectoryRepository,
    NotificationRepository,
    OrderRepository,
    PayoutRepository,
    RatingRepository,
};
use backend_domain::{
    EventSummary,
    Notification,
    Order,
    OrderStatus,
    Page,
    PageRequest,
    PayoutRequest,
    PayoutStatus,
    PayoutTransition,
    Rating,
    RatingFilter,
    RatingSort,
    RatingTotals,
    RatingView,
    RefundEvent,
    RefundParty,
    RefundRequest,
    RefundStatus,
    RefundTransition,
    ReviewModeration,
    Role,
    UserContact,
};

#[derive(Debug, Clone)]
struct StoredRefund {
    status: RefundStatus,
    request_reason: Option<String>,
    admin_notes: Option<String>,
    transfer_reference: Option<String>,
    failure_reason: Option<String>,
    requested_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct StoredOrder {
    order: Order,
    refund: Option<StoredRefund>,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, UserContact>,
    events: HashMap<String, EventSummary>,
    orders: HashMap<String, StoredOrder>,
    ratings: HashMap<String, Rating>,
    payouts: HashMap<String, PayoutRequest>,
    notifications: HashMap<String, Notification>,
}

impl MemoryState {
    fn rating_view(&self, rating: &Rating) -> RatingView {
        let user = self.users.get(&rating.user_id);
        let event = self.events.get(&rating.event_id);
        RatingView {
            rating: rating.clone(),
            user_name: user.map(|u| u.name.clone()).unwrap_or_default(),
            user_email: user.map(|u| u.email.clone()).unwrap_or_default(),
            event_title: event.map(|e| e.title.clone()).unwrap_or_default(),
            event_date: event.map(|e| e.starts_at).unwrap_or(rating.created_at),
        }
    }

    fn filtered_views(&self, filter: &RatingFilter) -> Vec<RatingView> {
        let mut views: Vec<RatingView> = self
            .ratings
            .values()
            .map(|rating| self.rating_view(rating))
            .filter(|view| filter.matches(view))
            .collect();
        views.sort_by(|a, b| {
            filter
                .sort_by
                .compare(&a.rating, &b.rating)
                .then_with(|| a.rating.id.cmp(&b.rating.id))
        });
        views
    }

    fn refund_request(&self, stored: &StoredOrder) -> Option<RefundRequest> {
        let refund = stored.refund.as_ref()?;
        let order = &stored.order;
        let buyer = self.users.get(&order.buyer_id);
        let event = self.events.get(&order.event_id);
        Some(RefundRequest {
            order_id: order.id.clone(),
            total_amount: order.total_amount,
            payment_reference: order.payment_reference.clone(),
            refund_status: refund.status,
            request_reason: refund.request_reason.clone(),
            admin_notes: refund.admin_notes.clone(),
            transfer_reference: refund.transfer_reference.clone(),
            failure_reason: refund.failure_reason.clone(),
            requested_at: refund.requested_at,
            processed_at: refund.processed_at,
            buyer: RefundParty {
                id: order.buyer_id.clone(),
                name: buyer.map(|u| u.name.clone()).unwrap_or_default(),
                email: buyer.map(|u| u.email.clone()).unwrap_or_default(),
            },
            event: RefundEvent {
                id: order.event_id.clone(),
                title: event.map(|e| e.title.clone()).unwrap_or_default(),
                organizer_id: event.map(|e| e.organizer_id.clone()).unwrap_or_default(),
            },
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: UserContact) {
        self.state.write().await.users.insert(user.id.clone(), user);
    }

    pub async fn insert_event(&self, event: EventSummary) {
        self.state.write().await.events.insert(event.id.clone(), event);
    }

    pub async fn insert_order(&self, order: Order) {
        self.state
            .write()
            .await
            .orders
            .insert(order.id.clone(), StoredOrder { order, refund: None });
    }
}

#[async_trait]
impl RatingRepository for MemoryStore {
    async fn list_ratings(
        &self,
        filter: &RatingFilter,
        page: PageRequest,
    ) -> anyhow::Result<Page<RatingView>> {
        let state = self.state.read().await;
        Ok(page.slice(&state.filtered_views(filter)))
    }

    async fn export_ratings(&self, filter: &RatingFilter) -> anyhow::Result<Vec<RatingView>> {
        Ok(self.state.read().await.filtered_views(filter))
    }

    async fn list_visible_event_ratings(
        &self,
        event_id: &str,
        page: PageRequest,
    ) -> anyhow::Result<Page<RatingView>> {
        let state = self.state.read().await;
        let mut views: Vec<RatingView> = state
            .ratings
            .values()
            .filter(|rating| rating.event_id == event_id && !rating.hidden)
            .map(|rating| state.rating_view(rating))
            .collect();
        views.sort_by(|a, b| RatingSort::Newest.compare(&a.rating, &b.rating));
        Ok(page.slice(&views))
    }

    async fn rating_totals(&self, month_start: DateTime<Utc>) -> anyhow::Result<RatingTotals> {
        let state = self.state.read().await;
        Ok(RatingTotals::from_ratings(state.ratings.values(), month_start))
    }

    async fn find_rating(&self, id: &str) -> anyhow::Result<Option<RatingView>> {
        let state = self.state.read().await;
        Ok(state.ratings.get(id).map(|rating| state.rating_view(rating)))
    }

    async fn find_user_rating(
        &self,
        user_id: &str,
        event_id: &str,
    ) -> anyhow::Result<Option<Rating>> {
        let state = self.state.read().await;
        Ok(state
            .ratings
            .values()
            .find(|rating| rating.user_id == user_id && rating.event_id == event_id)
            .cloned())
    }

    async fn upsert_rating(&self, rating: &Rating) -> anyhow::Result<Rating> {
        let mut state = self.state.write().await;
        let existing = state
            .ratings
            .values_mut()
            .find(|stored| stored.user_id == rating.user_id && stored.event_id == rating.event_id);
        if let Some(stored) = existing {
            stored.rating = rating.rating;
            stored.comment = rating.comment.clone();
            stored.updated_at = rating.updated_at;
            return Ok(stored.clone());
        }
        state.ratings.insert(rating.id.clone(), rating.clone());
        Ok(rating.clone())
    }

    async fn set_moderation(
        &self,
        id: &str,
        moderation: ReviewModeration,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<RatingView>> {
        let mut state = self.state.write().await;
        let Some(rating) = state.ratings.get_mut(id) else {
            return Ok(None);
        };
        rating.set_moderation(moderation);
        rating.updated_at = at;
        let rating = rating.clone();
        Ok(Some(state.rating_view(&rating)))
    }

    async fn delete_rating(&self, id: &str) -> anyhow::Result<bool> {
        Ok(self.state.write().await.ratings.remove(id).is_some())
    }

    async fn delete_ratings(&self, ids: &[String]) -> anyhow::Result<u64> {
        let mut state = self.state.write().await;
        let removed = ids
            .iter()
            .filter(|id| state.ratings.remove(id.as_str()).is_some())
            .count();
        Ok(removed as u64)
    }
}

#[async_trait]
impl PayoutRepository for MemoryStore {
    async fn insert_payout(&self, payout: &PayoutRequest) -> anyhow::Result<()> {
        self.state
            .write()
            .await
            .payouts
            .insert(payout.id.clone(), payout.clone());
        Ok(())
    }

    async fn find_payout(&self, id: &str) -> anyhow::Result<Option<PayoutRequest>> {
        Ok(self.state.read().await.payouts.get(id).cloned())
    }

    async fn find_payout_by_transfer_code(
        &self,
        code: &str,
    ) -> anyhow::Result<Option<PayoutRequest>> {
        let state = self.state.read().await;
        Ok(state
            .payouts
            .values()
            .find(|payout| payout.transfer_code.as_deref() == Some(code))
            .cloned())
    }

    async fn list_payouts(
        &self,
        status: Option<PayoutStatus>,
        page: PageRequest,
    ) -> anyhow::Result<Page<PayoutRequest>> {
        let state = self.state.read().await;
        let mut rows: Vec<PayoutRequest> = state
            .payouts
            .values()
            .filter(|payout| status.map_or(true, |s| payout.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(page.slice(&rows))
    }

    async fn list_organizer_payouts(
        &self,
        organizer_id: &str,
    ) -> anyhow::Result<Vec<PayoutRequest>> {
        let state = self.state.read().await;
        let mut rows: Vec<PayoutRequest> = state
            .payouts
            .values()
            .filter(|payout| payout.organizer_id == organizer_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn has_overlapping_payout(
        &self,
        organizer_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> anyhow::Result<bool> {
        let state = self.state.read().await;
        Ok(state.payouts.values().any(|payout| {
            payout.organizer_id == organizer_id
                && Some(payout.id.as_str()) != exclude_id
                && payout.claims_period()
                && payout.overlaps(start, end)
        }))
    }

    async fn transition_payout(
        &self,
        id: &str,
        expected: PayoutStatus,
        transition: &PayoutTransition,
    ) -> anyhow::Result<Option<PayoutRequest>> {
        let mut state = self.state.write().await;
        match state.payouts.get_mut(id) {
            Some(payout) if payout.status == expected => {
                payout.apply(transition);
                Ok(Some(payout.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn find_order(&self, id: &str) -> anyhow::Result<Option<Order>> {
        Ok(self
            .state
            .read()
            .await
            .orders
            .get(id)
            .map(|stored| stored.order.clone()))
    }

    async fn has_paid_ticket(&self, user_id: &str, event_id: &str) -> anyhow::Result<bool> {
        let state = self.state.read().await;
        Ok(state.orders.values().any(|stored| {
            stored.order.buyer_id == user_id
                && stored.order.event_id == event_id
                && stored.order.status == OrderStatus::Paid
        }))
    }

    async fn organizer_revenue(
        &self,
        organizer_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Decimal> {
        let state = self.state.read().await;
        let total = state
            .orders
            .values()
            .filter(|stored| {
                let order = &stored.order;
                let owned = state
                    .events
                    .get(&order.event_id)
                    .map(|event| event.organizer_id == organizer_id)
                    .unwrap_or(false);
                let refunded = stored
                    .refund
                    .as_ref()
                    .map(|refund| refund.status == RefundStatus::Processed)
                    .unwrap_or(false);
                owned
                    && !refunded
                    && order.status == OrderStatus::Paid
                    && order.created_at >= start
                    && order.created_at <= end
            })
            .map(|stored| stored.order.total_amount)
            .sum();
        Ok(total)
    }

    async fn open_refund(
        &self,
        order_id: &str,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<RefundRequest>> {
        let mut state = self.state.write().await;
        let Some(stored) = state.orders.get_mut(order_id) else {
            return Ok(None);
        };
        if stored.refund.is_some() {
            return Ok(None);
        }
        stored.refund = Some(StoredRefund {
            status: RefundStatus::Initiated,
            request_reason: reason,
            admin_notes: None,
            transfer_reference: None,
            failure_reason: None,
            requested_at: at,
            processed_at: None,
        });
        let stored = stored.clone();
        Ok(state.refund_request(&stored))
    }

    async fn find_refund(&self, order_id: &str) -> anyhow::Result<Option<RefundRequest>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .get(order_id)
            .and_then(|stored| state.refund_request(stored)))
    }

    async fn list_refunds(
        &self,
        status: Option<RefundStatus>,
        page: PageRequest,
    ) -> anyhow::Result<Page<RefundRequest>> {
        let state = self.state.read().await;
        let mut rows: Vec<RefundRequest> = state
            .orders
            .values()
            .filter_map(|stored| state.refund_request(stored))
            .filter(|refund| status.map_or(true, |s| refund.refund_status == s))
            .collect();
        rows.sort_by(|a, b| {
            b.requested_at
                .cmp(&a.requested_at)
                .then_with(|| a.order_id.cmp(&b.order_id))
        });
        Ok(page.slice(&rows))
    }

    async fn transition_refund(
        &self,
        order_id: &str,
        expected: RefundStatus,
        transition: &RefundTransition,
    ) -> anyhow::Result<Option<RefundRequest>> {
        let mut state = self.state.write().await;
        let Some(stored) = state.orders.get_mut(order_id) else {
            return Ok(None);
        };
        let Some(refund) = stored.refund.as_mut() else {
            return Ok(None);
        };
        if refund.status != expected {
            return Ok(None);
        }
        refund.status = transition.to;
        if let Some(notes) = &transition.admin_notes {
            refund.admin_notes = Some(notes.clone());
        }
        if let Some(reference) = &transition.transfer_reference {
            refund.transfer_reference = Some(reference.clone());
        }
        refund.failure_reason = transition.failure_reason.clone();
        refund.processed_at = transition.processed_at;
        let stored = stored.clone();
        Ok(state.refund_request(&stored))
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> anyhow::Result<()> {
        self.state
            .write()
            .await
            .notifications
            .insert(notification.id.clone(), notification.clone());
        Ok(())
    }

    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        page: PageRequest,
    ) -> anyhow::Result<Page<Notification>> {
        let state = self.state.read().await;
        let mut rows: Vec<Notification> = state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(page.slice(&rows))
    }

    async fn unread_count(&self, user_id: &str) -> anyhow::Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read())
            .count() as u64)
    }

    async fn mark_read(
        &self,
        user_id: &str,
        id: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Notification>> {
        let mut state = self.state.write().await;
        match state.notifications.get_mut(id) {
            Some(notification) if notification.user_id == user_id => {
                notification.mark_read(at);
                Ok(Some(notification.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn mark_all_read(&self, user_id: &str, at: DateTime<Utc>) -> anyhow::Result<u64> {
        let mut state = self.state.write().await;
        let updated = state
            .notifications
            .values_mut()
            .filter(|n| n.user_id == user_id)
            .map(|n| n.mark_read(at))
            .filter(|changed| *changed)
            .count();
        Ok(updated as u64)
    }

    async fn delete_notification(&self, user_id: &str, id: &str) -> anyhow::Result<bool> {
        let mut state = self.state.write().await;
        let owned = state
            .notifications
            .get(id)
            .map(|n| n.user_id == user_id)
            .unwrap_or(false);
        if !owned {
            return Ok(false);
        }
        Ok(state.notifications.remove(id).is_some())
    }
}

#[async_trait]
impl DirectoryRepository for MemoryStore {
    async fn find_user(&self, id: &str) -> anyhow::Result<Option<UserContact>> {
        Ok(self.state.read().await.users.get(id).cloned())
    }

    async fn list_admins(&self) -> anyhow::Result<Vec<UserContact>> {
        let state = self.state.read().await;
        let mut admins: Vec<UserContact> = state
            .users
            .values()
            .filter(|user| user.role == Role::Admin)
            .cloned()
            .collect();
        admins.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(admins)
    }

    async fn find_event(&self, id: &str) -> anyhow::Result<Option<EventSummary>> {
        Ok(self.state.read().await.events.get(id).cloned())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_domain::{BankDetails, FeeSchedule, PayoutFailureKind};
    use chrono::Duration;

    fn payout(organizer: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> PayoutRequest {
        let amount = Decimal::from(10_000);
        PayoutRequest::new(
            organizer.to_string(),
            amount,
            FeeSchedule::new(Decimal::from(5)).split(amount),
            start,
            end,
            BankDetails {
                bank_account: "0123456789".to_string(),
                bank_code: "058".to_string(),
                account_name: "Ada Obi".to_string(),
            },
            end,
        )
    }

    #[tokio::test]
    async fn transition_only_applies_from_expected_status() {
        let store = MemoryStore::new();
        let end = Utc::now();
        let request = payout("org-1", end - Duration::days(30), end);
        store.insert_payout(&request).await.unwrap();

        let first = store
            .transition_payout(&request.id, PayoutStatus::Pending, &PayoutTransition::processing())
            .await
            .unwrap();
        assert_eq!(first.map(|p| p.status), Some(PayoutStatus::Processing));

        let second = store
            .transition_payout(&request.id, PayoutStatus::Pending, &PayoutTransition::processing())
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn only_rejected_payouts_release_their_period() {
        let store = MemoryStore::new();
        let end = Utc::now();
        let start = end - Duration::days(30);
        let transfer_failed = payout("org-1", start, end);
        store.insert_payout(&transfer_failed).await.unwrap();
        assert!(store.has_overlapping_payout("org-1", start, end, None).await.unwrap());
        assert!(!store.has_overlapping_payout("org-2", start, end, None).await.unwrap());
        assert!(!store
            .has_overlapping_payout("org-1", start, end, Some(transfer_failed.id.as_str()))
            .await
            .unwrap());

        store
            .transition_payout(
                &transfer_failed.id,
                PayoutStatus::Pending,
                &PayoutTransition::failed(PayoutFailureKind::Transfer, "timeout".to_string(), end),
            )
            .await
            .unwrap();
        assert!(store.has_overlapping_payout("org-1", start, end, None).await.unwrap());

        let rejected = payout("org-2", start, end);
        store.insert_payout(&rejected).await.unwrap();
        store
            .transition_payout(
                &rejected.id,
                PayoutStatus::Pending,
                &PayoutTransition::failed(PayoutFailureKind::Rejected, "dup".to_string(), end),
            )
            .await
            .unwrap();
        assert!(!store.has_overlapping_payout("org-2", start, end, None).await.unwrap());
    }

    fn rating(id: &str, score: i64, comment: &str) -> Rating {
        let at = Utc::now();
        Rating {
            id: id.to_string(),
            event_id: "ev-1".to_string(),
            user_id: "buyer-1".to_string(),
            rating: Decimal::from(score),
            comment: Some(comment.to_string()),
            flagged: false,
            hidden: true,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn racing_first_ratings_collapse_into_one_row() {
        let store = MemoryStore::new();
        let first = store.upsert_rating(&rating("r-1", 3, "ok")).await.unwrap();
        let second = store.upsert_rating(&rating("r-2", 5, "great")).await.unwrap();

        assert_eq!(first.id, "r-1");
        assert_eq!(second.id, "r-1");
        assert_eq!(second.rating, Decimal::from(5));
        assert_eq!(second.comment.as_deref(), Some("great"));
        assert!(second.hidden);
        assert_eq!(store.state.read().await.ratings.len(), 1);
    }
}
