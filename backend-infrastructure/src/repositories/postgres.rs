//! Postgres adapter for the repository ports.
//!
//! Queries are built at runtime; rows are read into `*Row` structs and then
//! converted into domain entities. Status transitions are conditional
//! `UPDATE ... WHERE status = $expected` statements.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, QueryBuilder};
use tracing::info;

use backend_domain::ports::{
    DirectoryRepository,
    NotificationRepository,
    OrderRepository,
    PayoutRepository,
    RatingRepository,
};
use backend_domain::{
    DbConfig,
    EventSummary,
    Notification,
    NotificationCategory,
    NotificationMetadata,
    NotificationPriority,
    NotificationStatus,
    NotificationType,
    Order,
    OrderStatus,
    Page,
    PageRequest,
    PayoutFailureKind,
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
    SubRole,
    UserContact,
};

const RATING_VIEW_COLUMNS: &str = "r.id, r.event_id, r.user_id, r.rating, r.comment, \
    r.flagged, r.hidden, r.created_at, r.updated_at, \
    u.name AS user_name, u.email AS user_email, e.title AS event_title, e.starts_at AS event_date";

const RATING_VIEW_FROM: &str =
    " FROM ratings r JOIN users u ON u.id = r.user_id JOIN events e ON e.id = r.event_id";

const PAYOUT_COLUMNS: &str = "id, organizer_id, amount, platform_fee, net_amount, status, \
    period_start, period_end, bank_account, bank_code, account_name, transfer_code, \
    failure_reason, failure_kind, created_at, processed_at";

const REFUND_SELECT: &str = "SELECT o.id AS order_id, o.total_amount, o.payment_reference, \
    o.refund_status, o.refund_reason, o.refund_admin_notes, o.refund_transfer_reference, \
    o.refund_failure_reason, o.refund_requested_at, o.refund_processed_at, \
    u.id AS buyer_id, u.name AS buyer_name, u.email AS buyer_email, \
    e.id AS event_id, e.title AS event_title, e.organizer_id \
    FROM orders o JOIN users u ON u.id = o.buyer_id JOIN events e ON e.id = o.event_id";

const NOTIFICATION_COLUMNS: &str = "id, user_id, type, title, message, status, priority, \
    category, requires_action, action_url, metadata, created_at, updated_at, read_at";

const USER_COLUMNS: &str = "id, name, email, role, sub_role";

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connects and applies the embedded migrations.
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| anyhow!("database_url is not configured"))?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await
            .context("failed to connect to postgres")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run migrations")?;
        info!("postgres connected, migrations applied");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RatingViewRow {
    id: String,
    event_id: String,
    user_id: String,
    rating: Decimal,
    comment: Option<String>,
    flagged: bool,
    hidden: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_name: String,
    user_email: String,
    event_title: String,
    event_date: DateTime<Utc>,
}

impl From<RatingViewRow> for RatingView {
    fn from(row: RatingViewRow) -> Self {
        RatingView {
            rating: Rating {
                id: row.id,
                event_id: row.event_id,
                user_id: row.user_id,
                rating: row.rating,
                comment: row.comment,
                flagged: row.flagged,
                hidden: row.hidden,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            user_name: row.user_name,
            user_email: row.user_email,
            event_title: row.event_title,
            event_date: row.event_date,
        }
    }
}

#[derive(Debug, FromRow)]
struct RatingRow {
    id: String,
    event_id: String,
    user_id: String,
    rating: Decimal,
    comment: Option<String>,
    flagged: bool,
    hidden: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Rating {
            id: row.id,
            event_id: row.event_id,
            user_id: row.user_id,
            rating: row.rating,
            comment: row.comment,
            flagged: row.flagged,
            hidden: row.hidden,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PayoutRow {
    id: String,
    organizer_id: String,
    amount: Decimal,
    platform_fee: Decimal,
    net_amount: Decimal,
    status: String,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    bank_account: String,
    bank_code: String,
    account_name: String,
    transfer_code: Option<String>,
    failure_reason: Option<String>,
    failure_kind: Option<String>,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl TryFrom<PayoutRow> for PayoutRequest {
    type Error = anyhow::Error;

    fn try_from(row: PayoutRow) -> Result<Self> {
        Ok(PayoutRequest {
            id: row.id,
            organizer_id: row.organizer_id,
            amount: row.amount,
            platform_fee: row.platform_fee,
            net_amount: row.net_amount,
            status: PayoutStatus::try_from(row.status.as_str())?,
            period_start: row.period_start,
            period_end: row.period_end,
            bank_account: row.bank_account,
            bank_code: row.bank_code,
            account_name: row.account_name,
            transfer_code: row.transfer_code,
            failure_reason: row.failure_reason,
            failure_kind: row
                .failure_kind
                .as_deref()
                .map(PayoutFailureKind::try_from)
                .transpose()?,
            created_at: row.created_at,
            processed_at: row.processed_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RefundRow {
    order_id: String,
    total_amount: Decimal,
    payment_reference: Option<String>,
    refund_status: String,
    refund_reason: Option<String>,
    refund_admin_notes: Option<String>,
    refund_transfer_reference: Option<String>,
    refund_failure_reason: Option<String>,
    refund_requested_at: Option<DateTime<Utc>>,
    refund_processed_at: Option<DateTime<Utc>>,
    buyer_id: String,
    buyer_name: String,
    buyer_email: String,
    event_id: String,
    event_title: String,
    organizer_id: String,
}

impl TryFrom<RefundRow> for RefundRequest {
    type Error = anyhow::Error;

    fn try_from(row: RefundRow) -> Result<Self> {
        let requested_at = row
            .refund_requested_at
            .ok_or_else(|| anyhow!("refund for order {} has no request time", row.order_id))?;
        Ok(RefundRequest {
            refund_status: RefundStatus::try_from(row.refund_status.as_str())?,
            order_id: row.order_id,
            total_amount: row.total_amount,
            payment_reference: row.payment_reference,
            request_reason: row.refund_reason,
            admin_notes: row.refund_admin_notes,
            transfer_reference: row.refund_transfer_reference,
            failure_reason: row.refund_failure_reason,
            requested_at,
            processed_at: row.refund_processed_at,
            buyer: RefundParty {
                id: row.buyer_id,
                name: row.buyer_name,
                email: row.buyer_email,
            },
            event: RefundEvent {
                id: row.event_id,
                title: row.event_title,
                organizer_id: row.organizer_id,
            },
        })
    }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: String,
    user_id: String,
    #[sqlx(rename = "type")]
    notification_type: String,
    title: String,
    message: String,
    status: String,
    priority: String,
    category: String,
    requires_action: bool,
    action_url: Option<String>,
    metadata: Json<NotificationMetadata>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = anyhow::Error;

    fn try_from(row: NotificationRow) -> Result<Self> {
        Ok(Notification {
            id: row.id,
            user_id: row.user_id,
            notification_type: NotificationType::try_from(row.notification_type.as_str())?,
            title: row.title,
            message: row.message,
            status: NotificationStatus::from(row.status.as_str()),
            priority: NotificationPriority::from(row.priority.as_str()),
            category: NotificationCategory::from(row.category.as_str()),
            requires_action: row.requires_action,
            action_url: row.action_url,
            metadata: row.metadata.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
            read_at: row.read_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    role: String,
    sub_role: Option<String>,
}

impl From<UserRow> for UserContact {
    fn from(row: UserRow) -> Self {
        UserContact {
            id: row.id,
            name: row.name,
            email: row.email,
            role: Role::from(row.role.as_str()),
            sub_role: row.sub_role.as_deref().and_then(SubRole::parse),
        }
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    buyer_id: String,
    event_id: String,
    total_amount: Decimal,
    status: String,
    payment_reference: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            buyer_id: row.buyer_id,
            event_id: row.event_id,
            total_amount: row.total_amount,
            status: OrderStatus::from(row.status.as_str()),
            payment_reference: row.payment_reference,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RatingTotalsRow {
    total: i64,
    sum: Decimal,
    this_month: i64,
    b1: i64,
    b2: i64,
    b3: i64,
    b4: i64,
    b5: i64,
}

fn push_rating_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &RatingFilter) {
    builder.push(" WHERE TRUE");
    if let Some(event_id) = &filter.event_id {
        builder.push(" AND r.event_id = ").push_bind(event_id.clone());
    }
    if let Some(bucket) = filter.rating_bucket {
        let lower = Decimal::from(bucket);
        builder
            .push(" AND r.rating >= ")
            .push_bind(lower)
            .push(" AND r.rating < ")
            .push_bind(lower + Decimal::ONE);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (u.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR r.comment ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn rating_order_by(sort: RatingSort) -> &'static str {
    match sort {
        RatingSort::Newest => " ORDER BY r.created_at DESC, r.id",
        RatingSort::Oldest => " ORDER BY r.created_at ASC, r.id",
        RatingSort::Highest => " ORDER BY r.rating DESC, r.created_at DESC, r.id",
        RatingSort::Lowest => " ORDER BY r.rating ASC, r.created_at DESC, r.id",
    }
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[async_trait]
impl RatingRepository for PostgresStore {
    async fn list_ratings(
        &self,
        filter: &RatingFilter,
        page: PageRequest,
    ) -> Result<Page<RatingView>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count.push(RATING_VIEW_FROM);
        push_rating_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {RATING_VIEW_COLUMNS}"));
        query.push(RATING_VIEW_FROM);
        push_rating_filter(&mut query, filter);
        query
            .push(rating_order_by(filter.sort_by))
            .push(" LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
        let rows: Vec<RatingViewRow> = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(Page::new(
            rows.into_iter().map(RatingView::from).collect(),
            to_u64(total),
            page,
        ))
    }

    async fn export_ratings(&self, filter: &RatingFilter) -> Result<Vec<RatingView>> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {RATING_VIEW_COLUMNS}"));
        query.push(RATING_VIEW_FROM);
        push_rating_filter(&mut query, filter);
        query.push(rating_order_by(filter.sort_by));
        let rows: Vec<RatingViewRow> = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(RatingView::from).collect())
    }

    async fn list_visible_event_ratings(
        &self,
        event_id: &str,
        page: PageRequest,
    ) -> Result<Page<RatingView>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM ratings WHERE event_id = $1 AND hidden = FALSE",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;
        let query = format!(
            "SELECT {RATING_VIEW_COLUMNS}{RATING_VIEW_FROM} \
             WHERE r.event_id = $1 AND r.hidden = FALSE \
             ORDER BY r.created_at DESC, r.id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, RatingViewRow>(&query)
            .bind(event_id)
            .bind(i64::from(page.limit))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        Ok(Page::new(
            rows.into_iter().map(RatingView::from).collect(),
            to_u64(total),
            page,
        ))
    }

    async fn rating_totals(&self, month_start: DateTime<Utc>) -> Result<RatingTotals> {
        let row = sqlx::query_as::<_, RatingTotalsRow>(
            "SELECT COUNT(*) AS total, \
                COALESCE(SUM(rating), 0) AS sum, \
                COUNT(*) FILTER (WHERE created_at >= $1) AS this_month, \
                COUNT(*) FILTER (WHERE rating < 2) AS b1, \
                COUNT(*) FILTER (WHERE rating >= 2 AND rating < 3) AS b2, \
                COUNT(*) FILTER (WHERE rating >= 3 AND rating < 4) AS b3, \
                COUNT(*) FILTER (WHERE rating >= 4 AND rating < 5) AS b4, \
                COUNT(*) FILTER (WHERE rating >= 5) AS b5 \
             FROM ratings",
        )
        .bind(month_start)
        .fetch_one(&self.pool)
        .await?;
        Ok(RatingTotals {
            total: to_u64(row.total),
            sum: row.sum,
            this_month: to_u64(row.this_month),
            buckets: [
                to_u64(row.b1),
                to_u64(row.b2),
                to_u64(row.b3),
                to_u64(row.b4),
                to_u64(row.b5),
            ],
        })
    }

    async fn find_rating(&self, id: &str) -> Result<Option<RatingView>> {
        let query = format!("SELECT {RATING_VIEW_COLUMNS}{RATING_VIEW_FROM} WHERE r.id = $1");
        let row = sqlx::query_as::<_, RatingViewRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(RatingView::from))
    }

    async fn find_user_rating(&self, user_id: &str, event_id: &str) -> Result<Option<Rating>> {
        let row = sqlx::query_as::<_, RatingRow>(
            "SELECT id, event_id, user_id, rating, comment, flagged, hidden, created_at, updated_at \
             FROM ratings WHERE user_id = $1 AND event_id = $2",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Rating::from))
    }

    async fn upsert_rating(&self, rating: &Rating) -> Result<Rating> {
        let row = sqlx::query_as::<_, RatingRow>(
            "INSERT INTO ratings \
                (id, event_id, user_id, rating, comment, flagged, hidden, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (user_id, event_id) DO UPDATE SET \
                rating = EXCLUDED.rating, \
                comment = EXCLUDED.comment, \
                updated_at = EXCLUDED.updated_at \
             RETURNING id, event_id, user_id, rating, comment, flagged, hidden, created_at, updated_at",
        )
        .bind(&rating.id)
        .bind(&rating.event_id)
        .bind(&rating.user_id)
        .bind(rating.rating)
        .bind(&rating.comment)
        .bind(rating.flagged)
        .bind(rating.hidden)
        .bind(rating.created_at)
        .bind(rating.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(Rating::from(row))
    }

    async fn set_moderation(
        &self,
        id: &str,
        moderation: ReviewModeration,
        at: DateTime<Utc>,
    ) -> Result<Option<RatingView>> {
        let updated = sqlx::query(
            "UPDATE ratings SET flagged = $2, hidden = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(moderation.flagged)
        .bind(moderation.hidden)
        .bind(at)
        .execute(&self.pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_rating(id).await
    }

    async fn delete_rating(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM ratings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_ratings(&self, ids: &[String]) -> Result<u64> {
        let result = sqlx::query("DELETE FROM ratings WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl PayoutRepository for PostgresStore {
    async fn insert_payout(&self, payout: &PayoutRequest) -> Result<()> {
        sqlx::query(
            "INSERT INTO payout_requests \
                (id, organizer_id, amount, platform_fee, net_amount, status, period_start, \
                 period_end, bank_account, bank_code, account_name, transfer_code, \
                 failure_reason, failure_kind, created_at, processed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(&payout.id)
        .bind(&payout.organizer_id)
        .bind(payout.amount)
        .bind(payout.platform_fee)
        .bind(payout.net_amount)
        .bind(payout.status.as_str())
        .bind(payout.period_start)
        .bind(payout.period_end)
        .bind(&payout.bank_account)
        .bind(&payout.bank_code)
        .bind(&payout.account_name)
        .bind(&payout.transfer_code)
        .bind(&payout.failure_reason)
        .bind(payout.failure_kind.map(|kind| kind.as_str()))
        .bind(payout.created_at)
        .bind(payout.processed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_payout(&self, id: &str) -> Result<Option<PayoutRequest>> {
        let query = format!("SELECT {PAYOUT_COLUMNS} FROM payout_requests WHERE id = $1");
        sqlx::query_as::<_, PayoutRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(PayoutRequest::try_from)
            .transpose()
    }

    async fn find_payout_by_transfer_code(&self, code: &str) -> Result<Option<PayoutRequest>> {
        let query = format!("SELECT {PAYOUT_COLUMNS} FROM payout_requests WHERE transfer_code = $1");
        sqlx::query_as::<_, PayoutRow>(&query)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .map(PayoutRequest::try_from)
            .transpose()
    }

    async fn list_payouts(
        &self,
        status: Option<PayoutStatus>,
        page: PageRequest,
    ) -> Result<Page<PayoutRequest>> {
        let status = status.map(|s| s.as_str());
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM payout_requests WHERE ($1::TEXT IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        let query = format!(
            "SELECT {PAYOUT_COLUMNS} FROM payout_requests \
             WHERE ($1::TEXT IS NULL OR status = $1) \
             ORDER BY created_at DESC, id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, PayoutRow>(&query)
            .bind(status)
            .bind(i64::from(page.limit))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        let items = rows
            .into_iter()
            .map(PayoutRequest::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, to_u64(total), page))
    }

    async fn list_organizer_payouts(&self, organizer_id: &str) -> Result<Vec<PayoutRequest>> {
        let query = format!(
            "SELECT {PAYOUT_COLUMNS} FROM payout_requests \
             WHERE organizer_id = $1 ORDER BY created_at DESC, id"
        );
        sqlx::query_as::<_, PayoutRow>(&query)
            .bind(organizer_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(PayoutRequest::try_from)
            .collect()
    }

    async fn has_overlapping_payout(
        &self,
        organizer_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM payout_requests \
             WHERE organizer_id = $1 \
               AND failure_kind IS DISTINCT FROM 'REJECTED' \
               AND ($4::TEXT IS NULL OR id <> $4) \
               AND period_start <= $3 AND $2 <= period_end)",
        )
        .bind(organizer_id)
        .bind(start)
        .bind(end)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn transition_payout(
        &self,
        id: &str,
        expected: PayoutStatus,
        transition: &PayoutTransition,
    ) -> Result<Option<PayoutRequest>> {
        let query = format!(
            "UPDATE payout_requests SET \
                status = $3, \
                transfer_code = COALESCE($4, transfer_code), \
                failure_reason = $5, \
                failure_kind = $6, \
                processed_at = $7 \
             WHERE id = $1 AND status = $2 \
             RETURNING {PAYOUT_COLUMNS}"
        );
        sqlx::query_as::<_, PayoutRow>(&query)
            .bind(id)
            .bind(expected.as_str())
            .bind(transition.to.as_str())
            .bind(&transition.transfer_code)
            .bind(&transition.failure_reason)
            .bind(transition.failure_kind.map(|kind| kind.as_str()))
            .bind(transition.processed_at)
            .fetch_optional(&self.pool)
            .await?
            .map(PayoutRequest::try_from)
            .transpose()
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    async fn find_order(&self, id: &str) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT id, buyer_id, event_id, total_amount, status, payment_reference, created_at \
             FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Order::from))
    }

    async fn has_paid_ticket(&self, user_id: &str, event_id: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM orders \
             WHERE buyer_id = $1 AND event_id = $2 AND status = 'PAID')",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn organizer_revenue(
        &self,
        organizer_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(o.total_amount), 0) FROM orders o \
             JOIN events e ON e.id = o.event_id \
             WHERE e.organizer_id = $1 AND o.status = 'PAID' \
               AND (o.refund_status IS NULL OR o.refund_status <> 'PROCESSED') \
               AND o.created_at >= $2 AND o.created_at <= $3",
        )
        .bind(organizer_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn open_refund(
        &self,
        order_id: &str,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Option<RefundRequest>> {
        let opened: Option<String> = sqlx::query_scalar(
            "UPDATE orders SET refund_status = 'INITIATED', refund_reason = $2, \
                refund_requested_at = $3 \
             WHERE id = $1 AND refund_status IS NULL \
             RETURNING id",
        )
        .bind(order_id)
        .bind(reason)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        match opened {
            Some(id) => self.find_refund(&id).await,
            None => Ok(None),
        }
    }

    async fn find_refund(&self, order_id: &str) -> Result<Option<RefundRequest>> {
        let query = format!("{REFUND_SELECT} WHERE o.id = $1 AND o.refund_status IS NOT NULL");
        sqlx::query_as::<_, RefundRow>(&query)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?
            .map(RefundRequest::try_from)
            .transpose()
    }

    async fn list_refunds(
        &self,
        status: Option<RefundStatus>,
        page: PageRequest,
    ) -> Result<Page<RefundRequest>> {
        let status = status.map(|s| s.as_str());
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE refund_status IS NOT NULL \
               AND ($1::TEXT IS NULL OR refund_status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        let query = format!(
            "{REFUND_SELECT} WHERE o.refund_status IS NOT NULL \
               AND ($1::TEXT IS NULL OR o.refund_status = $1) \
             ORDER BY o.refund_requested_at DESC, o.id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, RefundRow>(&query)
            .bind(status)
            .bind(i64::from(page.limit))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        let items = rows
            .into_iter()
            .map(RefundRequest::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, to_u64(total), page))
    }

    async fn transition_refund(
        &self,
        order_id: &str,
        expected: RefundStatus,
        transition: &RefundTransition,
    ) -> Result<Option<RefundRequest>> {
        let updated: Option<String> = sqlx::query_scalar(
            "UPDATE orders SET \
                refund_status = $3, \
                refund_admin_notes = COALESCE($4, refund_admin_notes), \
                refund_transfer_reference = COALESCE($5, refund_transfer_reference), \
                refund_failure_reason = $6, \
                refund_processed_at = $7 \
             WHERE id = $1 AND refund_status = $2 \
             RETURNING id",
        )
        .bind(order_id)
        .bind(expected.as_str())
        .bind(transition.to.as_str())
        .bind(&transition.admin_notes)
        .bind(&transition.transfer_reference)
        .bind(&transition.failure_reason)
        .bind(transition.processed_at)
        .fetch_optional(&self.pool)
        .await?;
        match updated {
            Some(id) => self.find_refund(&id).await,
            None => Ok(None),
        }
    }
}

#[async_trait]
impl NotificationRepository for PostgresStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            "INSERT INTO notifications \
                (id, user_id, type, title, message, status, priority, category, \
                 requires_action, action_url, metadata, created_at, updated_at, read_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(&notification.id)
        .bind(&notification.user_id)
        .bind(notification.notification_type.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.status.as_str())
        .bind(notification.priority.as_str())
        .bind(notification.category.as_str())
        .bind(notification.requires_action)
        .bind(&notification.action_url)
        .bind(Json(&notification.metadata))
        .bind(notification.created_at)
        .bind(notification.updated_at)
        .bind(notification.read_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Page<Notification>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE user_id = $1 AND (NOT $2 OR status = 'UNREAD')",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(&self.pool)
        .await?;
        let query = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE user_id = $1 AND (NOT $2 OR status = 'UNREAD') \
             ORDER BY created_at DESC, id LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, NotificationRow>(&query)
            .bind(user_id)
            .bind(unread_only)
            .bind(i64::from(page.limit))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        let items = rows
            .into_iter()
            .map(Notification::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, to_u64(total), page))
    }

    async fn unread_count(&self, user_id: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND status = 'UNREAD'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(to_u64(count))
    }

    async fn mark_read(
        &self,
        user_id: &str,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Notification>> {
        sqlx::query(
            "UPDATE notifications SET status = 'READ', read_at = $3, updated_at = $3 \
             WHERE id = $1 AND user_id = $2 AND status = 'UNREAD'",
        )
        .bind(id)
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        let query =
            format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, NotificationRow>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Notification::try_from)
            .transpose()
    }

    async fn mark_all_read(&self, user_id: &str, at: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET status = 'READ', read_at = $2, updated_at = $2 \
             WHERE user_id = $1 AND status = 'UNREAD'",
        )
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, user_id: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl DirectoryRepository for PostgresStore {
    async fn find_user(&self, id: &str) -> Result<Option<UserContact>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(UserContact::from))
    }

    async fn list_admins(&self) -> Result<Vec<UserContact>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE role = 'ADMIN' ORDER BY id");
        let rows = sqlx::query_as::<_, UserRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(UserContact::from).collect())
    }

    async fn find_event(&self, id: &str) -> Result<Option<EventSummary>> {
        let row: Option<(String, String, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, title, organizer_id, starts_at FROM events WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id, title, organizer_id, starts_at)| EventSummary {
            id,
            title,
            organizer_id,
            starts_at,
        }))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn rating_filter_binds_every_clause() {
        let filter = RatingFilter {
            search: Some("lagos".to_string()),
            rating_bucket: Some(4),
            event_id: Some("ev-1".to_string()),
            sort_by: RatingSort::Highest,
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        builder.push(RATING_VIEW_FROM);
        push_rating_filter(&mut builder, &filter);
        builder.push(rating_order_by(filter.sort_by));
        let sql = builder.sql();
        assert!(sql.contains("r.event_id = $1"));
        assert!(sql.contains("r.rating >= $2 AND r.rating < $3"));
        assert!(sql.contains("r.comment ILIKE $7"));
        assert!(sql.ends_with("ORDER BY r.rating DESC, r.created_at DESC, r.id"));
    }
}
