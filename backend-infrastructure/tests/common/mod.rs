#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use backend_application::inflight::InFlight;
use backend_application::{AppState, Metrics};
use backend_domain::ports::{EmailSender, TransferGateway, TransferOutcome};
use backend_domain::{
    EmailMessage,
    EventSummary,
    Notification,
    NotificationType,
    Order,
    OrderStatus,
    PageRequest,
    PayoutRequest,
    RefundRequest,
    Role,
    RuntimeConfig,
    Session,
    SubRole,
    UserContact,
};
use backend_domain::ports::NotificationRepository;
use backend_infrastructure::{DefaultHealthService, JwtSessionProvider, MemoryStore};

pub const SUPER_ADMIN: &str = "admin-super";
pub const STAFF_ADMIN: &str = "admin-staff";
pub const ORGANIZER: &str = "org-1";
pub const BUYER: &str = "buyer-1";
pub const OTHER_BUYER: &str = "buyer-2";
pub const EVENT: &str = "ev-1";

/// Gateway that replays queued outcomes, then completes everything else.
#[derive(Default)]
pub struct ScriptedGateway {
    outcomes: Mutex<VecDeque<anyhow::Result<TransferOutcome>>>,
    calls: Mutex<u32>,
}

impl ScriptedGateway {
    pub fn push(&self, outcome: TransferOutcome) {
        self.outcomes.lock().unwrap().push_back(Ok(outcome));
    }

    pub fn push_error(&self, message: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Err(anyhow::anyhow!(message.to_string())));
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }

    fn next(&self, reference: String) -> anyhow::Result<TransferOutcome> {
        *self.calls.lock().unwrap() += 1;
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(TransferOutcome::Completed { reference }))
    }
}

#[async_trait]
impl TransferGateway for ScriptedGateway {
    async fn send_payout(&self, payout: &PayoutRequest) -> anyhow::Result<TransferOutcome> {
        self.next(format!("TRF_{}", payout.id))
    }

    async fn refund_payment(&self, refund: &RefundRequest) -> anyhow::Result<TransferOutcome> {
        self.next(format!("RFD_{}", refund.order_id))
    }
}

#[derive(Default)]
pub struct RecordingEmail {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail: Mutex<bool>,
}

impl RecordingEmail {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_all(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        if *self.fail.lock().unwrap() {
            anyhow::bail!("smtp unavailable");
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct Harness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<ScriptedGateway>,
    pub email: Arc<RecordingEmail>,
}

impl Harness {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(ScriptedGateway::default());
        let email = Arc::new(RecordingEmail::default());
        let state = AppState {
            config: RuntimeConfig::default(),
            rating_repo: store.clone(),
            payout_repo: store.clone(),
            order_repo: store.clone(),
            notification_repo: store.clone(),
            directory: store.clone(),
            transfer_gateway: gateway.clone(),
            email_sender: email.clone(),
            session_provider: Arc::new(JwtSessionProvider::new("test-secret")),
            health_service: Arc::new(DefaultHealthService::new(store.clone())),
            refunds_in_flight: Arc::new(InFlight::default()),
            metrics: Arc::new(Metrics::default()),
        };
        let harness = Self {
            state,
            store,
            gateway,
            email,
        };
        harness.seed_people().await;
        harness
    }

    async fn seed_people(&self) {
        let users = [
            (SUPER_ADMIN, "Ngozi Admin", Role::Admin, Some(SubRole::SuperAdmin)),
            (STAFF_ADMIN, "Sade Staff", Role::Admin, Some(SubRole::Staff)),
            (ORGANIZER, "Kunle Events", Role::Organizer, None),
            (BUYER, "Tolu Ade", Role::User, None),
            (OTHER_BUYER, "Chidi Eze", Role::User, None),
        ];
        for (id, name, role, sub_role) in users {
            self.store
                .insert_user(UserContact {
                    id: id.to_string(),
                    name: name.to_string(),
                    email: format!("{}@stagepass.test", id),
                    role,
                    sub_role,
                })
                .await;
        }
        self.store
            .insert_event(EventSummary {
                id: EVENT.to_string(),
                title: "Lagos Jazz Night".to_string(),
                organizer_id: ORGANIZER.to_string(),
                starts_at: Utc::now() - Duration::days(12),
            })
            .await;
    }

    pub async fn paid_order(
        &self,
        id: &str,
        buyer: &str,
        amount: i64,
        created_at: DateTime<Utc>,
    ) -> Order {
        let order = Order {
            id: id.to_string(),
            buyer_id: buyer.to_string(),
            event_id: EVENT.to_string(),
            total_amount: Decimal::from(amount),
            status: OrderStatus::Paid,
            payment_reference: Some(format!("PAY_{}", id)),
            created_at,
        };
        self.store.insert_order(order.clone()).await;
        order
    }

    pub async fn notifications_for(&self, user_id: &str) -> Vec<Notification> {
        self.store
            .list_notifications(user_id, false, PageRequest::new(Some(1), Some(100)))
            .await
            .unwrap()
            .items
    }

    pub async fn notifications_of_kind(
        &self,
        user_id: &str,
        kind: NotificationType,
    ) -> Vec<Notification> {
        self.notifications_for(user_id)
            .await
            .into_iter()
            .filter(|n| n.notification_type == kind)
            .collect()
    }
}

pub fn session(user_id: &str, role: Role, sub_role: Option<SubRole>) -> Session {
    Session {
        user_id: user_id.to_string(),
        role,
        sub_role,
    }
}

pub fn super_admin() -> Session {
    session(SUPER_ADMIN, Role::Admin, Some(SubRole::SuperAdmin))
}

pub fn staff_admin() -> Session {
    session(STAFF_ADMIN, Role::Admin, Some(SubRole::Staff))
}

pub fn organizer() -> Session {
    session(ORGANIZER, Role::Organizer, None)
}

pub fn buyer() -> Session {
    session(BUYER, Role::User, None)
}

pub fn other_buyer() -> Session {
    session(OTHER_BUYER, Role::User, None)
}

pub type SessionFn = fn() -> Session;
