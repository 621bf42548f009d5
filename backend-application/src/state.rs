use std::sync::Arc;

use backend_domain::ports::{
    DirectoryRepository,
    EmailSender,
    HealthCheckService,
    NotificationRepository,
    OrderRepository,
    PayoutRepository,
    RatingRepository,
    SessionProvider,
    TransferGateway,
};
use backend_domain::RuntimeConfig;

use crate::inflight::InFlight;
use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub rating_repo: Arc<dyn RatingRepository>,
    pub payout_repo: Arc<dyn PayoutRepository>,
    pub order_repo: Arc<dyn OrderRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub directory: Arc<dyn DirectoryRepository>,
    pub transfer_gateway: Arc<dyn TransferGateway>,
    pub email_sender: Arc<dyn EmailSender>,
    pub session_provider: Arc<dyn SessionProvider>,
    pub health_service: Arc<dyn HealthCheckService>,
    pub refunds_in_flight: Arc<InFlight>,
    pub metrics: Arc<Metrics>,
}
