use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use backend_application::inflight::InFlight;
use backend_application::{AppState, Metrics};
use backend_domain::ports::{
    DirectoryRepository,
    EmailSender,
    NotificationRepository,
    OrderRepository,
    PayoutRepository,
    RatingRepository,
    TransferGateway,
};
use backend_domain::StorageKind;
use backend_infrastructure::{
    AppConfig,
    DefaultHealthService,
    JwtSessionProvider,
    LogEmailSender,
    MemoryStore,
    OfflineTransferGateway,
    PaystackTransferGateway,
    PostgresStore,
    SmtpEmailSender,
};

const DEFAULT_JWT_SECRET: &str = "change-me";

pub struct AppContext {
    pub state: AppState,
}

struct Stores {
    ratings: Arc<dyn RatingRepository>,
    payouts: Arc<dyn PayoutRepository>,
    orders: Arc<dyn OrderRepository>,
    notifications: Arc<dyn NotificationRepository>,
    directory: Arc<dyn DirectoryRepository>,
}

impl Stores {
    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: RatingRepository
            + PayoutRepository
            + OrderRepository
            + NotificationRepository
            + DirectoryRepository
            + 'static,
    {
        Self {
            ratings: store.clone(),
            payouts: store.clone(),
            orders: store.clone(),
            notifications: store.clone(),
            directory: store,
        }
    }
}

impl AppContext {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();
        let db_config = config.to_db_config();

        let stores = match db_config.storage {
            StorageKind::Postgres => Stores::from_store(Arc::new(PostgresStore::connect(&db_config).await?)),
            StorageKind::Memory => {
                warn!("using in-memory storage, data is lost on restart");
                Stores::from_store(Arc::new(MemoryStore::new()))
            }
        };

        let transfer_gateway: Arc<dyn TransferGateway> = match config.transfer_config() {
            Some(transfer) => {
                info!(base_url = %transfer.base_url, "transfer gateway enabled");
                Arc::new(PaystackTransferGateway::new(transfer)?)
            }
            None => {
                warn!("no transfer secret key configured, transfers complete offline");
                Arc::new(OfflineTransferGateway::new())
            }
        };

        let email_sender: Arc<dyn EmailSender> = match config.smtp_config() {
            Some(smtp) => {
                info!(host = %smtp.host, port = smtp.port, "smtp delivery enabled");
                Arc::new(SmtpEmailSender::new(smtp)?)
            }
            None => {
                warn!("no smtp host configured, emails are logged only");
                Arc::new(LogEmailSender::new())
            }
        };

        if config.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("jwt_secret is the built-in default, set STAGEPASS_JWT_SECRET");
        }

        let state = AppState {
            config: runtime_config,
            rating_repo: stores.ratings,
            payout_repo: stores.payouts,
            order_repo: stores.orders,
            notification_repo: stores.notifications,
            health_service: Arc::new(DefaultHealthService::new(stores.directory.clone())),
            directory: stores.directory,
            transfer_gateway,
            email_sender,
            session_provider: Arc::new(JwtSessionProvider::new(&config.jwt_secret)),
            refunds_in_flight: Arc::new(InFlight::default()),
            metrics: Arc::new(Metrics::default()),
        };

        Ok(Self { state })
    }
}
