use async_trait::async_trait;

use crate::entities::{EmailMessage, PayoutRequest, RefundRequest, Session};

/// Result of asking the payment provider to move money.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed { reference: String },
    /// Accepted by the provider; the final result arrives through the webhook.
    Pending { reference: String },
    Failed { reason: String },
}

#[async_trait]
pub trait TransferGateway: Send + Sync {
    async fn send_payout(&self, payout: &PayoutRequest) -> anyhow::Result<TransferOutcome>;
    async fn refund_payment(&self, refund: &RefundRequest) -> anyhow::Result<TransferOutcome>;
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()>;
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Resolves a bearer token; `Ok(None)` means no valid session.
    async fn resolve(&self, token: &str) -> anyhow::Result<Option<Session>>;
}

#[async_trait]
pub trait HealthCheckService: Send + Sync {
    async fn check_database(&self) -> anyhow::Result<bool>;
}
