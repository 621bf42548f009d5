//! Money movement through the payment provider.
//!
//! Payouts create a transfer recipient and then a transfer; refunds reverse
//! the original payment by its reference. Amounts go over the wire in the
//! minor unit (kobo).

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use backend_domain::ports::{TransferGateway, TransferOutcome};
use backend_domain::{new_id, PayoutRequest, RefundRequest};

use crate::config::TransferConfig;

const CURRENCY: &str = "NGN";

#[derive(Debug, Deserialize)]
struct ProviderEnvelope {
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Value,
}

pub struct PaystackTransferGateway {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl PaystackTransferGateway {
    pub fn new(config: TransferConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(3)))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url,
            secret_key: config.secret_key,
        })
    }

    async fn post(&self, path: &str, body: Value) -> Result<ProviderEnvelope> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let envelope = response
            .json::<ProviderEnvelope>()
            .await
            .map_err(|err| anyhow!("provider responded {} with unreadable body: {}", status, err))?;
        if !status.is_success() && envelope.status {
            return Err(anyhow!("provider responded {}", status));
        }
        Ok(envelope)
    }

    async fn create_recipient(&self, payout: &PayoutRequest) -> Result<Result<String, String>> {
        let envelope = self
            .post(
                "/transferrecipient",
                json!({
                    "type": "nuban",
                    "name": payout.account_name,
                    "account_number": payout.bank_account,
                    "bank_code": payout.bank_code,
                    "currency": CURRENCY,
                }),
            )
            .await?;
        if !envelope.status {
            return Ok(Err(envelope.message));
        }
        envelope.data["recipient_code"]
            .as_str()
            .map(|code| Ok(code.to_string()))
            .ok_or_else(|| anyhow!("recipient response has no recipient_code"))
    }
}

#[async_trait]
impl TransferGateway for PaystackTransferGateway {
    async fn send_payout(&self, payout: &PayoutRequest) -> Result<TransferOutcome> {
        let recipient = match self.create_recipient(payout).await? {
            Ok(code) => code,
            Err(message) => {
                warn!(payout_id = %payout.id, "transfer recipient rejected: {}", message);
                return Ok(TransferOutcome::Failed { reason: message });
            }
        };
        let envelope = self
            .post(
                "/transfer",
                json!({
                    "source": "balance",
                    "amount": to_minor_units(payout.net_amount)?,
                    "recipient": recipient,
                    "reference": payout.id,
                    "reason": format!("Stagepass payout {}", payout.id),
                }),
            )
            .await?;
        if !envelope.status {
            return Ok(TransferOutcome::Failed {
                reason: envelope.message,
            });
        }
        let code = envelope.data["transfer_code"]
            .as_str()
            .ok_or_else(|| anyhow!("transfer response has no transfer_code"))?
            .to_string();
        let status = envelope.data["status"].as_str().unwrap_or("pending");
        info!(payout_id = %payout.id, transfer_code = %code, status, "transfer initiated");
        Ok(transfer_outcome(status, code, envelope.message))
    }

    async fn refund_payment(&self, refund: &RefundRequest) -> Result<TransferOutcome> {
        let Some(reference) = refund.payment_reference.as_deref() else {
            return Ok(TransferOutcome::Failed {
                reason: "order has no payment reference".to_string(),
            });
        };
        let envelope = self
            .post(
                "/refund",
                json!({
                    "transaction": reference,
                    "amount": to_minor_units(refund.total_amount)?,
                }),
            )
            .await?;
        if !envelope.status {
            return Ok(TransferOutcome::Failed {
                reason: envelope.message,
            });
        }
        let refund_reference = match &envelope.data["id"] {
            Value::Number(id) => id.to_string(),
            Value::String(id) => id.clone(),
            _ => reference.to_string(),
        };
        info!(order_id = %refund.order_id, refund_reference = %refund_reference, "refund accepted");
        Ok(TransferOutcome::Completed {
            reference: refund_reference,
        })
    }
}

/// Development gateway used when no provider key is configured: every
/// transfer succeeds immediately with a generated reference.
#[derive(Default)]
pub struct OfflineTransferGateway;

impl OfflineTransferGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransferGateway for OfflineTransferGateway {
    async fn send_payout(&self, payout: &PayoutRequest) -> Result<TransferOutcome> {
        let reference = format!("OFFLINE-TRF-{}", new_id());
        info!(payout_id = %payout.id, %reference, "offline payout transfer completed");
        Ok(TransferOutcome::Completed { reference })
    }

    async fn refund_payment(&self, refund: &RefundRequest) -> Result<TransferOutcome> {
        let reference = format!("OFFLINE-RFD-{}", new_id());
        info!(order_id = %refund.order_id, %reference, "offline refund completed");
        Ok(TransferOutcome::Completed { reference })
    }
}

fn transfer_outcome(status: &str, code: String, message: String) -> TransferOutcome {
    match status.to_lowercase().as_str() {
        "success" => TransferOutcome::Completed { reference: code },
        "failed" | "reversed" | "abandoned" | "blocked" | "rejected" => TransferOutcome::Failed {
            reason: if message.trim().is_empty() {
                format!("transfer {}", status)
            } else {
                message
            },
        },
        _ => TransferOutcome::Pending { reference: code },
    }
}

fn to_minor_units(amount: Decimal) -> Result<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| anyhow!("amount {} out of range", amount))
}
