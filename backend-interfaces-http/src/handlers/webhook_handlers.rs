use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};

use backend_application::commands::payout_commands;
use backend_application::{ActionResult, AppState};
use backend_domain::PayoutRequest;

use crate::error::HttpError;
use crate::handlers::Envelope;
use crate::middleware::verify_webhook;

#[derive(Debug, Deserialize)]
pub struct TransferWebhook {
    pub event: String,
    #[serde(default)]
    pub data: TransferWebhookData,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransferWebhookData {
    pub transfer_code: Option<String>,
    pub reason: Option<String>,
}

/// Settles PROCESSING payouts from the provider's transfer events.
/// Unrelated event types are acknowledged and ignored.
pub async fn transfer_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Envelope<Option<PayoutRequest>> {
    if !verify_webhook(
        state.config.transfer_webhook_secret.as_deref(),
        &headers,
        &body,
    ) {
        warn!("transfer webhook rejected: bad or missing signature");
        return Err(HttpError::Unauthenticated(
            "invalid webhook signature".to_string(),
        ));
    }

    let payload: TransferWebhook = serde_json::from_slice(&body).map_err(|err| {
        warn!("failed to parse transfer webhook: {}", err);
        HttpError::BadRequest(format!("invalid webhook payload: {}", err))
    })?;

    let success = match payload.event.as_str() {
        "transfer.success" => true,
        "transfer.failed" | "transfer.reversed" => false,
        other => {
            info!(event = other, "transfer webhook ignored");
            return Ok(Json(ActionResult::ok_with_message(None, "event ignored")));
        }
    };
    let Some(code) = payload.data.transfer_code else {
        return Err(HttpError::BadRequest(
            "webhook payload has no transfer_code".to_string(),
        ));
    };

    let payout =
        payout_commands::confirm_transfer(&state, &code, success, payload.data.reason).await?;
    Ok(Json(ActionResult::ok(Some(payout))))
}
