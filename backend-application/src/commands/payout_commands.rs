//! Payout lifecycle: organizer request, admin approval/rejection, transfer
//! confirmation and manual retry.
//!
//! Every status change goes through `transition_payout` with the status the
//! caller observed, so two admins racing on the same request cannot both win.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::dispatcher::{notify_admins, notify_best_effort};
use crate::dtos::{BulkFailure, BulkOutcome, PayoutRequestInput};
use crate::guard::{authorize, ORGANIZER, PAYOUT_PROCESSING};
use crate::{AppError, AppState};
use backend_domain::{
    normalize_ids,
    normalize_optional_text,
    BankDetails,
    FeeSchedule,
    NotificationMetadata,
    NotificationType,
    PayoutFailureKind,
    PayoutRequest,
    PayoutStatus,
    PayoutTransition,
    Session,
    TransferOutcome,
};

pub async fn request_payout(
    state: &AppState,
    session: Option<&Session>,
    input: PayoutRequestInput,
) -> Result<PayoutRequest, AppError> {
    let session = authorize(state, &ORGANIZER, session)?;
    let PayoutRequestInput {
        period_start,
        period_end,
        bank,
    } = input;
    validate_period(period_start, period_end, Utc::now())?;
    let bank = validate_bank_details(bank)?;

    if state
        .payout_repo
        .has_overlapping_payout(&session.user_id, period_start, period_end, None)
        .await?
    {
        return Err(AppError::Validation(
            "a payout already covers part of this period".to_string(),
        ));
    }

    let amount = state
        .order_repo
        .organizer_revenue(&session.user_id, period_start, period_end)
        .await?
        .round_dp(2);
    if amount <= rust_decimal::Decimal::ZERO {
        return Err(AppError::Validation(
            "no paid ticket sales in this period".to_string(),
        ));
    }

    let split = FeeSchedule::new(state.config.platform_fee_percent).split(amount);
    let payout = PayoutRequest::new(
        session.user_id.clone(),
        amount,
        split,
        period_start,
        period_end,
        bank,
        Utc::now(),
    );
    state.payout_repo.insert_payout(&payout).await?;
    state.metrics.record_payout_requested();
    info!(
        payout_id = %payout.id,
        organizer = %payout.organizer_id,
        amount = %payout.amount,
        "payout requested"
    );

    let organizer_name = state
        .directory
        .find_user(&payout.organizer_id)
        .await
        .ok()
        .flatten()
        .map(|user| user.name);
    notify_admins(
        state,
        NotificationType::PayoutRequested,
        NotificationMetadata {
            organizer_name,
            amount: Some(payout.amount),
            platform_fee: Some(payout.platform_fee),
            payout_id: Some(payout.id.clone()),
            ..Default::default()
        },
    )
    .await;
    Ok(payout)
}

/// Moves a PENDING payout to PROCESSING and asks the gateway for the transfer.
///
/// A transfer failure leaves the payout FAILED and retryable, and is
/// returned to the caller as `ExternalFailure`.
pub async fn approve_payout(
    state: &AppState,
    session: Option<&Session>,
    payout_id: &str,
) -> Result<PayoutRequest, AppError> {
    let session = authorize(state, &PAYOUT_PROCESSING, session)?;
    process_approval(state, &session.user_id, payout_id).await
}

async fn process_approval(
    state: &AppState,
    admin_id: &str,
    payout_id: &str,
) -> Result<PayoutRequest, AppError> {
    let current = load_payout(state, payout_id).await?;
    ensure_status(&current, PayoutStatus::Pending, "approved")?;

    let processing = state
        .payout_repo
        .transition_payout(payout_id, PayoutStatus::Pending, &PayoutTransition::processing())
        .await?
        .ok_or_else(|| concurrent_change(payout_id))?;
    info!(payout_id, admin = admin_id, "payout approved, starting transfer");

    let outcome = match state.transfer_gateway.send_payout(&processing).await {
        Ok(outcome) => outcome,
        Err(err) => TransferOutcome::Failed {
            reason: err.to_string(),
        },
    };

    match outcome {
        TransferOutcome::Completed { reference } => {
            complete_payout(state, payout_id, Some(reference)).await
        }
        TransferOutcome::Pending { reference } => {
            let updated = state
                .payout_repo
                .transition_payout(
                    payout_id,
                    PayoutStatus::Processing,
                    &PayoutTransition::awaiting_confirmation(reference),
                )
                .await?
                .ok_or_else(|| concurrent_change(payout_id))?;
            notify_best_effort(
                state,
                NotificationType::PayoutProcessing,
                &updated.organizer_id,
                payout_metadata(&updated),
            )
            .await;
            Ok(updated)
        }
        TransferOutcome::Failed { reason } => {
            fail_payout(state, payout_id, reason.clone()).await?;
            Err(AppError::ExternalFailure(format!(
                "payout transfer failed: {}",
                reason
            )))
        }
    }
}

pub async fn reject_payout(
    state: &AppState,
    session: Option<&Session>,
    payout_id: &str,
    reason: Option<String>,
) -> Result<PayoutRequest, AppError> {
    let session = authorize(state, &PAYOUT_PROCESSING, session)?;
    let reason = require_reason(reason)?;
    process_rejection(state, &session.user_id, payout_id, reason).await
}

async fn process_rejection(
    state: &AppState,
    admin_id: &str,
    payout_id: &str,
    reason: String,
) -> Result<PayoutRequest, AppError> {
    let current = load_payout(state, payout_id).await?;
    ensure_status(&current, PayoutStatus::Pending, "rejected")?;

    let transition = PayoutTransition::failed(PayoutFailureKind::Rejected, reason, Utc::now());
    let updated = state
        .payout_repo
        .transition_payout(payout_id, PayoutStatus::Pending, &transition)
        .await?
        .ok_or_else(|| concurrent_change(payout_id))?;
    info!(payout_id, admin = admin_id, "payout rejected");

    let mut metadata = payout_metadata(&updated);
    metadata.reason = updated.failure_reason.clone();
    notify_best_effort(
        state,
        NotificationType::PayoutRejected,
        &updated.organizer_id,
        metadata,
    )
    .await;
    Ok(updated)
}

/// Reopens a payout whose transfer failed so it can be approved again.
/// Rejected payouts stay final.
pub async fn retry_payout(
    state: &AppState,
    session: Option<&Session>,
    payout_id: &str,
) -> Result<PayoutRequest, AppError> {
    let session = authorize(state, &PAYOUT_PROCESSING, session)?;
    let current = load_payout(state, payout_id).await?;
    if !current.is_retryable() {
        return Err(AppError::InvalidState(format!(
            "payout '{}' is {} and cannot be retried",
            payout_id,
            current.status.as_str()
        )));
    }
    if state
        .payout_repo
        .has_overlapping_payout(
            &current.organizer_id,
            current.period_start,
            current.period_end,
            Some(payout_id),
        )
        .await?
    {
        return Err(AppError::InvalidState(format!(
            "payout '{}' overlaps another payout for the same period",
            payout_id
        )));
    }
    let reopened = state
        .payout_repo
        .transition_payout(payout_id, PayoutStatus::Failed, &PayoutTransition::reopened())
        .await?
        .ok_or_else(|| concurrent_change(payout_id))?;
    info!(payout_id, admin = %session.user_id, "payout reopened for retry");
    Ok(reopened)
}

/// Settles a transfer the gateway reported asynchronously.
///
/// Unknown codes are `NotFound`; a payout that already left PROCESSING is
/// returned unchanged so repeated webhook deliveries are harmless.
pub async fn confirm_transfer(
    state: &AppState,
    transfer_code: &str,
    success: bool,
    reason: Option<String>,
) -> Result<PayoutRequest, AppError> {
    let payout = state
        .payout_repo
        .find_payout_by_transfer_code(transfer_code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("transfer '{}'", transfer_code)))?;
    if payout.status != PayoutStatus::Processing {
        info!(
            payout_id = %payout.id,
            status = payout.status.as_str(),
            "transfer confirmation ignored, payout already settled"
        );
        return Ok(payout);
    }

    if success {
        complete_payout(state, &payout.id, None).await
    } else {
        let reason = normalize_optional_text(reason)
            .unwrap_or_else(|| "transfer was not completed by the bank".to_string());
        fail_payout(state, &payout.id, reason).await
    }
}

/// Approves or rejects each listed payout independently.
pub async fn bulk_process_payouts(
    state: &AppState,
    session: Option<&Session>,
    ids: Vec<String>,
    approve: bool,
    reason: Option<String>,
) -> Result<BulkOutcome, AppError> {
    let session = authorize(state, &PAYOUT_PROCESSING, session)?;
    let ids = normalize_ids(ids);
    if ids.is_empty() {
        return Err(AppError::Validation("no payouts selected".to_string()));
    }
    let reason = if approve { None } else { Some(require_reason(reason)?) };

    let mut outcome = BulkOutcome::default();
    for id in ids {
        let result = match &reason {
            None => process_approval(state, &session.user_id, &id).await,
            Some(reason) => process_rejection(state, &session.user_id, &id, reason.clone()).await,
        };
        match result {
            Ok(_) => outcome.processed_count += 1,
            Err(err) => {
                warn!(payout_id = %id, "bulk payout item failed: {}", err);
                outcome.failures.push(BulkFailure {
                    id,
                    reason: err.public_message(),
                });
            }
        }
    }
    Ok(outcome)
}

async fn complete_payout(
    state: &AppState,
    payout_id: &str,
    reference: Option<String>,
) -> Result<PayoutRequest, AppError> {
    let updated = state
        .payout_repo
        .transition_payout(
            payout_id,
            PayoutStatus::Processing,
            &PayoutTransition::completed(reference, Utc::now()),
        )
        .await?
        .ok_or_else(|| concurrent_change(payout_id))?;
    state.metrics.record_payout_completed();
    info!(payout_id, net_amount = %updated.net_amount, "payout completed");
    notify_best_effort(
        state,
        NotificationType::PaymentReceived,
        &updated.organizer_id,
        payout_metadata(&updated),
    )
    .await;
    Ok(updated)
}

async fn fail_payout(
    state: &AppState,
    payout_id: &str,
    reason: String,
) -> Result<PayoutRequest, AppError> {
    let updated = state
        .payout_repo
        .transition_payout(
            payout_id,
            PayoutStatus::Processing,
            &PayoutTransition::failed(PayoutFailureKind::Transfer, reason, Utc::now()),
        )
        .await?
        .ok_or_else(|| concurrent_change(payout_id))?;
    state.metrics.record_payout_failed();
    warn!(
        payout_id,
        reason = updated.failure_reason.as_deref().unwrap_or_default(),
        "payout transfer failed"
    );
    let mut metadata = payout_metadata(&updated);
    metadata.reason = updated.failure_reason.clone();
    notify_best_effort(
        state,
        NotificationType::PayoutFailed,
        &updated.organizer_id,
        metadata,
    )
    .await;
    Ok(updated)
}

async fn load_payout(state: &AppState, payout_id: &str) -> Result<PayoutRequest, AppError> {
    state
        .payout_repo
        .find_payout(payout_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("payout '{}'", payout_id)))
}

fn ensure_status(
    payout: &PayoutRequest,
    expected: PayoutStatus,
    verb: &str,
) -> Result<(), AppError> {
    if payout.status != expected {
        return Err(AppError::InvalidState(format!(
            "payout '{}' is {} and cannot be {}",
            payout.id,
            payout.status.as_str(),
            verb
        )));
    }
    Ok(())
}

fn concurrent_change(payout_id: &str) -> AppError {
    AppError::InvalidState(format!(
        "payout '{}' was changed by another request",
        payout_id
    ))
}

fn payout_metadata(payout: &PayoutRequest) -> NotificationMetadata {
    NotificationMetadata {
        amount: Some(payout.amount),
        payout_amount: Some(payout.net_amount),
        platform_fee: Some(payout.platform_fee),
        payout_id: Some(payout.id.clone()),
        transfer_code: payout.transfer_code.clone(),
        ..Default::default()
    }
}

fn require_reason(reason: Option<String>) -> Result<String, AppError> {
    normalize_optional_text(reason)
        .ok_or_else(|| AppError::Validation("a rejection reason is required".to_string()))
}

fn validate_period(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if start >= end {
        return Err(AppError::Validation(
            "period start must be before period end".to_string(),
        ));
    }
    if end > now {
        return Err(AppError::Validation(
            "payout period cannot end in the future".to_string(),
        ));
    }
    Ok(())
}

fn validate_bank_details(bank: BankDetails) -> Result<BankDetails, AppError> {
    let bank_account = bank.bank_account.trim().to_string();
    let bank_code = bank.bank_code.trim().to_string();
    let account_name = bank.account_name.trim().to_string();
    if bank_account.is_empty() || !bank_account.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "bank account must be a non-empty string of digits".to_string(),
        ));
    }
    if bank_code.is_empty() {
        return Err(AppError::Validation("bank code is required".to_string()));
    }
    if account_name.is_empty() {
        return Err(AppError::Validation("account name is required".to_string()));
    }
    Ok(BankDetails {
        bank_account,
        bank_code,
        account_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn reason_must_not_be_blank() {
        assert!(matches!(require_reason(None), Err(AppError::Validation(_))));
        assert!(matches!(
            require_reason(Some("   ".to_string())),
            Err(AppError::Validation(_))
        ));
        assert_eq!(
            require_reason(Some(" fraud suspected ".to_string())).unwrap(),
            "fraud suspected"
        );
    }

    #[test]
    fn period_must_be_ordered_and_in_the_past() {
        let now = Utc::now();
        let start = now - Duration::days(30);
        assert!(validate_period(start, now - Duration::days(1), now).is_ok());
        assert!(validate_period(start, start, now).is_err());
        assert!(validate_period(start, now + Duration::days(1), now).is_err());
    }

    #[test]
    fn bank_details_are_trimmed_and_checked() {
        let bank = validate_bank_details(BankDetails {
            bank_account: " 0123456789 ".to_string(),
            bank_code: "058".to_string(),
            account_name: " Ada Obi".to_string(),
        })
        .unwrap();
        assert_eq!(bank.bank_account, "0123456789");
        assert_eq!(bank.account_name, "Ada Obi");

        let bad = validate_bank_details(BankDetails {
            bank_account: "01234-567".to_string(),
            bank_code: "058".to_string(),
            account_name: "Ada Obi".to_string(),
        });
        assert!(matches!(bad, Err(AppError::Validation(_))));
    }
}
