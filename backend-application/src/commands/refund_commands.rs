//! Refund lifecycle on top of an order's refund sub-state.
//!
//! INITIATED is the only state that accepts admin action. Approval holds an
//! in-flight claim on the order for the whole gateway call, then settles
//! with a compare-and-swap on INITIATED.

use chrono::Utc;
use tracing::{info, warn};

use crate::dispatcher::{notify_admins, notify_best_effort};
use crate::dtos::{BulkFailure, BulkOutcome};
use crate::guard::{authorize, AUTHENTICATED, REFUND_PROCESSING};
use crate::{AppError, AppState};
use backend_domain::{
    normalize_ids,
    normalize_optional_text,
    NotificationMetadata,
    NotificationType,
    OrderStatus,
    RefundRequest,
    RefundStatus,
    RefundTransition,
    Session,
    TransferOutcome,
};

pub async fn request_refund(
    state: &AppState,
    session: Option<&Session>,
    order_id: &str,
    reason: Option<String>,
) -> Result<RefundRequest, AppError> {
    let session = authorize(state, &AUTHENTICATED, session)?;
    let order = state
        .order_repo
        .find_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order '{}'", order_id)))?;
    if order.buyer_id != session.user_id {
        return Err(AppError::Forbidden(
            "refunds can only be requested by the buyer".to_string(),
        ));
    }
    if order.status != OrderStatus::Paid {
        return Err(AppError::InvalidState(format!(
            "order '{}' is {} and cannot be refunded",
            order_id,
            order.status.as_str()
        )));
    }

    let refund = state
        .order_repo
        .open_refund(order_id, normalize_optional_text(reason), Utc::now())
        .await?
        .ok_or_else(|| {
            AppError::InvalidState(format!("order '{}' already has a refund request", order_id))
        })?;
    info!(order_id, buyer = %session.user_id, "refund requested");

    notify_admins(
        state,
        NotificationType::RefundRequested,
        NotificationMetadata {
            buyer_name: Some(refund.buyer.name.clone()),
            reason: refund.request_reason.clone(),
            ..refund_metadata(&refund)
        },
    )
    .await;
    Ok(refund)
}

/// Reverses the buyer's payment and marks the refund PROCESSED.
///
/// If the gateway refuses, the refund moves to FAILED and the caller gets
/// `ExternalFailure`; `retry_refund` reopens it.
pub async fn approve_refund(
    state: &AppState,
    session: Option<&Session>,
    order_id: &str,
) -> Result<RefundRequest, AppError> {
    let session = authorize(state, &REFUND_PROCESSING, session)?;
    process_approval(state, &session.user_id, order_id).await
}

async fn process_approval(
    state: &AppState,
    admin_id: &str,
    order_id: &str,
) -> Result<RefundRequest, AppError> {
    let claim = state
        .refunds_in_flight
        .try_claim(order_id)
        .ok_or_else(|| concurrent_change(order_id))?;
    let current = load_refund(state, order_id).await?;
    ensure_initiated(&current, "approved")?;
    info!(order_id, admin = admin_id, "refund approved, reversing payment");

    let outcome = match state.transfer_gateway.refund_payment(&current).await {
        Ok(outcome) => outcome,
        Err(err) => TransferOutcome::Failed {
            reason: err.to_string(),
        },
    };

    let now = Utc::now();
    match outcome {
        TransferOutcome::Completed { reference } | TransferOutcome::Pending { reference } => {
            let updated = state
                .order_repo
                .transition_refund(
                    order_id,
                    RefundStatus::Initiated,
                    &RefundTransition::processed(reference, now),
                )
                .await?
                .ok_or_else(|| concurrent_change(order_id))?;
            drop(claim);
            state.metrics.record_refund_processed();
            notify_best_effort(
                state,
                NotificationType::RefundProcessed,
                &updated.buyer.id,
                refund_metadata(&updated),
            )
            .await;
            Ok(updated)
        }
        TransferOutcome::Failed { reason } => {
            let updated = state
                .order_repo
                .transition_refund(
                    order_id,
                    RefundStatus::Initiated,
                    &RefundTransition::failed(reason.clone(), now),
                )
                .await?
                .ok_or_else(|| concurrent_change(order_id))?;
            drop(claim);
            state.metrics.record_refund_failed();
            warn!(order_id, "refund reversal failed: {}", reason);
            notify_best_effort(
                state,
                NotificationType::RefundFailed,
                &updated.buyer.id,
                refund_metadata(&updated),
            )
            .await;
            Err(AppError::ExternalFailure(format!(
                "refund reversal failed: {}",
                reason
            )))
        }
    }
}

pub async fn reject_refund(
    state: &AppState,
    session: Option<&Session>,
    order_id: &str,
    notes: Option<String>,
) -> Result<RefundRequest, AppError> {
    let session = authorize(state, &REFUND_PROCESSING, session)?;
    let notes = require_notes(notes)?;
    process_rejection(state, &session.user_id, order_id, notes).await
}

async fn process_rejection(
    state: &AppState,
    admin_id: &str,
    order_id: &str,
    notes: String,
) -> Result<RefundRequest, AppError> {
    let claim = state
        .refunds_in_flight
        .try_claim(order_id)
        .ok_or_else(|| concurrent_change(order_id))?;
    let current = load_refund(state, order_id).await?;
    ensure_initiated(&current, "rejected")?;

    let updated = state
        .order_repo
        .transition_refund(
            order_id,
            RefundStatus::Initiated,
            &RefundTransition::rejected(notes, Utc::now()),
        )
        .await?
        .ok_or_else(|| concurrent_change(order_id))?;
    info!(order_id, admin = admin_id, "refund rejected");
    notify_best_effort(
        state,
        NotificationType::RefundRejected,
        &updated.buyer.id,
        NotificationMetadata {
            reason: updated.admin_notes.clone(),
            ..refund_metadata(&updated)
        },
    )
    .await;
    Ok(updated)
}

/// Reopens a FAILED refund so it can be approved again.
pub async fn retry_refund(
    state: &AppState,
    session: Option<&Session>,
    order_id: &str,
) -> Result<RefundRequest, AppError> {
    let session = authorize(state, &REFUND_PROCESSING, session)?;
    let current = load_refund(state, order_id).await?;
    if current.refund_status != RefundStatus::Failed {
        return Err(AppError::InvalidState(format!(
            "refund for order '{}' is {} and cannot be retried",
            order_id,
            current.refund_status.as_str()
        )));
    }
    let reopened = state
        .order_repo
        .transition_refund(order_id, RefundStatus::Failed, &RefundTransition::reopened())
        .await?
        .ok_or_else(|| concurrent_change(order_id))?;
    info!(order_id, admin = %session.user_id, "refund reopened for retry");
    Ok(reopened)
}

pub async fn bulk_process_refunds(
    state: &AppState,
    session: Option<&Session>,
    ids: Vec<String>,
    approve: bool,
    notes: Option<String>,
) -> Result<BulkOutcome, AppError> {
    let session = authorize(state, &REFUND_PROCESSING, session)?;
    let ids = normalize_ids(ids);
    if ids.is_empty() {
        return Err(AppError::Validation("no refunds selected".to_string()));
    }
    let notes = if approve { None } else { Some(require_notes(notes)?) };

    let mut outcome = BulkOutcome::default();
    for id in ids {
        let result = match &notes {
            None => process_approval(state, &session.user_id, &id).await,
            Some(notes) => process_rejection(state, &session.user_id, &id, notes.clone()).await,
        };
        match result {
            Ok(_) => outcome.processed_count += 1,
            Err(err) => {
                warn!(order_id = %id, "bulk refund item failed: {}", err);
                outcome.failures.push(BulkFailure {
                    id,
                    reason: err.public_message(),
                });
            }
        }
    }
    Ok(outcome)
}

async fn load_refund(state: &AppState, order_id: &str) -> Result<RefundRequest, AppError> {
    state
        .order_repo
        .find_refund(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("refund for order '{}'", order_id)))
}

fn ensure_initiated(refund: &RefundRequest, verb: &str) -> Result<(), AppError> {
    if refund.refund_status != RefundStatus::Initiated {
        return Err(AppError::InvalidState(format!(
            "refund for order '{}' is {} and cannot be {}",
            refund.order_id,
            refund.refund_status.as_str(),
            verb
        )));
    }
    Ok(())
}

fn concurrent_change(order_id: &str) -> AppError {
    AppError::InvalidState(format!(
        "refund for order '{}' is being processed by another request",
        order_id
    ))
}

fn refund_metadata(refund: &RefundRequest) -> NotificationMetadata {
    NotificationMetadata {
        event_id: Some(refund.event.id.clone()),
        event_title: Some(refund.event.title.clone()),
        amount: Some(refund.total_amount),
        order_id: Some(refund.order_id.clone()),
        transfer_code: refund.transfer_reference.clone(),
        ..Default::default()
    }
}

fn require_notes(notes: Option<String>) -> Result<String, AppError> {
    normalize_optional_text(notes)
        .ok_or_else(|| AppError::Validation("rejection notes are required".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_are_required_for_rejection() {
        assert!(matches!(require_notes(None), Err(AppError::Validation(_))));
        assert!(matches!(
            require_notes(Some(String::new())),
            Err(AppError::Validation(_))
        ));
        assert_eq!(
            require_notes(Some("duplicate order".to_string())).unwrap(),
            "duplicate order"
        );
    }
}
