// Refund request entity
// The refund sub-state of a buyer's order

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::value_objects::RefundStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundParty {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundEvent {
    pub id: String,
    pub title: String,
    pub organizer_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub order_id: String,
    pub total_amount: Decimal,
    pub payment_reference: Option<String>,
    pub refund_status: RefundStatus,
    pub request_reason: Option<String>,
    pub admin_notes: Option<String>,
    pub transfer_reference: Option<String>,
    pub failure_reason: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub buyer: RefundParty,
    pub event: RefundEvent,
}

impl RefundRequest {
    pub fn apply(&mut self, transition: &RefundTransition) {
        self.refund_status = transition.to;
        if let Some(notes) = &transition.admin_notes {
            self.admin_notes = Some(notes.clone());
        }
        if let Some(reference) = &transition.transfer_reference {
            self.transfer_reference = Some(reference.clone());
        }
        self.failure_reason = transition.failure_reason.clone();
        self.processed_at = transition.processed_at;
    }
}

/// Target state of a compare-and-swap update. Notes and references are only written
/// when present; `failure_reason` and `processed_at` are always overwritten.
#[derive(Debug, Clone)]
pub struct RefundTransition {
    pub to: RefundStatus,
    pub admin_notes: Option<String>,
    pub transfer_reference: Option<String>,
    pub failure_reason: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl RefundTransition {
    pub fn processed(transfer_reference: String, at: DateTime<Utc>) -> Self {
        Self {
            to: RefundStatus::Processed,
            admin_notes: None,
            transfer_reference: Some(transfer_reference),
            failure_reason: None,
            processed_at: Some(at),
        }
    }

    pub fn rejected(notes: String, at: DateTime<Utc>) -> Self {
        Self {
            to: RefundStatus::Rejected,
            admin_notes: Some(notes),
            transfer_reference: None,
            failure_reason: None,
            processed_at: Some(at),
        }
    }

    pub fn failed(reason: String, at: DateTime<Utc>) -> Self {
        Self {
            to: RefundStatus::Failed,
            admin_notes: None,
            transfer_reference: None,
            failure_reason: Some(reason),
            processed_at: Some(at),
        }
    }

    pub fn reopened() -> Self {
        Self {
            to: RefundStatus::Initiated,
            admin_notes: None,
            transfer_reference: None,
            failure_reason: None,
            processed_at: None,
        }
    }
}
