// Payout request entity
// Transfer of accrued ticket revenue, minus the platform fee, to an organizer

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::services::FeeSplit;
use crate::value_objects::{new_id, PayoutFailureKind, PayoutStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRequest {
    pub id: String,
    pub organizer_id: String,
    pub amount: Decimal,
    pub platform_fee: Decimal,
    pub net_amount: Decimal,
    pub status: PayoutStatus,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub bank_account: String,
    pub bank_code: String,
    pub account_name: String,
    pub transfer_code: Option<String>,
    pub failure_reason: Option<String>,
    pub failure_kind: Option<PayoutFailureKind>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    pub bank_account: String,
    pub bank_code: String,
    pub account_name: String,
}

impl PayoutRequest {
    /// The fee split is frozen here; later fee changes never touch existing requests.
    pub fn new(
        organizer_id: String,
        amount: Decimal,
        split: FeeSplit,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        bank: BankDetails,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_id(),
            organizer_id,
            amount,
            platform_fee: split.platform_fee,
            net_amount: split.net_amount,
            status: PayoutStatus::Pending,
            period_start,
            period_end,
            bank_account: bank.bank_account,
            bank_code: bank.bank_code,
            account_name: bank.account_name,
            transfer_code: None,
            failure_reason: None,
            failure_kind: None,
            created_at: now,
            processed_at: None,
        }
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.period_start <= end && start <= self.period_end
    }

    /// Every payout except a rejected one keeps its period reserved.
    pub fn claims_period(&self) -> bool {
        self.failure_kind != Some(PayoutFailureKind::Rejected)
    }

    pub fn is_retryable(&self) -> bool {
        self.status == PayoutStatus::Failed
            && self.failure_kind == Some(PayoutFailureKind::Transfer)
    }

    pub fn apply(&mut self, transition: &PayoutTransition) {
        self.status = transition.to;
        if let Some(code) = &transition.transfer_code {
            self.transfer_code = Some(code.clone());
        }
        self.failure_reason = transition.failure_reason.clone();
        self.failure_kind = transition.failure_kind;
        self.processed_at = transition.processed_at;
    }
}

/// Target state of a compare-and-swap update. `transfer_code` is only written when
/// present; failure fields and `processed_at` are always overwritten.
#[derive(Debug, Clone)]
pub struct PayoutTransition {
    pub to: PayoutStatus,
    pub transfer_code: Option<String>,
    pub failure_reason: Option<String>,
    pub failure_kind: Option<PayoutFailureKind>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl PayoutTransition {
    pub fn processing() -> Self {
        Self {
            to: PayoutStatus::Processing,
            transfer_code: None,
            failure_reason: None,
            failure_kind: None,
            processed_at: None,
        }
    }

    pub fn awaiting_confirmation(transfer_code: String) -> Self {
        Self {
            transfer_code: Some(transfer_code),
            ..Self::processing()
        }
    }

    pub fn completed(transfer_code: Option<String>, at: DateTime<Utc>) -> Self {
        Self {
            to: PayoutStatus::Completed,
            transfer_code,
            failure_reason: None,
            failure_kind: None,
            processed_at: Some(at),
        }
    }

    pub fn failed(kind: PayoutFailureKind, reason: String, at: DateTime<Utc>) -> Self {
        Self {
            to: PayoutStatus::Failed,
            transfer_code: None,
            failure_reason: Some(reason),
            failure_kind: Some(kind),
            processed_at: Some(at),
        }
    }

    pub fn reopened() -> Self {
        Self {
            to: PayoutStatus::Pending,
            ..Self::processing()
        }
    }
}
