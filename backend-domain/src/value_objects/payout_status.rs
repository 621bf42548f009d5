// Payout status value object

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "PENDING",
            PayoutStatus::Processing => "PROCESSING",
            PayoutStatus::Completed => "COMPLETED",
            PayoutStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PayoutStatus::Completed | PayoutStatus::Failed)
    }
}

impl TryFrom<&str> for PayoutStatus {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(PayoutStatus::Pending),
            "PROCESSING" => Ok(PayoutStatus::Processing),
            "COMPLETED" => Ok(PayoutStatus::Completed),
            "FAILED" => Ok(PayoutStatus::Failed),
            other => Err(anyhow!("unknown payout status '{}'", other)),
        }
    }
}

/// Why a payout ended in FAILED. Only transfer failures can be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutFailureKind {
    Rejected,
    Transfer,
}

impl PayoutFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutFailureKind::Rejected => "REJECTED",
            PayoutFailureKind::Transfer => "TRANSFER",
        }
    }
}

impl TryFrom<&str> for PayoutFailureKind {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_uppercase().as_str() {
            "REJECTED" => Ok(PayoutFailureKind::Rejected),
            "TRANSFER" => Ok(PayoutFailureKind::Transfer),
            other => Err(anyhow!("unknown payout failure kind '{}'", other)),
        }
    }
}
