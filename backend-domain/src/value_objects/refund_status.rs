// Refund status value object

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    Initiated,
    Processed,
    Rejected,
    Failed,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Initiated => "INITIATED",
            RefundStatus::Processed => "PROCESSED",
            RefundStatus::Rejected => "REJECTED",
            RefundStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RefundStatus::Initiated)
    }
}

impl TryFrom<&str> for RefundStatus {
    type Error = anyhow::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_uppercase().as_str() {
            "INITIATED" => Ok(RefundStatus::Initiated),
            "PROCESSED" => Ok(RefundStatus::Processed),
            "REJECTED" => Ok(RefundStatus::Rejected),
            "FAILED" => Ok(RefundStatus::Failed),
            other => Err(anyhow!("unknown refund status '{}'", other)),
        }
    }
}
