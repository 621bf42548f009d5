// Runtime configuration shared with the application layer

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub platform_fee_percent: Decimal,
    pub currency_symbol: String,
    pub public_base_url: String,
    pub transfer_webhook_secret: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            platform_fee_percent: Decimal::new(5, 0),
            currency_symbol: "₦".to_string(),
            public_base_url: "http://127.0.0.1:3240".to_string(),
            transfer_webhook_secret: None,
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    Postgres,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub storage: StorageKind,
    pub database_url: Option<String>,
    pub max_connections: u32,
}
