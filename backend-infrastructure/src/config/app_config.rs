use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::{DbConfig, RuntimeConfig, StorageKind};

const CONFIG_ENV: &str = "STAGEPASS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./config.toml";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub storage: StorageKind,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub platform_fee_percent: Decimal,
    pub currency_symbol: String,
    pub public_base_url: String,
    pub transfer_base_url: String,
    pub transfer_secret_key: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub log_format: String,
    pub log_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            storage: StorageKind::Memory,
            database_url: None,
            database_max_connections: 10,
            jwt_secret: "change-me".to_string(),
            platform_fee_percent: Decimal::new(5, 0),
            currency_symbol: "₦".to_string(),
            public_base_url: "http://127.0.0.1:3240".to_string(),
            transfer_base_url: "https://api.paystack.co".to_string(),
            transfer_secret_key: None,
            smtp_host: None,
            smtp_port: 587,
            smtp_user: None,
            smtp_password: None,
            smtp_from: "Stagepass <no-reply@stagepass.local>".to_string(),
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
            log_format: "text".to_string(),
            log_dir: None,
        }
    }
}

/// SMTP settings, present only when `smtp_host` is configured.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

/// Payment provider settings, present only when a secret key is configured.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    pub base_url: String,
    pub secret_key: String,
    pub timeout_seconds: u64,
}

impl AppConfig {
    /// Reads the TOML file (a missing file means defaults), then applies
    /// `STAGEPASS_*` overrides, normalizes and validates.
    pub async fn load(path_override: Option<PathBuf>) -> Result<Self> {
        let path = path_override
            .or_else(|| env::var(CONFIG_ENV).ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path).await?;
            toml::from_str::<AppConfig>(&content)
                .map_err(|err| anyhow!("invalid config {}: {}", path.display(), err))?
        } else {
            warn!("{} not found, using defaults", path.display());
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(path.parent());
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        normalize_optional(&mut self.database_url);
        normalize_optional(&mut self.transfer_secret_key);
        normalize_optional(&mut self.smtp_host);
        normalize_optional(&mut self.smtp_user);
        normalize_optional(&mut self.smtp_password);
        normalize_optional(&mut self.log_dir);
        self.log_format = self.log_format.trim().to_lowercase();
        self.public_base_url = self.public_base_url.trim().trim_end_matches('/').to_string();
        self.transfer_base_url = self
            .transfer_base_url
            .trim()
            .trim_end_matches('/')
            .to_string();
        if self.currency_symbol.trim().is_empty() {
            self.currency_symbol = "₦".to_string();
        }
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        if let Some(dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.public_base_url.is_empty() {
            return Err(anyhow!("public_base_url must not be empty"));
        }
        if self.platform_fee_percent < Decimal::ZERO
            || self.platform_fee_percent >= Decimal::ONE_HUNDRED
        {
            return Err(anyhow!("platform_fee_percent must be within [0, 100)"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow!("request_timeout_seconds must be greater than 0"));
        }
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("jwt_secret must not be empty"));
        }
        if self.storage == StorageKind::Postgres && self.database_url.is_none() {
            return Err(anyhow!("database_url is required when storage = \"postgres\""));
        }
        if self.database_max_connections == 0 {
            return Err(anyhow!("database_max_connections must be greater than 0"));
        }
        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(anyhow!("log_format must be \"text\" or \"json\""));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            platform_fee_percent: self.platform_fee_percent,
            currency_symbol: self.currency_symbol.clone(),
            public_base_url: self.public_base_url.clone(),
            transfer_webhook_secret: self.transfer_secret_key.clone(),
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            storage: self.storage,
            database_url: self.database_url.clone(),
            max_connections: self.database_max_connections,
        }
    }

    pub fn smtp_config(&self) -> Option<SmtpConfig> {
        self.smtp_host.as_ref().map(|host| SmtpConfig {
            host: host.clone(),
            port: self.smtp_port,
            user: self.smtp_user.clone(),
            password: self.smtp_password.clone(),
            from: self.smtp_from.clone(),
        })
    }

    pub fn transfer_config(&self) -> Option<TransferConfig> {
        self.transfer_secret_key.as_ref().map(|key| TransferConfig {
            base_url: self.transfer_base_url.clone(),
            secret_key: key.clone(),
            timeout_seconds: self.request_timeout_seconds,
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("STAGEPASS_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("STAGEPASS_STORAGE") {
            match value.trim().to_lowercase().as_str() {
                "memory" => self.storage = StorageKind::Memory,
                "postgres" => self.storage = StorageKind::Postgres,
                other => warn!("ignoring unknown STAGEPASS_STORAGE '{}'", other),
            }
        }
        if let Ok(value) = env::var("STAGEPASS_DATABASE_URL") {
            self.database_url = Some(value);
        }
        if let Ok(value) = env::var("STAGEPASS_DATABASE_MAX_CONNECTIONS") {
            self.database_max_connections =
                value.parse().unwrap_or(self.database_max_connections);
        }
        if let Ok(value) = env::var("STAGEPASS_JWT_SECRET") {
            self.jwt_secret = value;
        }
        if let Ok(value) = env::var("STAGEPASS_PLATFORM_FEE_PERCENT") {
            self.platform_fee_percent =
                Decimal::from_str(value.trim()).unwrap_or(self.platform_fee_percent);
        }
        if let Ok(value) = env::var("STAGEPASS_CURRENCY_SYMBOL") {
            self.currency_symbol = value;
        }
        if let Ok(value) = env::var("STAGEPASS_PUBLIC_BASE_URL") {
            self.public_base_url = value;
        }
        if let Ok(value) = env::var("STAGEPASS_TRANSFER_BASE_URL") {
            self.transfer_base_url = value;
        }
        if let Ok(value) = env::var("STAGEPASS_TRANSFER_SECRET_KEY") {
            self.transfer_secret_key = Some(value);
        }
        if let Ok(value) = env::var("STAGEPASS_SMTP_HOST") {
            self.smtp_host = Some(value);
        }
        if let Ok(value) = env::var("STAGEPASS_SMTP_PORT") {
            self.smtp_port = value.parse().unwrap_or(self.smtp_port);
        }
        if let Ok(value) = env::var("STAGEPASS_SMTP_USER") {
            self.smtp_user = Some(value);
        }
        if let Ok(value) = env::var("STAGEPASS_SMTP_PASSWORD") {
            self.smtp_password = Some(value);
        }
        if let Ok(value) = env::var("STAGEPASS_SMTP_FROM") {
            self.smtp_from = value;
        }
        if let Ok(value) = env::var("STAGEPASS_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("STAGEPASS_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Ok(value) = env::var("STAGEPASS_LOG_FORMAT") {
            self.log_format = value;
        }
        if let Ok(value) = env::var("STAGEPASS_LOG_DIR") {
            self.log_dir = Some(value);
        }
    }
}

fn normalize_optional(value: &mut Option<String>) {
    if let Some(inner) = value {
        let trimmed = inner.trim();
        if trimmed.is_empty() {
            *value = None;
        } else if trimmed.len() != inner.len() {
            *value = Some(trimmed.to_string());
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
