//! Email delivery for notifications.
//!
//! [`SmtpEmailSender`] sends plain-text mail through `lettre`'s async SMTP
//! transport. Without SMTP settings the [`LogEmailSender`] only logs the
//! message.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use backend_domain::ports::EmailSender;
use backend_domain::EmailMessage;

use crate::config::SmtpConfig;

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("email build error: {0}")]
    Build(String),
}

pub struct SmtpEmailSender {
    from: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailSender {
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(EmailError::from)?
            .port(config.port);
        if let (Some(user), Some(password)) = (config.user, config.password) {
            builder = builder.credentials(Credentials::new(user, password));
        }
        Ok(Self {
            from: config.from,
            transport: builder.build(),
        })
    }

    async fn deliver(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.from.parse()?)
            .to(message.to.parse()?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|err| EmailError::Build(err.to_string()))?;
        self.transport.send(email).await?;
        Ok(())
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        self.deliver(message)
            .await
            .map_err(|err| anyhow!("email to {} failed: {}", message.to, err))?;
        info!(to = %message.to, subject = %message.subject, "notification email sent");
        Ok(())
    }
}

#[derive(Default)]
pub struct LogEmailSender;

impl LogEmailSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "email delivery disabled, message logged"
        );
        Ok(())
    }
}
