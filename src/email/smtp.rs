//! SMTP delivery via lettre.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::Mailbox,
    transport::smtp::authentication::Credentials,
};

use super::{Email, Mailer};
use crate::error::{Error, Result};

/// SMTP transport settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl SmtpConfig {
    /// Read SMTP settings from `SMTP_HOST`, `SMTP_PORT` (default 587),
    /// `SMTP_USERNAME`, `SMTP_PASSWORD`. Fails when the host is unset.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("SMTP_HOST")
            .map_err(|_| Error::internal("SMTP_HOST is not set"))?;
        let port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(587);
        let username = std::env::var("SMTP_USERNAME").unwrap_or_default();
        let password = std::env::var("SMTP_PASSWORD").unwrap_or_default();

        Ok(Self {
            host,
            port,
            username,
            password,
        })
    }
}

/// Delivers mail through an SMTP relay using STARTTLS.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, from: &str) -> Result<Self> {
        let from = from
            .parse::<Mailbox>()
            .map_err(|e| Error::internal(format!("invalid sender address {}: {}", from, e)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| Error::internal(format!("invalid SMTP relay {}: {}", config.host, e)))?
            .port(config.port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: Email) -> Result<()> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|e| Error::internal(format!("invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject)
            .body(email.body)
            .map_err(|e| Error::internal(format!("failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| Error::dependency(format!("SMTP send failed: {}", e)))?;

        tracing::debug!(to = %email.to, subject = %email.subject, "email sent");
        Ok(())
    }
}
