//! Log-only mailer for development.

use async_trait::async_trait;

use super::{Email, Mailer};
use crate::error::Result;

/// Prints messages to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct ConsoleMailer;

impl ConsoleMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: Email) -> Result<()> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "email (console backend)\n{}",
            email.body
        );
        Ok(())
    }
}
