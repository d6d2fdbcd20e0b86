//! Outbound email: the `Mailer` port, its backends, and message templates.
//!
//! Two backends ship: [`SmtpMailer`] (lettre over STARTTLS) for real delivery
//! and [`ConsoleMailer`] which prints to the log for development. Tests supply
//! their own recording implementation of [`Mailer`].

mod console;
mod smtp;

pub use console::ConsoleMailer;
pub use smtp::{SmtpConfig, SmtpMailer};

use async_trait::async_trait;

use crate::error::Result;

/// An outbound message, already rendered.
#[derive(Debug, Clone)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery port for outbound email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<()>;
}

/// The email carrying a signup verification code.
pub fn verification_email(to: &str, full_name: &str, code: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: "Verify your email".to_string(),
        body: format!(
            "Hello {full_name},\n\n\
             Your verification code is: {code}\n\n\
             Enter this code to verify your email address. It expires in 24 hours.\n\n\
             If you didn't create an account, you can ignore this email.\n"
        ),
    }
}

/// Sent once the email address has been verified.
pub fn welcome_email(to: &str, full_name: &str, app_name: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: format!("Welcome to {app_name}"),
        body: format!(
            "Hello {full_name},\n\n\
             Your email address has been verified. To finish securing your \
             account, set up two-factor authentication from your account page.\n\n\
             The {app_name} team\n"
        ),
    }
}
