//! Transactional email
//!
//! `SmtpMailer` delivers through an SMTP relay; `LogMailer` only writes the
//! message to the log and is used in development and tests.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::{MailConfig, MailProvider};
use crate::utils::errors::{Result, WaddleError};

/// A plain-text email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<()>;
}

pub type SharedMailer = Arc<dyn Mailer>;

/// Build the mailer selected in configuration
pub fn build_mailer(config: &MailConfig) -> Result<SharedMailer> {
    match config.provider {
        MailProvider::Smtp => Ok(Arc::new(SmtpMailer::new(config)?)),
        MailProvider::Log => Ok(Arc::new(LogMailer)),
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| WaddleError::Mail(format!("SMTP relay error: {e}")))?
            .port(config.smtp_port);
        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from: format!("{} <{}>", config.from_name, config.from_email),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: Email) -> Result<()> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| WaddleError::Mail(format!("Invalid from address: {e}")))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| WaddleError::Mail(format!("Invalid to address: {e}")))?)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|e| WaddleError::Mail(format!("Failed to build email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| WaddleError::Mail(format!("Failed to send email: {e}")))?;
        Ok(())
    }
}

/// Writes outgoing mail to the log instead of sending it
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<()> {
        info!(to = %email.to, subject = %email.subject, "Email (log transport)");
        Ok(())
    }
}

pub fn password_reset_email(to: &str, code: &str, ttl_minutes: u64) -> Email {
    Email {
        to: to.to_string(),
        subject: "Your Waddle password reset code".to_string(),
        body: format!(
            "Your password reset code is {code}.\n\nIt expires in {ttl_minutes} minutes. \
             If you did not ask to reset your password you can ignore this email."
        ),
    }
}

pub fn booking_confirmed_email(to: &str, event_title: &str, quantity: i32, amount: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: format!("Booking confirmed: {event_title}"),
        body: format!(
            "Your booking for {event_title} is confirmed.\n\nTickets: {quantity}\nPaid: {amount}\n\nSee you there!"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_accepts_mail() {
        let mailer = LogMailer;
        let email = password_reset_email("parent@example.com", "123456", 15);
        assert!(email.body.contains("123456"));
        assert!(mailer.send(email).await.is_ok());
    }

    #[test]
    fn test_build_log_mailer() {
        let config = MailConfig {
            provider: MailProvider::Log,
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "no-reply@waddle.local".into(),
            from_name: "Waddle".into(),
        };
        assert!(build_mailer(&config).is_ok());
    }

    #[test]
    fn test_booking_email_text() {
        let email = booking_confirmed_email("p@example.com", "Toddler Swim", 2, "24.00 GBP");
        assert_eq!(email.subject, "Booking confirmed: Toddler Swim");
        assert!(email.body.contains("Tickets: 2"));
    }
}
