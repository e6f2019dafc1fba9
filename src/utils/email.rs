use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::config::SmtpConfig;

pub const OTP_SUBJECT: &str = "Dein Verifizierungscode";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("SMTP relay {0} did not accept the connection")]
    Unreachable(String),
}

/// A fully rendered message ready for the relay
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub from: Mailbox,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// SMTP reply code from the relay, e.g. `250`
    pub smtp_code: String,
    pub message: String,
}

#[async_trait]
pub trait MailSender: Send + Sync {
    /// Check that the relay is reachable and accepts our credentials
    async fn verify_connection(&self) -> Result<(), MailError>;

    async fn send(&self, mail: OutgoingMail) -> Result<DeliveryReceipt, MailError>;
}

/// Mail sender backed by an authenticated SMTP relay
pub struct SmtpMailer {
    host: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        // 465 is implicit TLS (SMTPS), everything else upgrades with STARTTLS
        let builder = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        };

        let transport = builder.credentials(creds).port(config.port).build();

        Ok(Self {
            host: config.host.clone(),
            transport,
        })
    }
}

#[async_trait]
impl MailSender for SmtpMailer {
    async fn verify_connection(&self) -> Result<(), MailError> {
        if self.transport.test_connection().await? {
            Ok(())
        } else {
            Err(MailError::Unreachable(self.host.clone()))
        }
    }

    async fn send(&self, mail: OutgoingMail) -> Result<DeliveryReceipt, MailError> {
        let email = Message::builder()
            .from(mail.from)
            .to(mail.to.parse()?)
            .subject(mail.subject)
            .header(ContentType::TEXT_HTML)
            .body(mail.html)?;

        let response = self.transport.send(email).await?;

        Ok(DeliveryReceipt {
            smtp_code: response.code().to_string(),
            message: response
                .message()
                .map(|line| line.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        })
    }
}

/// Render the verification mail for a freshly issued code
pub fn verification_mail(
    from: &Mailbox,
    to: &str,
    code: &str,
    expires_at: DateTime<Utc>,
) -> OutgoingMail {
    let html = format!(
        r#"<div style="font-family: sans-serif; padding: 24px;">
  <h2>Leichtes Fahren – Verifizierung</h2>
  <p>Gib diesen Code ein:</p>
  <h1 style="font-size: 32px;">{code}</h1>
  <p>Der Code ist gültig bis: <strong>{expiry}</strong></p>
  <p style="color: #888;">Dieser Code verfällt automatisch.</p>
</div>"#,
        expiry = expires_at.format("%H:%M:%S UTC"),
    );

    OutgoingMail {
        from: from.clone(),
        to: to.to_string(),
        subject: OTP_SUBJECT.to_string(),
        html,
    }
}
