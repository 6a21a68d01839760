//! SMTP relay transport

use super::{MailTransport, OutgoingMail};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, warn};
use uuid::Uuid;

/// SMTP relay settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// STARTTLS SMTP relay client
pub struct SmtpMailer {
    host: String,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpMailer {
    /// Build the relay client; without credentials every send is a configuration error
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let transport = match (config.username, config.password) {
            (Some(username), Some(password)) => Some(
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
                    .port(config.port)
                    .credentials(Credentials::new(username, password))
                    .build(),
            ),
            _ => {
                warn!("SMTP credentials missing; email delivery is disabled");
                None
            }
        };

        Ok(Self {
            host: config.host,
            transport,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    fn build_message(mail: &OutgoingMail, message_id: &str) -> Result<Message> {
        let from = configured_mailbox("MAIL_FROM", &mail.from)?;
        let to = configured_mailbox("MAIL_TO", &mail.to)?;

        let mut builder = Message::builder()
            .from(from)
            .to(to)
            .subject(mail.subject.clone())
            .message_id(Some(message_id.to_string()));

        // The submitter's address is not format-validated upstream
        if let Some(reply_to) = &mail.reply_to {
            match reply_to.parse::<Mailbox>() {
                Ok(mailbox) => builder = builder.reply_to(mailbox),
                Err(e) => warn!("Ignoring unparsable reply-to '{}': {}", reply_to, e),
            }
        }

        Ok(builder.multipart(MultiPart::alternative_plain_html(
            mail.text.clone(),
            mail.html.clone(),
        ))?)
    }
}

/// Parse a sender or recipient taken from configuration
fn configured_mailbox(setting: &str, value: &str) -> Result<Mailbox> {
    value
        .parse()
        .map_err(|e| AppError::Config(format!("{} is not a valid address: {}", setting, e)))
}

/// Message id in the sender's domain
fn new_message_id(from: &str) -> String {
    let domain = from
        .rsplit_once('@')
        .map(|(_, domain)| domain.trim_end_matches('>'))
        .filter(|d| !d.is_empty())
        .unwrap_or("localhost");
    format!("<{}@{}>", Uuid::new_v4(), domain)
}

#[async_trait]
impl MailTransport for SmtpMailer {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<String> {
        let transport = self.transport.as_ref().ok_or_else(|| {
            AppError::Config("Email service not properly configured (SMTP credentials missing)".to_string())
        })?;

        let message_id = new_message_id(&mail.from);
        let message = Self::build_message(mail, &message_id)?;

        debug!("Relaying '{}' through {}", mail.subject, self.host);
        let response = transport.send(message).await?;
        if !response.is_positive() {
            return Err(AppError::Mail(format!(
                "Relay rejected message: {}",
                response.code()
            )));
        }

        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail() -> OutgoingMail {
        OutgoingMail {
            from: "CarBot <reports@carbot.example>".to_string(),
            to: "owner@carbot.example".to_string(),
            reply_to: Some("not an address".to_string()),
            subject: "Report".to_string(),
            text: "plain".to_string(),
            html: "<p>html</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_password_is_config_error() {
        let mailer = SmtpMailer::new(SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: Some("user".to_string()),
            password: None,
        })
        .unwrap();

        assert!(!mailer.is_configured());
        let err = mailer.send(&mail()).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(!err.to_string().contains("user"));
    }

    #[tokio::test]
    async fn test_bad_configured_address_is_config_error() {
        let mailer = SmtpMailer::new(SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: Some("user".to_string()),
            password: Some("secret".to_string()),
        })
        .unwrap();
        assert!(mailer.is_configured());

        let mut bad_sender = mail();
        bad_sender.from = "reports at carbot".to_string();
        let err = mailer.send(&bad_sender).await.unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.starts_with("MAIL_FROM")));
        assert_eq!(err.class(), crate::error::ErrorClass::Configuration);
        assert!(!err.is_mail_failure());

        let mut bad_recipient = mail();
        bad_recipient.to = "owner@".to_string();
        let err = SmtpMailer::build_message(&bad_recipient, "<id@carbot.example>").unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.starts_with("MAIL_TO")));
    }

    #[test]
    fn test_message_id_uses_sender_domain() {
        let id = new_message_id("CarBot <reports@carbot.example>");
        assert!(id.ends_with("@carbot.example>"));
        assert!(new_message_id("nobody").ends_with("@localhost>"));
    }

    #[test]
    fn test_build_message_skips_bad_reply_to() {
        let message = SmtpMailer::build_message(&mail(), "<id@carbot.example>").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Message-ID: <id@carbot.example>"));
        assert!(!raw.contains("Reply-To"));
        assert!(raw.contains("multipart/alternative"));
    }
}
