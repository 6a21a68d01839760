//! Outbound mail module
//!
//! `MailTransport` is the seam between report delivery and the relay:
//! - `SmtpMailer` relays through an SMTP server with STARTTLS
//! - `MemoryTransport` records messages (dry runs and tests)
//!
//! `MailDispatcher` binds a transport to the configured sender and
//! recipient. Every call is exactly one send attempt.

mod memory;
mod smtp;

pub use memory::MemoryTransport;
pub use smtp::{SmtpConfig, SmtpMailer};

use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

/// A fully rendered message ready for the relay
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Mail transport trait that every relay implementation must implement
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Transport name for logs
    fn name(&self) -> &'static str;

    /// Send one message, returning its message id
    async fn send(&self, mail: &OutgoingMail) -> Result<String>;
}

/// Sender and recipient addresses for reports
#[derive(Debug, Clone, Default)]
pub struct MailRouting {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Sends report emails through a transport
#[derive(Clone)]
pub struct MailDispatcher {
    transport: Arc<dyn MailTransport>,
    routing: MailRouting,
}

impl MailDispatcher {
    pub fn new(transport: Arc<dyn MailTransport>, routing: MailRouting) -> Self {
        Self { transport, routing }
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Send a report to the configured recipient
    pub async fn send_report(
        &self,
        subject: String,
        text: String,
        html: String,
        reply_to: Option<String>,
    ) -> Result<String> {
        let from = self
            .routing
            .from
            .clone()
            .ok_or_else(|| AppError::Config("Sender address (MAIL_FROM) is not configured".to_string()))?;
        let to = self
            .routing
            .to
            .clone()
            .ok_or_else(|| AppError::Config("Recipient address (MAIL_TO) is not configured".to_string()))?;

        self.send(OutgoingMail {
            from,
            to,
            reply_to,
            subject,
            text,
            html,
        })
        .await
    }

    /// Send a message as-is
    pub async fn send(&self, mail: OutgoingMail) -> Result<String> {
        match self.transport.send(&mail).await {
            Ok(message_id) => {
                info!(
                    "Email '{}' sent via {}: {}",
                    mail.subject,
                    self.transport.name(),
                    message_id
                );
                Ok(message_id)
            }
            Err(e) => {
                error!("Email '{}' failed via {}: {}", mail.subject, self.transport.name(), e);
                Err(e)
            }
        }
    }
}
