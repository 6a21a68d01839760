//! Recording mail transport

use super::{MailTransport, OutgoingMail};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;
use uuid::Uuid;

/// Keeps sent messages in memory instead of relaying them
///
/// Only the most recent `RETAINED` messages are kept.
pub struct MemoryTransport {
    sent: Mutex<VecDeque<OutgoingMail>>,
    attempts: AtomicUsize,
    failure: Option<String>,
}

impl MemoryTransport {
    /// Messages kept for inspection
    pub const RETAINED: usize = 50;

    pub fn new() -> Self {
        Self {
            sent: Mutex::new(VecDeque::with_capacity(Self::RETAINED)),
            attempts: AtomicUsize::new(0),
            failure: None,
        }
    }

    /// A transport that rejects every message with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::new()
        }
    }

    /// Retained messages, oldest first
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().iter().cloned().collect()
    }

    /// Send attempts, including rejected ones
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailTransport for MemoryTransport {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<String> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &self.failure {
            return Err(AppError::Mail(reason.clone()));
        }

        let message_id = format!("<{}@memory.local>", Uuid::new_v4());
        info!("Recorded email '{}' for {} (dry run)", mail.subject, mail.to);

        let mut sent = self.sent.lock();
        if sent.len() == Self::RETAINED {
            sent.pop_front();
        }
        sent.push_back(mail.clone());
        Ok(message_id)
    }
}
