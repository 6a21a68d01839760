//! Application state management

use crate::config::{AppConfig, StoreBackend};
use crate::error::{AppError, Result};
use crate::live::{LiveView, ViewKind};
use crate::mail::{MailDispatcher, MailTransport, MemoryTransport, SmtpMailer};
use crate::store::{DocumentStore, FirestoreStore, MemoryStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across all handlers
pub struct AppState {
    /// Environment configuration
    pub config: AppConfig,

    /// Document store client
    pub store: Arc<dyn DocumentStore>,

    /// Report mail dispatcher
    pub mailer: MailDispatcher,

    /// Live view of every car by profit
    pub market: LiveView,

    /// Live view of recent cars and batch runs
    pub dashboard: LiveView,
}

impl AppState {
    /// Create application state from configuration
    pub async fn new(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = match config.store.backend {
            StoreBackend::Firestore => {
                let firestore = config.store.firestore.clone().ok_or_else(|| {
                    AppError::Config("Firestore backend selected without connection settings".to_string())
                })?;
                Arc::new(FirestoreStore::new(firestore)?)
            }
            StoreBackend::Memory => {
                warn!("Using in-memory document store; data is not persisted");
                Arc::new(MemoryStore::new())
            }
        };

        let transport: Arc<dyn MailTransport> = if config.mail.dry_run {
            warn!("MAIL_DRY_RUN enabled; emails are recorded, not sent");
            Arc::new(MemoryTransport::new())
        } else {
            Arc::new(SmtpMailer::new(config.mail.smtp.clone())?)
        };

        Self::from_parts(config, store, transport).await
    }

    /// Assemble state from already constructed collaborators
    pub async fn from_parts(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self> {
        let mailer = MailDispatcher::new(transport, config.mail.routing.clone());
        let market = LiveView::start(store.clone(), ViewKind::Market, config.page_size).await?;
        let dashboard = LiveView::start(store.clone(), ViewKind::Dashboard, config.page_size).await?;

        info!(
            "Application state initialized (store: {}, mail: {})",
            store.name(),
            mailer.transport_name()
        );

        Ok(Self {
            config,
            store,
            mailer,
            market,
            dashboard,
        })
    }

    /// Cancel all live subscriptions
    pub fn shutdown(&self) {
        self.market.close();
        self.dashboard.close();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::HashMap;

    /// State over a memory store with addresses configured; `vars` override
    pub(crate) async fn test_state(
        store: Arc<dyn DocumentStore>,
        transport: Arc<dyn MailTransport>,
        vars: &[(&str, &str)],
    ) -> AppState {
        let mut env: HashMap<String, String> = [
            ("STORE_BACKEND", "memory"),
            ("MAIL_FROM", "CarBot <reports@carbot.example>"),
            ("MAIL_TO", "owner@carbot.example"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in vars {
            env.insert(k.to_string(), v.to_string());
        }

        let config = AppConfig::from_lookup(|key| env.get(key).cloned()).unwrap();
        AppState::from_parts(config, store, transport).await.unwrap()
    }
}
