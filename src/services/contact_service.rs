//! Contact Service
//!
//! Validates a contact submission and hands it to the on-demand report.

use crate::error::{AppError, Result};
use crate::models::{ContactField, ContactMessage};
use crate::services::{ReportDelivery, ReportService};
use crate::state::AppState;
use serde::Deserialize;
use tracing::{info, warn};

/// Raw contact form payload; any field may be absent
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ContactForm {
    fn value(&self, field: ContactField) -> Option<&str> {
        let value = match field {
            ContactField::Name => &self.name,
            ContactField::Email => &self.email,
            ContactField::Phone => &self.phone,
            ContactField::Message => &self.message,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Fields that are absent, empty or whitespace-only, in form order
    pub fn missing_fields(&self) -> Vec<ContactField> {
        ContactField::ALL
            .into_iter()
            .filter(|field| self.value(*field).is_none())
            .collect()
    }

    /// Presence check only; no format validation
    pub fn validate(&self) -> Result<ContactMessage> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::MissingFields(missing));
        }

        let get = |field: ContactField| self.value(field).unwrap_or_default().to_string();
        Ok(ContactMessage {
            name: get(ContactField::Name),
            email: get(ContactField::Email),
            phone: get(ContactField::Phone),
            message: get(ContactField::Message),
        })
    }
}

/// Contact service for business logic
pub struct ContactService;

impl ContactService {
    /// Validate and dispatch; nothing is sent when validation fails
    pub async fn submit(state: &AppState, form: &ContactForm) -> Result<ReportDelivery> {
        let contact = match form.validate() {
            Ok(contact) => contact,
            Err(e) => {
                warn!("ContactService::submit - rejected: {}", e);
                return Err(e);
            }
        };

        info!("ContactService::submit - from {}", contact.email);
        ReportService::send_on_demand(state, &contact).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::MemoryTransport;
    use crate::state::test_support::test_state;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn form(name: &str, email: &str, phone: &str, message: &str) -> ContactForm {
        ContactForm {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            phone: Some(phone.to_string()),
            message: Some(message.to_string()),
        }
    }

    #[test]
    fn test_missing_fields_named_exactly() {
        assert_eq!(form("", "a@b.com", "555", "hi").missing_fields(), vec![ContactField::Name]);
        assert_eq!(
            form("Ana", "  ", "555", "").missing_fields(),
            vec![ContactField::Email, ContactField::Message]
        );
        assert_eq!(ContactForm::default().missing_fields(), ContactField::ALL.to_vec());
        assert!(form("Ana", "a@b.com", "555", "hi").missing_fields().is_empty());
    }

    #[test]
    fn test_validate_trims() {
        let contact = form(" Ana ", "a@b.com", "555", " hi\n").validate().unwrap();
        assert_eq!(contact.name, "Ana");
        assert_eq!(contact.message, "hi");
    }

    #[tokio::test]
    async fn test_rejected_submission_sends_nothing() {
        let transport = Arc::new(MemoryTransport::new());
        let state = test_state(Arc::new(MemoryStore::new()), transport.clone(), &[]).await;

        let err = ContactService::submit(&state, &form("", "a@b.com", "555", "hi"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MissingFields(ref f) if f == &vec![ContactField::Name]));
        assert_eq!(transport.attempts(), 0);
    }

    #[tokio::test]
    async fn test_valid_submission_sends_report() {
        let transport = Arc::new(MemoryTransport::new());
        let state = test_state(Arc::new(MemoryStore::new()), transport.clone(), &[]).await;

        let delivery = ContactService::submit(&state, &form("Ana", "a@b.com", "555", "hi"))
            .await
            .unwrap();

        assert_eq!(delivery.cars_count, 0);
        assert_eq!(transport.sent().len(), 1);
    }
}
