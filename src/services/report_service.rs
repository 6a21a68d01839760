//! Report Service
//!
//! One pipeline behind both report triggers: fetch the top cars, render them
//! with a profile, send the result through the dispatcher. Every call is a
//! single attempt and there is no deduplication across calls.

use crate::error::Result;
use crate::models::ContactMessage;
use crate::report::{render_report, ReportProfile, MAX_REPORT_CARS};
use crate::services::CarService;
use crate::state::AppState;
use crate::stats::AggregateStats;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

/// Outcome of a sent report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDelivery {
    pub message_id: String,
    pub cars_count: usize,
    pub total_profit: f64,
    pub stats: AggregateStats,
}

/// Report service for business logic
pub struct ReportService;

impl ReportService {
    /// English / USD report triggered by a contact submission
    pub async fn send_on_demand(state: &AppState, contact: &ContactMessage) -> Result<ReportDelivery> {
        info!("ReportService::send_on_demand - requested by {}", contact.email);
        Self::send(state, &ReportProfile::on_demand(), Some(contact)).await
    }

    /// Romanian / EUR daily report
    pub async fn send_daily(state: &AppState) -> Result<ReportDelivery> {
        info!("ReportService::send_daily");
        let profile = ReportProfile::daily().with_timezone(state.config.schedule.timezone);
        Self::send(state, &profile, None).await
    }

    /// Fetch, render and send with the given profile
    pub async fn send(
        state: &AppState,
        profile: &ReportProfile,
        contact: Option<&ContactMessage>,
    ) -> Result<ReportDelivery> {
        let cars = CarService::top_by_profit(state.store.as_ref(), MAX_REPORT_CARS).await?;
        let report = render_report(&cars, profile, contact, Utc::now());

        let reply_to = contact.map(|c| c.email.clone());
        let message_id = state
            .mailer
            .send_report(report.subject, report.text, report.html, reply_to)
            .await?;

        info!(
            "Report sent: {} cars, total profit {:.2}, message {}",
            report.stats.count, report.stats.total_profit, message_id
        );

        Ok(ReportDelivery {
            message_id,
            cars_count: report.stats.count,
            total_profit: report.stats.total_profit,
            stats: report.stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::mail::MemoryTransport;
    use crate::models::CARS_COLLECTION;
    use crate::state::test_support::test_state;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn store_with_cars(n: usize) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for i in 0..n {
            store.upsert(
                CARS_COLLECTION,
                &format!("car-{:02}", i),
                json!({"makeModel": format!("Model {}", i), "year": "2018", "profit": (i as f64) * 100.0}),
            );
        }
        store
    }

    #[tokio::test]
    async fn test_daily_report_sends_top_ten() {
        let transport = Arc::new(MemoryTransport::new());
        let state = test_state(store_with_cars(12), transport.clone(), &[]).await;

        let delivery = ReportService::send_daily(&state).await.unwrap();

        assert_eq!(delivery.cars_count, 10);
        // profits 200..=1100
        assert_eq!(delivery.total_profit, 6500.0);
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.starts_with("Raport Zilnic"));
        assert!(sent[0].text.contains("1. Model 11 (2018)"));
        assert!(sent[0].reply_to.is_none());
    }

    #[tokio::test]
    async fn test_on_demand_report_carries_contact() {
        let transport = Arc::new(MemoryTransport::new());
        let state = test_state(store_with_cars(3), transport.clone(), &[]).await;
        let contact = ContactMessage {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: "0700".to_string(),
            message: "Interested in the Golf".to_string(),
        };

        ReportService::send_on_demand(&state, &contact).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].subject, "Top 10 Most Profitable Cars - CarBot Report");
        assert_eq!(sent[0].reply_to.as_deref(), Some("ana@example.com"));
        assert!(sent[0].text.contains("Interested in the Golf"));
    }

    #[tokio::test]
    async fn test_repeated_triggers_send_twice() {
        let transport = Arc::new(MemoryTransport::new());
        let state = test_state(store_with_cars(2), transport.clone(), &[]).await;

        let first = ReportService::send_daily(&state).await.unwrap();
        let second = ReportService::send_daily(&state).await.unwrap();

        assert_ne!(first.message_id, second.message_id);
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_relay_failure_is_final() {
        let transport = Arc::new(MemoryTransport::failing("connection refused"));
        let state = test_state(store_with_cars(2), transport.clone(), &[]).await;

        let err = ReportService::send_daily(&state).await.unwrap_err();
        assert!(matches!(err, AppError::Mail(_)));
        assert_eq!(transport.attempts(), 1);
    }
}
