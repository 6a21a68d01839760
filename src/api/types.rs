//! HTTP request and response types

use crate::live::{Page, StatsScope, ViewSummary};
use crate::models::{BatchRun, Car, ContactField};
use crate::stats::AggregateStats;
use serde::{Deserialize, Serialize};

// ============================================================================
// Generic
// ============================================================================

/// `{success, message}` envelope used by health and error responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_fields: Option<Vec<ContactField>>,
}

impl ApiResponse {
    pub fn success_with_message(message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            error: None,
            details: None,
            missing_fields: None,
        }
    }

    pub fn error(error: &str) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.to_string()),
            details: None,
            missing_fields: None,
        }
    }

    /// Attach error detail; callers decide whether detail may be exposed
    pub fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }

    pub fn missing_fields(fields: Vec<ContactField>) -> Self {
        Self {
            missing_fields: Some(fields),
            ..Self::error("Missing required fields")
        }
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Successful contact submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
    pub message_id: String,
}

/// Successful daily report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReportResponse {
    pub success: bool,
    pub message: String,
    pub message_id: String,
    pub cars_count: usize,
    pub total_profit: f64,
}

// ============================================================================
// Views
// ============================================================================

/// Query string of the market page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

/// One market page with its live summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketResponse {
    #[serde(flatten)]
    pub summary: ViewSummary,
    pub page: Page<Car>,
}

/// Dashboard contents
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub loading: bool,
    pub stats: AggregateStats,
    pub stats_scope: StatsScope,
    pub recent_cars: Vec<Car>,
    pub batch_runs: Vec<BatchRun>,
}

/// Payload of the `market` stream event
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketEvent {
    pub version: u64,
    pub loading: bool,
    pub stats: AggregateStats,
    pub total_pages: usize,
}

impl From<ViewSummary> for MarketEvent {
    fn from(summary: ViewSummary) -> Self {
        Self {
            version: summary.version,
            loading: summary.loading,
            stats: summary.stats,
            total_pages: summary.total_pages,
        }
    }
}
