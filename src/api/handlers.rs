//! HTTP endpoint handlers
//!
//! Provides handlers for:
//! - Contact submissions (/api/contact/send)
//! - Scheduled daily report (/api/send-daily-report)
//! - Live market and dashboard views (/api/cars, /api/dashboard, /api/live/stream)

use crate::api::types::*;
use crate::config::{AppConfig, CronAuthPolicy};
use crate::error::{AppError, ErrorClass, ErrorResponse, Result};
use crate::services::{CarService, ContactForm, ContactService, ReportService};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Json, Path, Query, State as AxumState},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures_util::stream::{self, Stream};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{error, info, warn};

const CONFIG_ERROR_MESSAGE: &str = "Server configuration error - email service not properly configured";

/// Error detail, only in development mode
fn details(config: &AppConfig, failure: &ErrorResponse) -> Option<String> {
    config.is_development().then(|| failure.message.clone())
}

// ============================================================================
// Health Check
// ============================================================================

/// Health check endpoint - GET /health or GET /
pub async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::success_with_message("CarBot dashboard API is running"))
}

// ============================================================================
// Contact
// ============================================================================

/// Contact submission - POST /api/contact/send
///
/// Validates the four required fields and sends the on-demand report.
pub async fn contact_send(
    AxumState(state): AxumState<Arc<AppState>>,
    payload: std::result::Result<Json<ContactForm>, JsonRejection>,
) -> Response {
    let form = match payload {
        Ok(Json(form)) => form,
        Err(rejection) => {
            warn!("Rejected contact payload: {}", rejection);
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error("Invalid request body")),
            )
                .into_response();
        }
    };

    match ContactService::submit(&state, &form).await {
        Ok(delivery) => (
            StatusCode::OK,
            Json(ContactResponse {
                success: true,
                message: "Email sent successfully".to_string(),
                message_id: delivery.message_id,
            }),
        )
            .into_response(),
        Err(AppError::MissingFields(fields)) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::missing_fields(fields)),
        )
            .into_response(),
        Err(e) => contact_error(&state.config, e).into_response(),
    }
}

fn contact_error(config: &AppConfig, err: AppError) -> (StatusCode, Json<ApiResponse>) {
    let class = err.class();
    let mail_failure = err.is_mail_failure();
    let failure = ErrorResponse::from(err);
    error!("Contact submission failed [{}]: {}", failure.code, failure.message);

    let body = match class {
        ErrorClass::Configuration => ApiResponse::error(CONFIG_ERROR_MESSAGE),
        _ if mail_failure => ApiResponse::error("Failed to send email. Please try again later.")
            .with_details(details(config, &failure)),
        _ => ApiResponse::error("Failed to process your request. Please try again later.")
            .with_details(details(config, &failure)),
    };

    (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
}

// ============================================================================
// Daily Report
// ============================================================================

/// Scheduled report trigger - GET/POST /api/send-daily-report
///
/// Expects `Authorization: Bearer <CRON_SECRET>`; what happens on mismatch
/// depends on the configured policy.
pub async fn send_daily_report(
    AxumState(state): AxumState<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    info!("Daily report trigger received");

    let result = match authorize_cron(&state.config, &headers) {
        Ok(()) => ReportService::send_daily(&state).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(delivery) => (
            StatusCode::OK,
            Json(DailyReportResponse {
                success: true,
                message: "Daily report sent successfully".to_string(),
                message_id: delivery.message_id,
                cars_count: delivery.cars_count,
                total_profit: delivery.total_profit,
            }),
        )
            .into_response(),
        Err(e) => daily_report_error(&state.config, e).into_response(),
    }
}

fn daily_report_error(config: &AppConfig, err: AppError) -> (StatusCode, Json<ApiResponse>) {
    let class = err.class();
    let failure = ErrorResponse::from(err);

    match class {
        ErrorClass::Unauthorized => {
            warn!("Daily report trigger refused: {}", failure.message);
            (StatusCode::UNAUTHORIZED, Json(ApiResponse::error("Unauthorized")))
        }
        ErrorClass::Configuration => {
            error!("Daily report misconfigured [{}]: {}", failure.code, failure.message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(CONFIG_ERROR_MESSAGE)),
            )
        }
        _ => {
            error!("Daily report failed [{}]: {}", failure.code, failure.message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to send daily report").with_details(details(config, &failure))),
            )
        }
    }
}

/// Check the bearer secret against `CRON_SECRET` by SHA-256 digest
pub fn authorize_cron(config: &AppConfig, headers: &HeaderMap) -> Result<()> {
    let policy = config.schedule.auth_policy;

    let Some(secret) = config.schedule.cron_secret.as_deref() else {
        return match policy {
            CronAuthPolicy::Reject => Err(AppError::Config("CRON_SECRET is not configured".to_string())),
            CronAuthPolicy::Warn => {
                warn!("CRON_SECRET is not configured; daily report endpoint is open");
                Ok(())
            }
        };
    };

    let provided = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or_default();

    if Sha256::digest(provided.as_bytes()) == Sha256::digest(secret.as_bytes()) {
        return Ok(());
    }

    match policy {
        CronAuthPolicy::Reject => Err(AppError::Unauthorized("invalid cron secret".to_string())),
        CronAuthPolicy::Warn => {
            warn!("Unauthorized daily report trigger; proceeding (CRON_AUTH_POLICY=warn)");
            Ok(())
        }
    }
}

// ============================================================================
// Cars
// ============================================================================

/// Market page - GET /api/cars?page=N
pub async fn list_cars(
    AxumState(state): AxumState<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let page = state.market.page(query.page.unwrap_or(1));
    Json(MarketResponse {
        summary: state.market.summary(),
        page,
    })
}

/// Car detail - GET /api/cars/:car_id
pub async fn get_car(
    AxumState(state): AxumState<Arc<AppState>>,
    Path(car_id): Path<String>,
) -> Response {
    match CarService::get_car(state.store.as_ref(), &car_id).await {
        Ok(Some(car)) => (StatusCode::OK, Json(car)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(json!({ "error": "Car not found" }))).into_response(),
        Err(e) => {
            let failure = ErrorResponse::from(e);
            error!("Failed to load car {} [{}]: {}", car_id, failure.code, failure.message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to load car").with_details(details(&state.config, &failure))),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Dashboard
// ============================================================================

/// Dashboard - GET /api/dashboard
pub async fn dashboard(AxumState(state): AxumState<Arc<AppState>>) -> impl IntoResponse {
    let summary = state.dashboard.summary();
    Json(DashboardResponse {
        loading: summary.loading,
        stats: summary.stats,
        stats_scope: summary.stats_scope,
        recent_cars: state.dashboard.cars(),
        batch_runs: state.dashboard.batch_runs(),
    })
}

/// Live market updates - GET /api/live/stream
///
/// Emits a `market` event on connect and after every applied snapshot.
pub async fn live_stream(
    AxumState(state): AxumState<Arc<AppState>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let mut version = state.market.watch_version();
    version.borrow_and_update();

    let events = stream::unfold((state, version, true), |(state, mut version, first)| async move {
        if !first && version.changed().await.is_err() {
            return None;
        }

        let payload = MarketEvent::from(state.market.summary());
        let event = Event::default()
            .event("market")
            .json_data(&payload)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));

        Some((Ok(event), (state, version, false)))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
