//! CarBot Dashboard - live car profit views and email reports
//!
//! Serves live views over the analysed-cars collection, sends the top
//! profitable cars report on contact submissions and on a daily schedule.

pub mod api;
pub mod config;
pub mod error;
pub mod live;
pub mod mail;
pub mod models;
pub mod report;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod stats;
pub mod store;

use api::ApiServer;
use config::AppConfig;
use scheduler::DailyReportScheduler;
use state::AppState;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging, build state and serve until a shutdown signal
pub async fn run() -> anyhow::Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carbot_dashboard=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CarBot Dashboard...");

    let config = AppConfig::load()?;
    let app_state = Arc::new(AppState::new(config).await?);

    // Start daily report scheduler if enabled (default 22:20 Europe/Bucharest)
    let scheduler = if app_state.config.schedule.daily_enabled {
        Some(DailyReportScheduler::new(app_state.clone()).start())
    } else {
        info!("In-process daily report scheduler disabled");
        None
    };

    let mut server = ApiServer::new(app_state.clone());
    server.start(&app_state.config.server).await?;

    shutdown_signal().await;

    server.stop().await;
    if let Some(scheduler) = scheduler {
        scheduler.abort();
    }
    app_state.shutdown();

    info!("CarBot Dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
