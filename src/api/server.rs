//! HTTP server for the dashboard API

use crate::api::handlers;
use crate::config::ServerConfig;
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// API server manager
pub struct ApiServer {
    state: Arc<AppState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ApiServer {
    /// Create a new server
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            shutdown_tx: None,
            task: None,
        }
    }

    /// Build the router with all routes
    pub fn router(state: Arc<AppState>) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            // ================================================================
            // Health check
            // ================================================================
            .route("/health", get(handlers::health_check))
            .route("/", get(handlers::health_check))

            // ================================================================
            // Reports
            // ================================================================
            .route("/api/contact/send", post(handlers::contact_send))
            .route(
                "/api/send-daily-report",
                get(handlers::send_daily_report).post(handlers::send_daily_report),
            )

            // ================================================================
            // Live views
            // ================================================================
            .route("/api/cars", get(handlers::list_cars))
            .route("/api/cars/:car_id", get(handlers::get_car))
            .route("/api/dashboard", get(handlers::dashboard))
            .route("/api/live/stream", get(handlers::live_stream))

            // ================================================================
            // Add state and middleware
            // ================================================================
            .with_state(state)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and start serving in the background
    pub async fn start(&mut self, config: &ServerConfig) -> Result<SocketAddr> {
        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid address: {}", e)))?;

        let app = Self::router(self.state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        info!("Starting CarBot dashboard API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        self.task = Some(tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            });

            if let Err(e) = server.await {
                error!("API server error: {}", e);
            }
        }));

        info!("API server listening on http://{}", local_addr);
        info!("  GET  /health");
        info!("  POST /api/contact/send");
        info!("  GET  /api/send-daily-report");
        info!("  GET  /api/cars?page=N");
        info!("  GET  /api/cars/{{car_id}}");
        info!("  GET  /api/dashboard");
        info!("  GET  /api/live/stream");

        Ok(local_addr)
    }

    /// Stop the server and wait for in-flight requests to finish
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            info!("API server stop signal sent");
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Check if server is running
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::MemoryTransport;
    use crate::state::test_support::test_state;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_start_serves_health_and_stops() {
        let state = test_state(Arc::new(MemoryStore::new()), Arc::new(MemoryTransport::new()), &[]).await;
        let mut server = ApiServer::new(Arc::new(state));

        let addr = server
            .start(&ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            })
            .await
            .unwrap();
        assert!(server.is_running());

        let body: serde_json::Value = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["success"], true);

        server.stop().await;
        assert!(!server.is_running());
    }
}
