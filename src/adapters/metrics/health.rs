//! Health Check Server - Liveness, Readiness and Status
//!
//! Exposes /live, /ready and /status endpoints via axum 0.7 for Docker
//! health checks and monitoring. Readiness depends on session store and
//! RPC endpoint health; /status serves the latest aggregate report as
//! JSON.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tokio::sync::{broadcast, watch};
use tracing::{info, instrument};

use crate::domain::network::StatusReport;

/// Shared health state polled by readiness probes.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Whether the session store answered its last health check.
    pub store_healthy: Arc<std::sync::atomic::AtomicBool>,
    /// Whether at least one monitored network is reachable.
    pub networks_healthy: Arc<std::sync::atomic::AtomicBool>,
}

impl HealthState {
    /// Create a new health state (all healthy by default).
    pub fn new() -> Self {
        Self {
            store_healthy: Arc::new(std::sync::atomic::AtomicBool::new(true)),
            networks_healthy: Arc::new(std::sync::atomic::AtomicBool::new(true)),
        }
    }

    /// Check if the system is ready to serve traffic.
    pub fn is_ready(&self) -> bool {
        use std::sync::atomic::Ordering;
        self.store_healthy.load(Ordering::Relaxed)
            && self.networks_healthy.load(Ordering::Relaxed)
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Router state shared by the probe and status handlers.
#[derive(Clone)]
struct ServerState {
    health: Arc<HealthState>,
    report: watch::Receiver<StatusReport>,
}

/// Axum-based health check HTTP server.
///
/// Serves liveness (/live), readiness (/ready) and status (/status)
/// endpoints for Docker health checks and orchestrator probes.
pub struct HealthServer {
    /// Health state shared with all components.
    state: Arc<HealthState>,
    /// Latest aggregate report, refreshed by the daemon loop.
    report: watch::Receiver<StatusReport>,
    /// Bind port (default 8080 from config).
    port: u16,
}

impl HealthServer {
    /// Create a new health server.
    pub fn new(
        state: Arc<HealthState>,
        report: watch::Receiver<StatusReport>,
        port: u16,
    ) -> Self {
        Self { state, report, port }
    }

    /// Start the health check server in the background.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(
        self,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let state = ServerState {
            health: self.state,
            report: self.report,
        };
        let app = Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .route("/status", get(Self::status))
            .with_state(state);

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!(address = %addr, "Health server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    /// Liveness probe: always returns 200 if the process is running.
    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    /// Readiness probe: returns 200 only if store + networks are healthy.
    async fn readiness(
        State(state): State<ServerState>,
    ) -> impl IntoResponse {
        if state.health.is_ready() {
            (StatusCode::OK, "READY")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }

    /// Status endpoint: latest aggregate report as JSON.
    async fn status(
        State(state): State<ServerState>,
    ) -> impl IntoResponse {
        let report = state.report.borrow().clone();
        Json(report)
    }
}
